use super::ErrorEntry;
use jsonschema::error::ValidationErrorKind;
use serde_json::{json, Value};

/// Splits a JSON pointer into unescaped segments
fn pointer_segments(pointer: &str) -> impl Iterator<Item = String> + '_ {
    pointer
        .split('/')
        .skip(1)
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
}

/// `/query/test` becomes `.query.test`, `/body/items/0` becomes `.body.items[0]`
pub(crate) fn data_path(instance_pointer: &str) -> String {
    pointer_segments(instance_pointer)
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                format!("[{}]", segment)
            } else {
                format!(".{}", segment)
            }
        })
        .collect()
}

fn parent_pointer(pointer: &str) -> &str {
    pointer.rfind('/').map_or("", |idx| &pointer[..idx])
}

fn limit_message(keyword: &str, limit: &Value) -> Option<(String, Value)> {
    let (message, params) = match keyword {
        "maxLength" => (format!("should NOT be longer than {} characters", limit), json!({"limit": limit})),
        "minLength" => (format!("should NOT be shorter than {} characters", limit), json!({"limit": limit})),
        "maxItems" => (format!("should NOT have more than {} items", limit), json!({"limit": limit})),
        "minItems" => (format!("should NOT have less than {} items", limit), json!({"limit": limit})),
        "maxProperties" => (format!("should NOT have more than {} properties", limit), json!({"limit": limit})),
        "minProperties" => (format!("should NOT have less than {} properties", limit), json!({"limit": limit})),
        "multipleOf" => (format!("should be multiple of {}", limit), json!({"multipleOf": limit})),
        _ => return None,
    };
    Some((message, params))
}

/// Builds the `(message, params)` pair for a failed keyword
fn describe(keyword: &str, keyword_value: &Value, parent: &Value, fallback: String) -> (String, Value) {
    let comparison = |op: &str, exclusive: bool| {
        (
            format!("should be {} {}", op, keyword_value),
            json!({"comparison": op, "limit": keyword_value, "exclusive": exclusive}),
        )
    };

    match keyword {
        "type" => {
            let expected = match keyword_value {
                Value::Array(types) => types
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(","),
                other => other.as_str().unwrap_or_default().to_string(),
            };
            (format!("should be {}", expected), json!({"type": expected}))
        }
        "enum" => (
            "should be equal to one of the allowed values".to_string(),
            json!({"allowedValues": keyword_value}),
        ),
        // draft 4 expresses exclusivity as a boolean next to the bound
        "maximum" if parent.get("exclusiveMaximum") == Some(&Value::Bool(true)) => comparison("<", true),
        "maximum" => comparison("<=", false),
        "minimum" if parent.get("exclusiveMinimum") == Some(&Value::Bool(true)) => comparison(">", true),
        "minimum" => comparison(">=", false),
        "exclusiveMaximum" if keyword_value.is_number() => comparison("<", true),
        "exclusiveMinimum" if keyword_value.is_number() => comparison(">", true),
        "pattern" => (
            format!("should match pattern \"{}\"", keyword_value.as_str().unwrap_or_default()),
            json!({"pattern": keyword_value}),
        ),
        "format" => (
            format!("should match format \"{}\"", keyword_value.as_str().unwrap_or_default()),
            json!({"format": keyword_value}),
        ),
        "uniqueItems" => ("should NOT have duplicate items".to_string(), json!({})),
        _ => limit_message(keyword, keyword_value).unwrap_or((fallback, json!({}))),
    }
}

/// Converts one engine failure into error entries against `root_schema`.
///
/// Most failures map to a single entry; an `additionalProperties` failure
/// yields one entry per unexpected property.
pub(crate) fn to_entries(
    error: &jsonschema::ValidationError<'_>,
    root_schema: &Value,
    verbose: bool,
) -> Vec<ErrorEntry> {
    let schema_pointer = error.schema_path.to_string();
    let instance_pointer = error.instance_path.to_string();

    let keyword = pointer_segments(&schema_pointer).last().unwrap_or_default();
    let keyword_value = root_schema.pointer(&schema_pointer).cloned().unwrap_or(Value::Null);
    let parent = root_schema
        .pointer(parent_pointer(&schema_pointer))
        .cloned()
        .unwrap_or(Value::Null);

    let entry = |message: String, params: Value| ErrorEntry {
        data_path: data_path(&instance_pointer),
        keyword: keyword.clone(),
        message,
        params,
        schema: keyword_value.clone(),
        schema_path: format!("#{}", schema_pointer),
        parent_schema: verbose.then(|| parent.clone()),
        data: verbose.then(|| error.instance.clone().into_owned()),
    };

    match &error.kind {
        ValidationErrorKind::Required { property } => {
            let missing = property.as_str().map_or_else(|| property.to_string(), str::to_string);
            vec![entry(
                format!("should have required property '{}'", missing),
                json!({"missingProperty": missing}),
            )]
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
            .iter()
            .map(|name| {
                entry(
                    "should NOT have additional properties".to_string(),
                    json!({"additionalProperty": name}),
                )
            })
            .collect(),
        _ => {
            let (message, params) = describe(&keyword, &keyword_value, &parent, error.to_string());
            vec![entry(message, params)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_pointers_to_data_paths() {
        assert_eq!(data_path(""), "");
        assert_eq!(data_path("/query"), ".query");
        assert_eq!(data_path("/query/test"), ".query.test");
        assert_eq!(data_path("/body/items/0/id"), ".body.items[0].id");
        assert_eq!(data_path("/body/a~1b"), ".body.a/b");
    }

    #[test]
    fn finds_parent_pointer() {
        assert_eq!(parent_pointer("/properties/query/required"), "/properties/query");
        assert_eq!(parent_pointer("/type"), "");
    }

    #[test]
    fn describes_draft4_exclusive_bounds() {
        let parent = json!({"maximum": 10, "exclusiveMaximum": true});
        let (message, params) = describe("maximum", &json!(10), &parent, String::new());
        assert_eq!(message, "should be < 10");
        assert_eq!(params, json!({"comparison": "<", "limit": 10, "exclusive": true}));

        let (message, _) = describe("minimum", &json!(1), &json!({"minimum": 1}), String::new());
        assert_eq!(message, "should be >= 1");
    }

    #[test]
    fn describes_length_limits() {
        let (message, params) = describe("maxLength", &json!(5), &Value::Null, String::new());
        assert_eq!(message, "should NOT be longer than 5 characters");
        assert_eq!(params, json!({"limit": 5}));
    }

    #[test]
    fn falls_back_to_engine_message() {
        let (message, params) = describe("not", &json!({}), &Value::Null, "engine says no".to_string());
        assert_eq!(message, "engine says no");
        assert_eq!(params, json!({}));
    }
}
