use super::{EngineOptions, RemoveAdditional};
use serde_json::{Map, Number, Value};

/// Applies coercions, defaults and property removal to `data` as described by
/// `schema`, ahead of validation.
///
/// Walks `properties`, object-form `items` and `allOf`. Values that cannot be
/// coerced are left untouched for the validator to report.
pub(crate) fn normalize(schema: &Value, data: &mut Value, options: &EngineOptions) {
    let Some(schema) = schema.as_object() else {
        return;
    };

    if options.coerce_types {
        if let Some(types) = schema.get("type") {
            coerce(types, data);
        }
    }

    if let Some(sub_schemas) = schema.get("allOf").and_then(Value::as_array) {
        for sub_schema in sub_schemas {
            normalize(sub_schema, data, options);
        }
    }

    match data {
        Value::Object(object) => normalize_object(schema, object, options),
        Value::Array(items) => {
            if let Some(item_schema) = schema.get("items").filter(|s| s.is_object()) {
                for item in items {
                    normalize(item_schema, item, options);
                }
            }
        }
        _ => {}
    }
}

fn normalize_object(schema: &Map<String, Value>, object: &mut Map<String, Value>, options: &EngineOptions) {
    let properties = schema.get("properties").and_then(Value::as_object);

    if let Some(properties) = properties {
        for (name, property_schema) in properties {
            if options.use_defaults && !object.contains_key(name) {
                if let Some(default) = property_schema.get("default") {
                    object.insert(name.clone(), default.clone());
                }
            }
            if let Some(value) = object.get_mut(name) {
                normalize(property_schema, value, options);
            }
        }
    }

    let strip = match options.remove_additional {
        RemoveAdditional::Keep => false,
        RemoveAdditional::Declared => schema.get("additionalProperties") == Some(&Value::Bool(false)),
        RemoveAdditional::All => properties.is_some(),
    };
    if strip {
        object.retain(|name, _| properties.is_some_and(|p| p.contains_key(name)));
    }
}

fn coerce(types: &Value, data: &mut Value) {
    let targets: Vec<&str> = match types {
        Value::String(t) => vec![t.as_str()],
        Value::Array(ts) => ts.iter().filter_map(Value::as_str).collect(),
        _ => return,
    };

    if targets.iter().any(|t| matches_type(t, data)) {
        return;
    }

    if let Some(coerced) = targets.iter().find_map(|t| coerce_to(t, data)) {
        *data = coerced;
    }
}

fn matches_type(target: &str, data: &Value) -> bool {
    match target {
        "string" => data.is_string(),
        "number" => data.is_number(),
        "integer" => is_integer(data),
        "boolean" => data.is_boolean(),
        "null" => data.is_null(),
        "object" => data.is_object(),
        "array" => data.is_array(),
        _ => true,
    }
}

fn is_integer(data: &Value) -> bool {
    match data {
        Value::Number(n) => n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0),
        _ => false,
    }
}

fn coerce_to(target: &str, data: &Value) -> Option<Value> {
    match (target, data) {
        ("string", Value::Number(n)) => Some(Value::String(n.to_string())),
        ("string", Value::Bool(b)) => Some(Value::String(b.to_string())),
        ("string", Value::Null) => Some(Value::String(String::new())),

        ("number", Value::String(s)) => parse_number(s),
        ("integer", Value::String(s)) => parse_number(s).filter(is_integer),
        ("number" | "integer", Value::Bool(b)) => Some(Value::from(u8::from(*b))),
        ("number" | "integer", Value::Null) => Some(Value::from(0)),

        ("boolean", Value::String(s)) => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        ("boolean", Value::Number(n)) => match n.as_f64() {
            Some(f) if f == 1.0 => Some(Value::Bool(true)),
            Some(f) if f == 0.0 => Some(Value::Bool(false)),
            _ => None,
        },
        ("boolean", Value::Null) => Some(Value::Bool(false)),

        ("null", Value::String(s)) if s.is_empty() => Some(Value::Null),
        ("null", Value::Number(n)) if n.as_f64() == Some(0.0) => Some(Value::Null),
        ("null", Value::Bool(false)) => Some(Value::Null),

        _ => None,
    }
}

/// Parses a numeric string, keeping whole numbers as integers
fn parse_number(s: &str) -> Option<Value> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }

    let f = s.parse::<f64>().ok().filter(|f| f.is_finite())?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(Value::from(f as i64))
    } else {
        Number::from_f64(f).map(Value::Number)
    }
}
