//! Assembles one validation schema per (path, method) pair.
//!
//! The assembled schema always has the same shape:
//!
//! ```json
//! {
//!   "type": "object",
//!   "properties": {
//!     "body":  { "type": "object", "properties": {} },
//!     "query": { "type": "object", "properties": {}, "required": [...] },
//!     "path":  { "type": "object", "properties": {}, "required": [...] }
//!   }
//! }
//! ```
//!
//! `query` and `path` get one property per declaration; a `body` declaration
//! replaces the `body` section with its own schema.

use crate::error::{Result, ValidatorError};
use crate::spec::{Declaration, ParameterLocation};
use serde_json::{json, Map, Value};

/// Declaration fields copied into a query/path property schema
const PARAMETER_SCHEMA_FIELDS: &[&str] = &[
    "type",
    "default",
    "enum",
    "multipleOf",
    "format",
    "maximum",
    "exclusiveMaximum",
    "minimum",
    "exclusiveMinimum",
    "maxLength",
    "minLength",
    "pattern",
    "maxItems",
    "minItems",
    "uniqueItems",
    "maxProperties",
    "minProperties",
    "items",
    "allOf",
    "properties",
    "additionalProperties",
];

pub const BODY: &str = "body";
pub const QUERY: &str = "query";
pub const PATH: &str = "path";

fn empty_object_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

fn base_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "body": empty_object_schema(),
            "query": empty_object_schema(),
            "path": empty_object_schema(),
        }
    })
}

/// Builds the validation schema for one operation.
///
/// Path-level declarations are folded first, operation-level ones second, so
/// an operation parameter with the same name and location wins.
pub fn assemble(
    path_declarations: Option<&[Declaration]>,
    operation_declarations: Option<&[Declaration]>,
) -> Result<Value> {
    let mut schema = base_schema();

    for declaration in path_declarations
        .unwrap_or_default()
        .iter()
        .chain(operation_declarations.unwrap_or_default())
    {
        fold_declaration(&mut schema, declaration)?;
    }

    Ok(schema)
}

fn fold_declaration(schema: &mut Value, declaration: &Declaration) -> Result<()> {
    match declaration.location {
        ParameterLocation::Body => {
            let body = declaration.schema.clone().unwrap_or_else(|| json!({}));
            if let Some(reference) = find_unresolved_ref(&body) {
                return Err(ValidatorError::UnresolvedReference(format!(
                    "{} (body parameter '{}')",
                    reference, declaration.name
                )));
            }
            schema["properties"][BODY] = body;
        }
        ParameterLocation::Query => add_parameter(&mut schema["properties"][QUERY], declaration),
        ParameterLocation::Path => add_parameter(&mut schema["properties"][PATH], declaration),
        // header and formData parameters are not validated
        ParameterLocation::Header | ParameterLocation::FormData | ParameterLocation::Other => {}
    }
    Ok(())
}

fn add_parameter(section: &mut Value, declaration: &Declaration) {
    let property: Map<String, Value> = PARAMETER_SCHEMA_FIELDS
        .iter()
        .filter_map(|field| {
            declaration
                .constraints
                .get(*field)
                .map(|value| (field.to_string(), value.clone()))
        })
        .collect();

    section["properties"][&declaration.name] = Value::Object(property);

    if declaration.required {
        let name = Value::String(declaration.name.clone());
        match section.get_mut("required").and_then(Value::as_array_mut) {
            Some(required) => {
                if !required.contains(&name) {
                    required.push(name);
                }
            }
            None => section["required"] = json!([name]),
        }
    }
}

/// Returns the first `$ref` found anywhere inside `schema`
pub fn find_unresolved_ref(schema: &Value) -> Option<&str> {
    match schema {
        Value::Object(map) => map
            .get("$ref")
            .and_then(Value::as_str)
            .or_else(|| map.values().find_map(find_unresolved_ref)),
        Value::Array(items) => items.iter().find_map(find_unresolved_ref),
        _ => None,
    }
}
