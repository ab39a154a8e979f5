use crate::error::{Result, ValidatorError};
use crate::spec::document::{ApiDocument, Declaration, Operation, ParameterLocation, PathItem};
use indexmap::IndexMap;
use openapiv3::{Components, OpenAPI, ReferenceOr};
use serde_json::{Map, Value};

/// Resolves a component-level `$ref` against the document's `components`.
///
/// Only references of the form `#/components/<section>/<name>` are followed;
/// anything else is reported as unresolved.
fn resolve_component<'a, T, F>(
    ref_or: &'a ReferenceOr<T>,
    spec: &'a OpenAPI,
    prefix: &str,
    selector: F,
) -> Result<&'a T>
where
    F: Fn(&'a Components) -> &'a IndexMap<String, ReferenceOr<T>>,
{
    match ref_or {
        ReferenceOr::Item(item) => Ok(item),
        ReferenceOr::Reference { reference } => reference
            .strip_prefix(prefix)
            .and_then(|name| spec.components.as_ref().map(|c| (selector(c), name)))
            .and_then(|(map, name)| map.get(name))
            .and_then(|r| r.as_item())
            .ok_or_else(|| ValidatorError::UnresolvedReference(reference.clone())),
    }
}

/// Serializes a schema into a JSON value, following a top-level
/// `#/components/schemas/*` reference once. Nested references stay in place.
fn schema_to_json(
    schema_ref: &ReferenceOr<openapiv3::Schema>,
    spec: &OpenAPI,
    context: &str,
) -> Result<Value> {
    let value = match schema_ref {
        ReferenceOr::Item(schema) => serde_json::to_value(schema),
        ReferenceOr::Reference { .. } => {
            match resolve_component(schema_ref, spec, "#/components/schemas/", |c| &c.schemas) {
                Ok(schema) => serde_json::to_value(schema),
                Err(_) => serde_json::to_value(schema_ref),
            }
        }
    };

    value.map_err(|e| {
        ValidatorError::DocumentLoadError(format!(
            "Failed to convert {} schema to JSON: {}",
            context, e
        ))
    })
}

fn convert_parameter(
    parameter_ref: &ReferenceOr<openapiv3::Parameter>,
    spec: &OpenAPI,
) -> Result<Declaration> {
    let parameter = resolve_component(parameter_ref, spec, "#/components/parameters/", |c| {
        &c.parameters
    })?;

    let (location, parameter_data) = match parameter {
        openapiv3::Parameter::Query { parameter_data, .. } => {
            (ParameterLocation::Query, parameter_data)
        }
        openapiv3::Parameter::Path { parameter_data, .. } => {
            (ParameterLocation::Path, parameter_data)
        }
        openapiv3::Parameter::Header { parameter_data, .. } => {
            (ParameterLocation::Header, parameter_data)
        }
        openapiv3::Parameter::Cookie { parameter_data, .. } => {
            (ParameterLocation::Other, parameter_data)
        }
    };

    let constraints = match &parameter_data.format {
        openapiv3::ParameterSchemaOrContent::Schema(schema_ref) => {
            match schema_to_json(schema_ref, spec, &format!("parameter '{}'", parameter_data.name))? {
                Value::Object(map) => map,
                _ => Map::new(),
            }
        }
        openapiv3::ParameterSchemaOrContent::Content(_) => Map::new(),
    };

    Ok(Declaration {
        name: parameter_data.name.clone(),
        location,
        required: parameter_data.required,
        schema: None,
        constraints,
    })
}

fn convert_parameters(
    parameters: &[ReferenceOr<openapiv3::Parameter>],
    spec: &OpenAPI,
) -> Result<Vec<Declaration>> {
    parameters
        .iter()
        .map(|parameter_ref| convert_parameter(parameter_ref, spec))
        .collect()
}

/// Turns a JSON request body into a `body` declaration. Bodies without
/// `application/json` content are not validated.
fn convert_request_body(
    request_body_ref: &ReferenceOr<openapiv3::RequestBody>,
    spec: &OpenAPI,
) -> Result<Option<Declaration>> {
    let request_body = resolve_component(request_body_ref, spec, "#/components/requestBodies/", |c| {
        &c.request_bodies
    })?;

    let Some(schema_ref) = request_body
        .content
        .get("application/json")
        .and_then(|media_type| media_type.schema.as_ref())
    else {
        return Ok(None);
    };

    let schema = schema_to_json(schema_ref, spec, "request body")?;
    Ok(Some(
        Declaration::new("body", ParameterLocation::Body)
            .required(request_body.required)
            .with_schema(schema),
    ))
}

fn convert_operation(operation: &openapiv3::Operation, spec: &OpenAPI) -> Result<Operation> {
    let mut parameters = convert_parameters(&operation.parameters, spec)?;
    if let Some(request_body) = &operation.request_body {
        parameters.extend(convert_request_body(request_body, spec)?);
    }

    Ok(Operation {
        operation_id: operation.operation_id.clone(),
        parameters: (!parameters.is_empty()).then_some(parameters),
    })
}

impl ApiDocument {
    /// Builds the declaration model from a parsed OpenAPI 3 document
    pub fn from_openapi(spec: &OpenAPI) -> Result<Self> {
        let mut paths = IndexMap::new();

        for (path, path_item_ref) in &spec.paths.paths {
            let path_item = match path_item_ref {
                ReferenceOr::Item(item) => item,
                ReferenceOr::Reference { reference } => {
                    tracing::warn!(path = %path, reference = %reference, "skipping $ref path item");
                    continue;
                }
            };

            let mut item = PathItem::default();
            if !path_item.parameters.is_empty() {
                item.parameters = Some(convert_parameters(&path_item.parameters, spec)?);
            }

            for (method, operation) in path_item.iter() {
                if let Some(slot) = item.operation_mut(method) {
                    *slot = Some(convert_operation(operation, spec)?);
                }
            }

            paths.insert(path.clone(), item);
        }

        let mut other = IndexMap::new();
        other.insert("openapi".to_string(), Value::String(spec.openapi.clone()));
        other.insert("info".to_string(), serde_json::to_value(&spec.info)?);

        Ok(Self { paths, other })
    }
}
