use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a parameter lives in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Body,
    Query,
    Path,
    Header,
    FormData,
    #[serde(other)]
    Other,
}

/// A single parameter declaration from the API document.
///
/// Everything besides `name`, `in`, `required` and `schema` is kept in
/// `constraints` as written (type, default, enum, bounds, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(flatten)]
    pub constraints: Map<String, Value>,
}

impl Declaration {
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self {
            name: name.into(),
            location,
            required: false,
            schema: None,
            constraints: Map::new(),
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_constraint(mut self, key: impl Into<String>, value: Value) -> Self {
        self.constraints.insert(key.into(), value);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Declaration>>,
}

/// One entry of `paths`: shared declarations plus one operation per method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Declaration>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
}

impl PathItem {
    /// Looks up the operation for a method name, ignoring case
    pub fn operation(&self, method: &str) -> Option<&Operation> {
        match method.to_ascii_lowercase().as_str() {
            "get" => self.get.as_ref(),
            "put" => self.put.as_ref(),
            "post" => self.post.as_ref(),
            "delete" => self.delete.as_ref(),
            "options" => self.options.as_ref(),
            "head" => self.head.as_ref(),
            "patch" => self.patch.as_ref(),
            _ => None,
        }
    }

    pub fn operation_mut(&mut self, method: &str) -> Option<&mut Option<Operation>> {
        match method.to_ascii_lowercase().as_str() {
            "get" => Some(&mut self.get),
            "put" => Some(&mut self.put),
            "post" => Some(&mut self.post),
            "delete" => Some(&mut self.delete),
            "options" => Some(&mut self.options),
            "head" => Some(&mut self.head),
            "patch" => Some(&mut self.patch),
            _ => None,
        }
    }
}

/// A fully resolved API description.
///
/// Only `paths` is interpreted; every other top-level field is carried in
/// `other` so handlers reading the published document see it unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiDocument {
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    #[serde(flatten)]
    pub other: IndexMap<String, Value>,
}

impl ApiDocument {
    pub fn from_json_value(value: Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_yaml_str(source: &str) -> crate::Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn path_item(&self, path_key: &str) -> Option<&PathItem> {
        self.paths.get(path_key)
    }

    /// Declarations shared by every operation of `path_key`
    pub fn path_declarations(&self, path_key: &str) -> Option<&[Declaration]> {
        self.path_item(path_key)?.parameters.as_deref()
    }

    /// Declarations of the `method` operation under `path_key`
    pub fn operation_declarations(&self, path_key: &str, method: &str) -> Option<&[Declaration]> {
        self.path_item(path_key)?
            .operation(method)?
            .parameters
            .as_deref()
    }
}
