//! The schema-validation engine the middleware compiles assembled schemas with.

pub mod json_schema;
mod normalize;
mod report;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub use json_schema::JsonSchemaEngine;

/// Compiles schemas into reusable validators
pub trait SchemaEngine: Send + Sync {
    fn compile(&self, schema: Value) -> Result<Arc<dyn CompiledSchema>>;
}

/// A compiled schema.
///
/// `validate` may rewrite `data` in place (defaults, coercions, removed
/// properties) before deciding; the failures come back in engine order.
pub trait CompiledSchema: Send + Sync {
    fn validate(&self, data: &mut Value) -> std::result::Result<(), Vec<ErrorEntry>>;
}

/// One machine-readable validation failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    /// Dotted path of the failing value, e.g. `.query.test`
    pub data_path: String,
    pub keyword: String,
    pub message: String,
    pub params: Value,
    /// Value of the failing keyword in the schema
    pub schema: Value,
    /// `#`-prefixed JSON pointer of the failing keyword
    pub schema_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaDraft {
    #[default]
    Draft4,
    Draft6,
    Draft7,
}

/// How undeclared object properties are handled before validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoveAdditional {
    #[default]
    Keep,
    /// Strip them where the schema sets `additionalProperties: false`
    Declared,
    /// Strip every property not listed under `properties`
    All,
}

impl Serialize for RemoveAdditional {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Keep => serializer.serialize_bool(false),
            Self::Declared => serializer.serialize_bool(true),
            Self::All => serializer.serialize_str("all"),
        }
    }
}

impl<'de> Deserialize<'de> for RemoveAdditional {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Mode(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(false) => Ok(Self::Keep),
            Raw::Flag(true) => Ok(Self::Declared),
            Raw::Mode(mode) if mode == "all" => Ok(Self::All),
            Raw::Mode(mode) => Err(serde::de::Error::custom(format!(
                "unsupported removeAdditional mode '{}'",
                mode
            ))),
        }
    }
}

/// Engine behaviour switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    /// Report every failure instead of stopping at the first
    pub all_errors: bool,
    /// Write declared defaults into missing properties
    pub use_defaults: bool,
    /// Convert compatible scalar types, e.g. `"1"` into `1`
    pub coerce_types: bool,
    pub remove_additional: RemoveAdditional,
    /// Attach `parentSchema` and `data` to every error entry
    pub verbose: bool,
    pub draft: SchemaDraft,
    pub validate_formats: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            all_errors: true,
            use_defaults: true,
            coerce_types: true,
            remove_additional: RemoveAdditional::Keep,
            verbose: false,
            draft: SchemaDraft::Draft4,
            validate_formats: true,
        }
    }
}
