use crate::error::{Result, ValidatorError};
use crate::spec::document::ApiDocument;
use openapiv3::OpenAPI;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Loads an API document from a YAML or JSON file.
///
/// Swagger 2.0 documents map directly onto [`ApiDocument`]; documents with an
/// `openapi` version field are parsed as OpenAPI 3 and converted.
/// The document must already be fully dereferenced.
pub fn load_api_document(path: &Path) -> Result<ApiDocument> {
    let file = File::open(path).map_err(|e| {
        ValidatorError::DocumentLoadError(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let raw: serde_yaml::Value = serde_yaml::from_reader(BufReader::new(file)).map_err(|e| {
        ValidatorError::DocumentLoadError(format!("Failed to parse {}: {}", path.display(), e))
    })?;

    parse_api_document(raw)
}

fn parse_api_document(raw: serde_yaml::Value) -> Result<ApiDocument> {
    if raw.get("openapi").is_some() {
        let spec: OpenAPI = serde_yaml::from_value(raw).map_err(|e| {
            ValidatorError::DocumentLoadError(format!("Failed to parse OpenAPI document: {}", e))
        })?;
        return ApiDocument::from_openapi(&spec);
    }

    serde_yaml::from_value(raw).map_err(|e| {
        ValidatorError::DocumentLoadError(format!("Failed to parse Swagger document: {}", e))
    })
}
