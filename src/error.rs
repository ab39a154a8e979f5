use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("Body schema contains an unresolved reference: {0}")]
    UnresolvedReference(String),

    #[error("Failed to compile JSON schema: {0}")]
    SchemaCompilationError(String),

    #[error("Path variable is not valid UTF-8 once decoded: {0}")]
    InvalidPathEncoding(String),

    #[error("Failed to load API document: {0}")]
    DocumentLoadError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ValidatorError {
    /// Whether the error points at a defect in the API document rather than
    /// at the request or the runtime.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedReference(_) | Self::SchemaCompilationError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ValidatorError>;
