//! Turns validation failures into one domain error and the domain error into
//! a response. Both stages are replaceable through [`crate::Config`].

use crate::engine::ErrorEntry;
use crate::error::ValidatorError;
use crate::middleware::Bundle;
use axum::http::{request::Parts, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Transformer stage: `(bundle, errors)` into a domain error. `errors` is
/// `None` when the route has no declarations at all.
pub type ErrorTransformer =
    Arc<dyn Fn(&Bundle, Option<Vec<ErrorEntry>>) -> DomainError + Send + Sync>;

/// Responder stage: domain error into the response that ends the request
pub type ErrorResponder = Arc<dyn Fn(DomainError, &Parts) -> Response + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusCategory {
    #[default]
    BadRequest,
    PayloadTooLarge,
    InternalServerError,
}

impl StatusCategory {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The single error value handed to the responder
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct DomainError {
    pub code: String,
    #[serde(skip)]
    pub status: StatusCategory,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorEntry>>,
}

impl DomainError {
    pub fn new(code: impl Into<String>, status: StatusCategory, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            status,
            message: message.into(),
            errors: None,
        }
    }

    pub fn validation(errors: Option<Vec<ErrorEntry>>) -> Self {
        Self {
            errors,
            ..Self::new("ValidationError", StatusCategory::BadRequest, "Validation error")
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status.status_code()
    }
}

impl From<ValidatorError> for DomainError {
    fn from(err: ValidatorError) -> Self {
        let code = if err.is_configuration_error() {
            "ConfigurationError"
        } else {
            "InternalError"
        };
        Self::new(code, StatusCategory::InternalServerError, err.to_string())
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

fn strip_parent_schema(errors: Vec<ErrorEntry>) -> Vec<ErrorEntry> {
    errors
        .into_iter()
        .map(|entry| ErrorEntry {
            parent_schema: None,
            ..entry
        })
        .collect()
}

/// Builds a `ValidationError` domain error from the engine's failures
pub fn default_error_transformer(_bundle: &Bundle, errors: Option<Vec<ErrorEntry>>) -> DomainError {
    DomainError::validation(errors.map(strip_parent_schema))
}

/// Aborts the request with the domain error as JSON
pub fn default_error_responder(err: DomainError, _parts: &Parts) -> Response {
    err.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn entry() -> ErrorEntry {
        ErrorEntry {
            data_path: ".query.test".to_string(),
            keyword: "type".to_string(),
            message: "should be integer".to_string(),
            params: json!({"type": "integer"}),
            schema: json!("integer"),
            schema_path: "#/properties/query/properties/test/type".to_string(),
            parent_schema: Some(json!({"type": "integer"})),
            data: Some(json!("abc")),
        }
    }

    #[test]
    fn transformer_strips_parent_schema() {
        let err = default_error_transformer(&Bundle::default(), Some(vec![entry(), entry()]));

        assert_eq!(err.code, "ValidationError");
        assert_eq!(err.status, StatusCategory::BadRequest);
        assert_eq!(err.message, "Validation error");

        let errors = err.errors.unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.parent_schema.is_none()));
        assert_eq!(errors[0].data, Some(json!("abc")));
    }

    #[test]
    fn missing_declarations_omit_errors() {
        let err = default_error_transformer(&Bundle::default(), None);
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"code": "ValidationError", "message": "Validation error"})
        );
    }

    #[test]
    fn serializes_error_entries_in_camel_case() {
        let err = default_error_transformer(&Bundle::default(), Some(vec![entry()]));
        assert_eq!(
            serde_json::to_value(&err).unwrap()["errors"][0],
            json!({
                "dataPath": ".query.test",
                "keyword": "type",
                "message": "should be integer",
                "params": {"type": "integer"},
                "schema": "integer",
                "schemaPath": "#/properties/query/properties/test/type",
                "data": "abc"
            })
        );
    }

    #[test]
    fn configuration_errors_become_server_errors() {
        let err = DomainError::from(ValidatorError::UnresolvedReference("#/definitions/X".into()));
        assert_eq!(err.code, "ConfigurationError");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.contains("#/definitions/X"));

        let err = DomainError::from(ValidatorError::DocumentLoadError("gone".into()));
        assert_eq!(err.code, "InternalError");
    }

    #[test]
    fn default_responder_uses_status_category() {
        let (parts, _) = axum::http::Request::new(()).into_parts();

        let response = default_error_responder(DomainError::validation(None), &parts);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let too_large = DomainError::new("PayloadTooLarge", StatusCategory::PayloadTooLarge, "too big");
        assert_eq!(
            default_error_responder(too_large, &parts).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
