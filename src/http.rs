//! axum adapter: buffers the request, runs the validator and either forwards
//! the request with [`crate::SwaggerParams`] attached or answers through the
//! configured responder.
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/users/{id}", get(handler))
//!     .layer(axum::middleware::from_fn_with_state(validator, validate_request));
//! ```

use crate::middleware::{RequestValidator, RouteRequest};
use crate::pipeline::{DomainError, StatusCategory};
use axum::body::{to_bytes, Body};
use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::{Map, Value};
use std::sync::Arc;

const INVALID_CONTENT: &str = "InvalidContent";

/// Middleware function for [`axum::middleware::from_fn_with_state`]
pub async fn validate_request(
    State(validator): State<Arc<RequestValidator>>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, validator.config().body_limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(uri = %parts.uri, error = %e, "request body rejected");
            let err = DomainError::new(
                "PayloadTooLarge",
                StatusCategory::PayloadTooLarge,
                "Request body too large",
            );
            return validator.respond(err, &parts);
        }
    };

    let body = if bytes.is_empty() {
        None
    } else {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                let err = DomainError::new(
                    INVALID_CONTENT,
                    StatusCategory::BadRequest,
                    format!("Invalid JSON body: {}", e),
                );
                return validator.respond(err, &parts);
            }
        }
    };

    let query = match Query::<Vec<(String, String)>>::try_from_uri(&parts.uri) {
        Ok(Query(pairs)) => collect_query(pairs),
        Err(e) => {
            let err = DomainError::new(
                INVALID_CONTENT,
                StatusCategory::BadRequest,
                format!("Invalid query string: {}", e),
            );
            return validator.respond(err, &parts);
        }
    };

    let (route, path) = match validator.routes().resolve(parts.uri.path()) {
        Ok(Some(resolved)) => resolved,
        Ok(None) => (parts.uri.path().to_string(), Map::new()),
        Err(e) => {
            let err = DomainError::new(INVALID_CONTENT, StatusCategory::BadRequest, e.to_string());
            return validator.respond(err, &parts);
        }
    };

    let outcome = validator.validate(&RouteRequest {
        route: &route,
        method: parts.method.as_str(),
        path: &path,
        query: &query,
        body: body.as_ref(),
    });

    match outcome {
        Ok(params) => {
            let mut request = Request::from_parts(parts, Body::from(bytes));
            request.extensions_mut().insert(params);
            next.run(request).await
        }
        Err(err) => validator.respond(err, &parts),
    }
}

/// Query pairs into a map; a key given more than once becomes an array
fn collect_query(pairs: Vec<(String, String)>) -> Map<String, Value> {
    let mut query = Map::new();
    for (key, value) in pairs {
        match query.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                query.insert(key, Value::String(value));
            }
        }
    }
    query
}
