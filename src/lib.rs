//! Request validation for axum services described by a Swagger 2.0 (or
//! OpenAPI 3) document.
//!
//! For every incoming request the path, query and body parameters are
//! checked against the declarations of the matching operation. A request
//! that passes continues with its normalized values attached as
//! [`SwaggerParams`]; one that fails is answered with a single domain error.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod middleware;
pub mod pipeline;
pub mod route;
pub mod schema;
pub mod spec;

pub use cache::ValidatorCache;
pub use config::{Config, DEFAULT_BODY_LIMIT};
pub use engine::{
    CompiledSchema, EngineOptions, ErrorEntry, JsonSchemaEngine, RemoveAdditional, SchemaDraft,
    SchemaEngine,
};
pub use error::{Result, ValidatorError};
pub use http::validate_request;
pub use middleware::{Bundle, RequestValidator, RouteRequest, SwaggerParams};
pub use pipeline::{
    default_error_responder, default_error_transformer, DomainError, ErrorResponder,
    ErrorTransformer, StatusCategory,
};
pub use route::{route_to_path_key, RouteTable};
pub use schema::assemble;
pub use spec::{load_api_document, ApiDocument, Declaration, Operation, ParameterLocation, PathItem};
