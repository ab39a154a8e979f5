pub mod document;
pub mod loader;
pub mod openapi;

pub use document::{ApiDocument, Declaration, Operation, ParameterLocation, PathItem};
pub use loader::load_api_document;
