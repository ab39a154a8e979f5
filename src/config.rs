use crate::engine::EngineOptions;
use crate::pipeline::{
    default_error_responder, default_error_transformer, ErrorResponder, ErrorTransformer,
};
use std::fmt;
use std::sync::Arc;

/// Request bodies larger than this are rejected before validation
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Constructor-time settings of a [`crate::RequestValidator`]
#[derive(Clone)]
pub struct Config {
    pub engine: EngineOptions,
    pub error_transformer: ErrorTransformer,
    pub error_responder: ErrorResponder,
    pub body_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineOptions::default(),
            error_transformer: Arc::new(default_error_transformer),
            error_responder: Arc::new(default_error_responder),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl Config {
    pub fn with_engine_options(mut self, engine: EngineOptions) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_error_transformer(mut self, transformer: ErrorTransformer) -> Self {
        self.error_transformer = transformer;
        self
    }

    pub fn with_error_responder(mut self, responder: ErrorResponder) -> Self {
        self.error_responder = responder;
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("engine", &self.engine)
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}
