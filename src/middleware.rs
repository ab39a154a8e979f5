use crate::cache::ValidatorCache;
use crate::config::Config;
use crate::engine::{JsonSchemaEngine, SchemaEngine};
use crate::error::Result;
use crate::pipeline::DomainError;
use crate::route::{route_to_path_key, RouteTable};
use crate::schema::{BODY, PATH, QUERY};
use crate::spec::ApiDocument;
use axum::http::request::Parts;
use axum::response::Response;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// The request data a validation pass needs, as handed over by the framework
#[derive(Debug, Clone, Copy)]
pub struct RouteRequest<'a> {
    /// Matched route template, e.g. `/users/:id`
    pub route: &'a str,
    pub method: &'a str,
    pub path: &'a Map<String, Value>,
    pub query: &'a Map<String, Value>,
    pub body: Option<&'a Value>,
}

/// Per-request copy of the data under validation.
///
/// Validation normalizes the bundle in place; the request's own containers
/// are never touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Bundle {
    pub path: Map<String, Value>,
    pub query: Map<String, Value>,
    pub body: Value,
}

impl Bundle {
    pub fn from_request(request: &RouteRequest<'_>) -> Self {
        Self {
            path: request.path.clone(),
            query: request.query.clone(),
            body: request
                .body
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
        }
    }

    fn into_value(self) -> Value {
        let mut data = Map::new();
        data.insert(PATH.to_string(), Value::Object(self.path));
        data.insert(QUERY.to_string(), Value::Object(self.query));
        data.insert(BODY.to_string(), self.body);
        Value::Object(data)
    }

    fn from_value(value: Value) -> Self {
        let Value::Object(mut data) = value else {
            return Self::default();
        };

        let mut section = |name: &str| match data.remove(name) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        Self {
            path: section(PATH),
            query: section(QUERY),
            body: data.remove(BODY).unwrap_or(Value::Null),
        }
    }
}

/// Validated request data published to downstream handlers
#[derive(Debug, Clone)]
pub struct SwaggerParams {
    pub api: Arc<ApiDocument>,
    pub path: Map<String, Value>,
    pub query: Map<String, Value>,
    pub body: Value,
    /// `path`, `query` and top-level `body` keys merged, later ones winning
    pub params: Map<String, Value>,
}

impl SwaggerParams {
    fn publish(api: Arc<ApiDocument>, bundle: Bundle) -> Self {
        let mut params = bundle.path.clone();
        params.extend(bundle.query.iter().map(|(k, v)| (k.clone(), v.clone())));
        if let Value::Object(body) = &bundle.body {
            params.extend(body.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        Self {
            api,
            path: bundle.path,
            query: bundle.query,
            body: bundle.body,
            params,
        }
    }
}

/// Validates requests against the declarations of an [`ApiDocument`]
pub struct RequestValidator {
    api: Arc<ApiDocument>,
    config: Config,
    cache: ValidatorCache,
    routes: RouteTable,
}

impl RequestValidator {
    pub fn new(api: Arc<ApiDocument>, config: Config) -> Self {
        let engine = Arc::new(JsonSchemaEngine::new(config.engine.clone()));
        Self::with_engine(api, config, engine)
    }

    /// Like [`RequestValidator::new`] but compiling with a custom engine; the
    /// engine options in `config` are then left to that engine.
    pub fn with_engine(api: Arc<ApiDocument>, config: Config, engine: Arc<dyn SchemaEngine>) -> Self {
        let routes = RouteTable::from_document(&api);
        Self {
            api,
            config,
            cache: ValidatorCache::new(engine),
            routes,
        }
    }

    pub fn api(&self) -> &Arc<ApiDocument> {
        &self.api
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn cache(&self) -> &ValidatorCache {
        &self.cache
    }

    /// Hands a rejection to the configured responder
    pub fn respond(&self, err: DomainError, parts: &Parts) -> Response {
        (self.config.error_responder)(err, parts)
    }

    /// Runs one validation pass.
    ///
    /// `Ok` carries the normalized parameters; every failure, including
    /// configuration defects in the document, comes back as a single
    /// [`DomainError`].
    pub fn validate(&self, request: &RouteRequest<'_>) -> std::result::Result<SwaggerParams, DomainError> {
        let path_key = route_to_path_key(request.route);
        let method = request.method.to_ascii_lowercase();

        self.validate_operation(&path_key, &method, request)
            .unwrap_or_else(|err| {
                tracing::warn!(path = %path_key, method = %method, error = %err, "request validation aborted");
                Err(DomainError::from(err))
            })
    }

    fn validate_operation(
        &self,
        path_key: &str,
        method: &str,
        request: &RouteRequest<'_>,
    ) -> Result<std::result::Result<SwaggerParams, DomainError>> {
        let path_declarations = self.api.path_declarations(path_key);
        let operation_declarations = self.api.operation_declarations(path_key, method);

        if path_declarations.is_none() && operation_declarations.is_none() {
            tracing::debug!(path = %path_key, method = %method, "no parameter declarations for route");
            let bundle = Bundle::from_request(request);
            return Ok(Err((self.config.error_transformer)(&bundle, None)));
        }

        let operation_key = format!("{}{}", path_key, method);
        let validator = self.cache.get_or_compile(
            &operation_key,
            path_declarations,
            operation_declarations,
        )?;

        let mut data = Bundle::from_request(request).into_value();
        let outcome = validator.validate(&mut data);
        let bundle = Bundle::from_value(data);

        Ok(match outcome {
            Ok(()) => Ok(SwaggerParams::publish(Arc::clone(&self.api), bundle)),
            Err(errors) => {
                tracing::debug!(key = %operation_key, errors = errors.len(), "request failed validation");
                Err((self.config.error_transformer)(&bundle, Some(errors)))
            }
        })
    }
}
