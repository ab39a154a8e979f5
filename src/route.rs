use crate::error::{Result, ValidatorError};
use crate::spec::ApiDocument;
use matchit::Router;
use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};

/// Prefix marking a placeholder segment in framework route templates
const PARAM_PREFIX: char = ':';

/// Rewrites a framework route template (`/users/:id`) into the API document's
/// path-key notation (`/users/{id}`).
///
/// Any query string or fragment is dropped. Segments that do not start with
/// `:` pass through unchanged, so already translated keys are left alone.
pub fn route_to_path_key(route: &str) -> String {
    let end = route.find(&['?', '#'][..]).unwrap_or(route.len());

    route[..end]
        .split('/')
        .map(|segment| match segment.strip_prefix(PARAM_PREFIX) {
            Some(name) => format!("{{{}}}", name),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolves concrete request paths to the document's path keys.
///
/// Used by adapters whose framework does not expose the matched route
/// template.
pub struct RouteTable {
    router: Router<String>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    /// Registers every path key of the document. Keys the router rejects
    /// (conflicting or malformed templates) are skipped.
    pub fn from_document(api: &ApiDocument) -> Self {
        let mut table = Self::new();
        for path_key in api.paths.keys() {
            if let Err(e) = table.insert(path_key) {
                tracing::warn!(path = %path_key, error = %e, "path key not routable, skipping");
            }
        }
        table
    }

    pub fn insert(&mut self, path_key: &str) -> std::result::Result<(), matchit::InsertError> {
        self.router.insert(path_key, path_key.to_string())
    }

    /// Returns the path key matching `path` together with its percent-decoded
    /// path variables. `Ok(None)` when no path key matches.
    pub fn resolve(&self, path: &str) -> Result<Option<(String, Map<String, Value>)>> {
        let Ok(matched) = self.router.at(path) else {
            return Ok(None);
        };

        let variables = matched
            .params
            .iter()
            .map(|(name, value)| {
                let decoded = percent_decode_str(value).decode_utf8().map_err(|e| {
                    ValidatorError::InvalidPathEncoding(format!("{} ({})", name, e))
                })?;
                Ok((name.to_string(), Value::String(decoded.into_owned())))
            })
            .collect::<Result<Map<String, Value>>>()?;

        Ok(Some((matched.value.clone(), variables)))
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}
