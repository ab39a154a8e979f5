use crate::engine::{CompiledSchema, SchemaEngine};
use crate::error::Result;
use crate::schema::assemble;
use crate::spec::Declaration;
use dashmap::DashMap;
use std::sync::Arc;

/// Compiled validators keyed by operation (`path key` + `method`).
///
/// Entries are created on first use and never evicted or replaced. Two
/// threads missing the same key at once may both compile; the first insert
/// wins and both get an equivalent validator.
pub struct ValidatorCache {
    engine: Arc<dyn SchemaEngine>,
    validators: DashMap<String, Arc<dyn CompiledSchema>>,
}

impl ValidatorCache {
    pub fn new(engine: Arc<dyn SchemaEngine>) -> Self {
        Self {
            engine,
            validators: DashMap::new(),
        }
    }

    /// Returns the validator for `key`, assembling and compiling it on a miss.
    ///
    /// The declarations are only read on a miss: callers must pass the same
    /// declarations for the same key.
    pub fn get_or_compile(
        &self,
        key: &str,
        path_declarations: Option<&[Declaration]>,
        operation_declarations: Option<&[Declaration]>,
    ) -> Result<Arc<dyn CompiledSchema>> {
        if let Some(validator) = self.validators.get(key) {
            tracing::trace!(key, "validator cache hit");
            return Ok(Arc::clone(validator.value()));
        }

        let schema = assemble(path_declarations, operation_declarations)?;
        let compiled = self.engine.compile(schema)?;
        tracing::debug!(key, "compiled request validator");

        let entry = self.validators.entry(key.to_string()).or_insert(compiled);
        Ok(Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::{EngineOptions, JsonSchemaEngine};
    use crate::spec::ParameterLocation;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Engine wrapper counting how often a schema gets compiled
    #[derive(Default)]
    pub(crate) struct CountingEngine {
        inner: JsonSchemaEngine,
        pub(crate) compiled: AtomicUsize,
    }

    impl CountingEngine {
        pub(crate) fn count(&self) -> usize {
            self.compiled.load(Ordering::SeqCst)
        }
    }

    impl SchemaEngine for CountingEngine {
        fn compile(&self, schema: Value) -> Result<Arc<dyn CompiledSchema>> {
            self.compiled.fetch_add(1, Ordering::SeqCst);
            self.inner.compile(schema)
        }
    }

    fn decls() -> Vec<Declaration> {
        vec![Declaration::new("test", ParameterLocation::Query)
            .required(true)
            .with_constraint("type", json!("integer"))]
    }

    #[test]
    fn compiles_once_per_key() {
        let engine = Arc::new(CountingEngine::default());
        let cache = ValidatorCache::new(engine.clone());
        let decls = decls();

        let first = cache.get_or_compile("/testget", None, Some(&decls)).unwrap();
        let second = cache.get_or_compile("/testget", None, Some(&decls)).unwrap();

        assert_eq!(engine.count(), 1);
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));

        let mut a = json!({"path": {}, "query": {"test": "5"}, "body": {}});
        let mut b = a.clone();
        assert_eq!(first.validate(&mut a), second.validate(&mut b));
        assert_eq!(a, b);
    }

    #[test]
    fn ignores_declarations_on_hit() {
        let engine = Arc::new(CountingEngine::default());
        let cache = ValidatorCache::new(engine.clone());

        cache.get_or_compile("/testget", None, Some(&decls())).unwrap();
        let cached = cache.get_or_compile("/testget", None, None).unwrap();

        let mut data = json!({"path": {}, "query": {}, "body": {}});
        assert!(cached.validate(&mut data).is_err());
        assert_eq!(engine.count(), 1);
    }

    #[test]
    fn compiles_each_key_separately() {
        let engine = Arc::new(CountingEngine::default());
        let cache = ValidatorCache::new(engine.clone());

        cache.get_or_compile("/aget", None, Some(&decls())).unwrap();
        cache.get_or_compile("/apost", None, Some(&decls())).unwrap();
        cache.get_or_compile("/aget", None, Some(&decls())).unwrap();

        assert_eq!(engine.count(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_assembly_is_not_cached() {
        let cache = ValidatorCache::new(Arc::new(JsonSchemaEngine::new(EngineOptions::default())));
        let broken = vec![Declaration::new("body", ParameterLocation::Body)
            .with_schema(json!({"$ref": "#/definitions/Missing"}))];

        assert!(cache.get_or_compile("/xpost", None, Some(&broken)).is_err());
        assert!(cache.is_empty());
    }
}
