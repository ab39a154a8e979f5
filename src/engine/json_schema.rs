use super::normalize::normalize;
use super::report::to_entries;
use super::{CompiledSchema, EngineOptions, ErrorEntry, SchemaDraft, SchemaEngine};
use crate::error::{Result, ValidatorError};
use jsonschema::{Draft, Validator};
use serde_json::Value;
use std::sync::Arc;

/// Schema engine backed by the `jsonschema` crate
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaEngine {
    options: EngineOptions,
}

impl JsonSchemaEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }
}

fn draft(draft: SchemaDraft) -> Draft {
    match draft {
        SchemaDraft::Draft4 => Draft::Draft4,
        SchemaDraft::Draft6 => Draft::Draft6,
        SchemaDraft::Draft7 => Draft::Draft7,
    }
}

impl SchemaEngine for JsonSchemaEngine {
    fn compile(&self, schema: Value) -> Result<Arc<dyn CompiledSchema>> {
        let validator = jsonschema::options()
            .with_draft(draft(self.options.draft))
            .should_validate_formats(self.options.validate_formats)
            .build(&schema)
            .map_err(|e| ValidatorError::SchemaCompilationError(e.to_string()))?;

        Ok(Arc::new(JsonSchemaValidator {
            schema,
            validator,
            options: self.options.clone(),
        }))
    }
}

/// A compiled schema plus the source it was built from, which the
/// normalization pass and error reporting both read.
pub struct JsonSchemaValidator {
    schema: Value,
    validator: Validator,
    options: EngineOptions,
}

impl CompiledSchema for JsonSchemaValidator {
    fn validate(&self, data: &mut Value) -> std::result::Result<(), Vec<ErrorEntry>> {
        normalize(&self.schema, data, &self.options);

        if self.validator.is_valid(data) {
            return Ok(());
        }

        let limit = if self.options.all_errors { usize::MAX } else { 1 };
        let errors: Vec<ErrorEntry> = self
            .validator
            .iter_errors(data)
            .flat_map(|e| to_entries(&e, &self.schema, self.options.verbose))
            .take(limit)
            .collect();

        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RemoveAdditional;
    use crate::schema::assemble;
    use crate::spec::{Declaration, ParameterLocation};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn compile(decls: &[Declaration], options: EngineOptions) -> Arc<dyn CompiledSchema> {
        let schema = assemble(None, Some(decls)).unwrap();
        JsonSchemaEngine::new(options).compile(schema).unwrap()
    }

    fn bundle(query: Value) -> Value {
        json!({"path": {}, "query": query, "body": {}})
    }

    fn required_integer() -> Vec<Declaration> {
        vec![Declaration::new("test", ParameterLocation::Query)
            .required(true)
            .with_constraint("type", json!("integer"))]
    }

    #[test]
    fn coerces_and_accepts_numeric_query_values() {
        let validator = compile(&required_integer(), EngineOptions::default());
        let mut data = bundle(json!({"test": "1"}));

        assert!(validator.validate(&mut data).is_ok());
        assert_eq!(data["query"]["test"], json!(1));
    }

    #[test]
    fn reports_missing_required_property() {
        let validator = compile(&required_integer(), EngineOptions::default());
        let mut data = bundle(json!({"no_test": "1"}));

        let errors = validator.validate(&mut data).unwrap_err();
        assert_eq!(
            errors,
            vec![ErrorEntry {
                data_path: ".query".to_string(),
                keyword: "required".to_string(),
                message: "should have required property 'test'".to_string(),
                params: json!({"missingProperty": "test"}),
                schema: json!(["test"]),
                schema_path: "#/properties/query/required".to_string(),
                parent_schema: None,
                data: None,
            }]
        );
    }

    #[test]
    fn reports_type_mismatch() {
        let validator = compile(&required_integer(), EngineOptions::default());
        let mut data = bundle(json!({"test": "abc"}));

        let errors = validator.validate(&mut data).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].keyword, "type");
        assert_eq!(errors[0].data_path, ".query.test");
        assert_eq!(errors[0].message, "should be integer");
        assert_eq!(errors[0].params, json!({"type": "integer"}));
        assert_eq!(
            errors[0].schema_path,
            "#/properties/query/properties/test/type"
        );
    }

    #[test]
    fn reports_enum_violation() {
        let decls = vec![Declaration::new("test", ParameterLocation::Query)
            .with_constraint("type", json!("string"))
            .with_constraint("enum", json!(["enum1", "enum2"]))];
        let validator = compile(&decls, EngineOptions::default());
        let mut data = bundle(json!({"test": "abc"}));

        let errors = validator.validate(&mut data).unwrap_err();
        assert_eq!(errors[0].keyword, "enum");
        assert_eq!(errors[0].data_path, ".query.test");
        assert_eq!(errors[0].params, json!({"allowedValues": ["enum1", "enum2"]}));
    }

    #[test]
    fn stops_at_first_error_unless_all_errors() {
        let decls = vec![
            Declaration::new("a", ParameterLocation::Query)
                .required(true)
                .with_constraint("type", json!("integer")),
            Declaration::new("b", ParameterLocation::Query)
                .required(true)
                .with_constraint("type", json!("integer")),
        ];

        let all = compile(&decls, EngineOptions::default());
        assert_eq!(all.validate(&mut bundle(json!({}))).unwrap_err().len(), 2);

        let first = compile(
            &decls,
            EngineOptions {
                all_errors: false,
                ..EngineOptions::default()
            },
        );
        assert_eq!(first.validate(&mut bundle(json!({}))).unwrap_err().len(), 1);
    }

    #[test]
    fn verbose_mode_attaches_parent_schema_and_data() {
        let validator = compile(
            &required_integer(),
            EngineOptions {
                verbose: true,
                ..EngineOptions::default()
            },
        );
        let mut data = bundle(json!({"test": "abc"}));

        let errors = validator.validate(&mut data).unwrap_err();
        assert_eq!(errors[0].parent_schema, Some(json!({"type": "integer"})));
        assert_eq!(errors[0].data, Some(json!("abc")));
    }

    #[test]
    fn removes_additional_before_reporting() {
        let decls = vec![Declaration::new("body", ParameterLocation::Body).with_schema(json!({
            "type": "object",
            "properties": {"id": {"type": "integer"}},
            "additionalProperties": false
        }))];

        let strict = compile(&decls, EngineOptions::default());
        let mut data = json!({"path": {}, "query": {}, "body": {"id": 1, "extra": true}});
        let errors = strict.validate(&mut data).unwrap_err();
        assert_eq!(errors[0].keyword, "additionalProperties");
        assert_eq!(errors[0].params, json!({"additionalProperty": "extra"}));
        assert_eq!(errors[0].data_path, ".body");

        let stripping = compile(
            &decls,
            EngineOptions {
                remove_additional: RemoveAdditional::Declared,
                ..EngineOptions::default()
            },
        );
        let mut data = json!({"path": {}, "query": {}, "body": {"id": 1, "extra": true}});
        assert!(stripping.validate(&mut data).is_ok());
        assert_eq!(data["body"], json!({"id": 1}));
    }

    #[test]
    fn rejects_invalid_schemas_at_compile_time() {
        let engine = JsonSchemaEngine::default();
        let err = engine.compile(json!({"type": 12})).err().unwrap();
        assert!(matches!(err, ValidatorError::SchemaCompilationError(_)));
    }
}
