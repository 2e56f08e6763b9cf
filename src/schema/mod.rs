//! JSON Schema validation of phase outputs.
//!
//! Every plugin payload is checked against the bundled plugin schema as soon
//! as it is extracted, and every merger contribution record against its
//! merger's record schema before merging. A violation names the subject being
//! validated, the JSON path of the first failing instance (`$`-rooted), the
//! validator's message and the total number of violations.

use crate::core::error::{MosaicError, Result};
use serde_json::Value;
use std::sync::OnceLock;

const PLUGIN_SCHEMA: &str = include_str!("plugin_schema.json");

/// The bundled plugin payload schema.
pub fn plugin_schema() -> &'static Value {
    static SCHEMA: OnceLock<Value> = OnceLock::new();
    // An unparsable bundled file surfaces later as `InvalidSchema`.
    SCHEMA.get_or_init(|| serde_json::from_str(PLUGIN_SCHEMA).unwrap_or(Value::Null))
}

/// A compiled JSON Schema.
pub struct SchemaValidator {
    name: String,
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator").field("name", &self.name).finish()
    }
}

impl SchemaValidator {
    /// Compile `schema`. `name` labels errors about the schema itself.
    pub fn new(name: &str, schema: &Value) -> Result<Self> {
        if !schema.is_object() {
            return Err(MosaicError::InvalidSchema {
                subject: name.to_string(),
                message: "schema must be a JSON object".to_string(),
            });
        }
        let validator = jsonschema::options()
            .should_validate_formats(true)
            .build(schema)
            .map_err(|e| MosaicError::InvalidSchema {
                subject: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            name: name.to_string(),
            validator,
        })
    }

    /// Validator for plugin payloads.
    pub fn plugin() -> Result<Self> {
        Self::new("plugin payload", plugin_schema())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        self.validator.is_valid(value)
    }

    /// Validate `value`, reporting failures against `subject`.
    pub fn validate(&self, subject: &str, value: &Value) -> Result<()> {
        let mut errors = self.validator.iter_errors(value);
        let Some(first) = errors.next() else {
            return Ok(());
        };
        let path = first.instance_path.to_string();
        let path = if path.is_empty() {
            "$".to_string()
        } else {
            format!("${path}")
        };
        let message = first.to_string();
        let count = 1 + errors.count();

        Err(MosaicError::SchemaViolation {
            subject: subject.to_string(),
            path,
            message,
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> Value {
        json!({
            "plugin_name": "case_overview",
            "version": "1.0",
            "priorities": {"configure": 100, "extract": 200, "render": 100},
            "attributes": ["clinical"],
            "merge_inputs": {
                "gene_information_merger": [{"gene": "TP53", "summary": "tumour suppressor"}]
            },
            "results": {"donor": "PANX_1249"}
        })
    }

    #[test]
    fn test_bundled_schema_compiles() {
        assert!(plugin_schema().is_object());
        let validator = SchemaValidator::plugin().unwrap();
        assert!(validator.is_valid(&valid_payload()));
        assert!(validator.validate("case_overview", &valid_payload()).is_ok());
    }

    #[test]
    fn test_missing_field_is_reported_at_root() {
        let validator = SchemaValidator::plugin().unwrap();
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("results");

        let err = validator.validate("case_overview", &payload).unwrap_err();
        match err {
            MosaicError::SchemaViolation {
                subject,
                path,
                message,
                count,
            } => {
                assert_eq!(subject, "case_overview");
                assert_eq!(path, "$");
                assert!(message.contains("results"));
                assert_eq!(count, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_nested_violation_path() {
        let validator = SchemaValidator::plugin().unwrap();
        let mut payload = valid_payload();
        payload["priorities"]["render"] = json!("high");

        let err = validator.validate("case_overview", &payload).unwrap_err();
        assert!(matches!(
            err,
            MosaicError::SchemaViolation { ref path, .. } if path == "$/priorities/render"
        ));
    }

    #[test]
    fn test_rejects_unknown_attribute_and_bad_version() {
        let validator = SchemaValidator::plugin().unwrap();
        let mut payload = valid_payload();
        payload["attributes"] = json!(["clinical", "confidential"]);
        payload["version"] = json!("one");

        let err = validator.validate("case_overview", &payload).unwrap_err();
        assert!(matches!(err, MosaicError::SchemaViolation { count: 2, .. }));
    }

    #[test]
    fn test_merge_inputs_must_target_mergers() {
        let validator = SchemaValidator::plugin().unwrap();
        let mut payload = valid_payload();
        payload["merge_inputs"] = json!({"case_overview": []});
        assert!(!validator.is_valid(&payload));
    }

    #[test]
    fn test_invalid_schema() {
        let err = SchemaValidator::new("broken", &json!({"type": 12})).unwrap_err();
        assert!(matches!(err, MosaicError::InvalidSchema { .. }));

        let err = SchemaValidator::new("broken", &json!("string")).unwrap_err();
        assert!(matches!(err, MosaicError::InvalidSchema { .. }));
    }
}
