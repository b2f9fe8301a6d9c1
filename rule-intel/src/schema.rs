//! Structural validation of rule records against a JSON Schema.
//!
//! The schema describes the whole record sequence (normally `type: array`
//! with an `items` object schema), so instance paths in violations start
//! with the record index: `/3/title`.

use std::path::Path;

use serde_json::Value;

use crate::error::{RulebaseError, ValidationError};
use crate::report::ValidationOutcome;
use crate::source::read_file_bounded;

/// The rule schema shipped with the crate, used when no schema path is given.
pub const BUILTIN_SCHEMA: &str = include_str!("../schemas/rule-schema.json");

const BUILTIN_ORIGIN: &str = "<builtin>";

/// A compiled rulebase schema.
pub struct RuleSchema {
    origin: String,
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for RuleSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSchema")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl RuleSchema {
    /// The built-in rule schema.
    ///
    /// # Errors
    ///
    /// Returns [`RulebaseError::SchemaLoad`] only if the embedded schema is broken.
    pub fn builtin() -> Result<Self, RulebaseError> {
        Self::from_slice(BUILTIN_SCHEMA.as_bytes(), BUILTIN_ORIGIN)
    }

    /// Load and compile a schema file.
    ///
    /// # Errors
    ///
    /// Returns [`RulebaseError::SchemaLoad`] if the file is missing, unreadable,
    /// not JSON, or not a valid JSON Schema.
    pub fn load(path: &Path, max_file_size: u64) -> Result<Self, RulebaseError> {
        let origin = path.display().to_string();
        let bytes = read_file_bounded(path, max_file_size).map_err(|e| {
            let message = match e {
                RulebaseError::Io { message, .. } => message,
                other => other.to_string(),
            };
            RulebaseError::SchemaLoad {
                origin: origin.clone(),
                message,
            }
        })?;
        Self::from_slice(&bytes, origin)
    }

    /// Compile a schema from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RulebaseError::SchemaLoad`] if the bytes are not JSON or not a
    /// valid JSON Schema.
    pub fn from_slice(bytes: &[u8], origin: impl Into<String>) -> Result<Self, RulebaseError> {
        let origin = origin.into();
        let document: Value =
            serde_json::from_slice(bytes).map_err(|e| RulebaseError::SchemaLoad {
                origin: origin.clone(),
                message: format!("invalid JSON: {e}"),
            })?;
        Self::from_value(&document, origin)
    }

    /// Compile an already-parsed schema document.
    ///
    /// # Errors
    ///
    /// Returns [`RulebaseError::SchemaLoad`] if the document is not a valid JSON Schema.
    pub fn from_value(document: &Value, origin: impl Into<String>) -> Result<Self, RulebaseError> {
        let origin = origin.into();
        let validator = jsonschema::validator_for(document).map_err(|e| {
            RulebaseError::SchemaLoad {
                origin: origin.clone(),
                message: format!("not a valid JSON Schema: {e}"),
            }
        })?;
        tracing::debug!(%origin, "compiled rule schema");
        Ok(Self { origin, validator })
    }

    /// Where this schema was loaded from.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Validate a record sequence, collecting every violation in discovery order.
    #[must_use]
    pub fn validate(&self, records: &[Value]) -> ValidationOutcome {
        let instance = Value::Array(records.to_vec());
        let errors: Vec<ValidationError> = self
            .validator
            .iter_errors(&instance)
            .map(|error| ValidationError {
                instance_path: error.instance_path().to_string(),
                schema_path: error.schema_path().to_string(),
                message: error.to_string(),
            })
            .collect();

        if !errors.is_empty() {
            tracing::debug!(
                violations = errors.len(),
                schema = %self.origin,
                "rulebase failed validation"
            );
        }
        ValidationOutcome::from_errors(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_schema_accepts_valid_rulebase() {
        let schema = RuleSchema::builtin().unwrap();
        let records = vec![
            json!({"id": "1", "title": "A", "category": "Cat1", "content": "foo"}),
            json!({"id": "2", "title": "B", "category": "", "content": "bar", "status": "any"}),
        ];
        let outcome = schema.validate(&records);
        assert!(outcome.valid, "unexpected errors: {:?}", outcome.errors);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_builtin_schema_rejects_missing_fields() {
        let schema = RuleSchema::builtin().unwrap();
        let outcome = schema.validate(&[json!({"foo": "bar"})]);
        assert!(!outcome.valid);
        assert!(!outcome.errors.is_empty());
        assert!(outcome.errors.iter().all(|e| e.instance_path == "/0"));
    }

    #[test]
    fn test_violation_paths_point_into_records() {
        let schema = RuleSchema::builtin().unwrap();
        let records = vec![
            json!({"id": "1", "title": "A", "category": "c", "content": "x"}),
            json!({"id": "2", "title": 7, "category": "c", "content": "x"}),
        ];
        let outcome = schema.validate(&records);
        assert!(!outcome.valid);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].instance_path, "/1/title");
        assert!(outcome.errors[0].schema_path.ends_with("/type"));
    }

    #[test]
    fn test_unparsable_schema_is_load_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = RuleSchema::load(file.path(), 1024).unwrap_err();
        assert_eq!(err.kind(), "SchemaLoadError");
        assert!(err.to_string().contains("invalid JSON"), "got: {err}");
    }

    #[test]
    fn test_missing_schema_is_load_error() {
        let err = RuleSchema::load(Path::new("/no/such/schema.json"), 1024).unwrap_err();
        assert_eq!(err.kind(), "SchemaLoadError");
    }

    #[test]
    fn test_invalid_json_schema_is_load_error() {
        let err = RuleSchema::from_value(&json!({"type": 12}), "inline").unwrap_err();
        assert_eq!(err.kind(), "SchemaLoadError");
        assert!(err.to_string().contains("not a valid JSON Schema"), "got: {err}");
    }
}
