//! YAML rulebase decoder.
//!
//! The document is deserialized straight into a `serde_json::Value` and then
//! goes through the same shape check as JSON.

use serde_json::Value;

use crate::error::RulebaseError;

/// Decode a YAML rulebase (a top-level sequence of mappings).
///
/// A stream with several `---` documents is not a rulebase; only single
/// documents are accepted.
///
/// # Errors
///
/// Returns [`RulebaseError::Decode`] on a syntax error or a non-sequence
/// document, and [`RulebaseError::CapabilityUnavailable`] without the `yaml` feature.
pub fn decode_yaml(content: &str) -> Result<Vec<Value>, RulebaseError> {
    let value = parse_yaml(content)?;
    super::json::records_from_value(value, "yaml")
}

/// Parse a YAML document into a generic value.
///
/// Shared with the Markdown decoder for YAML front-matter.
///
/// # Errors
///
/// Returns [`RulebaseError::Decode`] on a syntax error.
#[cfg(feature = "yaml")]
pub fn parse_yaml(content: &str) -> Result<Value, RulebaseError> {
    if content.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_saphyr::from_str::<Value>(content).map_err(|e| RulebaseError::decode("yaml", e))
}

/// Stand-in used when the `yaml` feature is disabled.
///
/// # Errors
///
/// Always returns [`RulebaseError::CapabilityUnavailable`].
#[cfg(not(feature = "yaml"))]
pub fn parse_yaml(_content: &str) -> Result<Value, RulebaseError> {
    Err(RulebaseError::CapabilityUnavailable {
        format: "yaml".to_owned(),
        feature: "yaml",
    })
}

#[cfg(all(test, feature = "yaml"))]
mod tests {
    use super::*;

    #[test]
    fn test_decode_yaml_sequence() {
        let content = r"
- id: '1'
  title: A
  category: Cat1
  content: foo
  tags: [php, style]
- id: '2'
  title: B
  category: ''
  content: bar
";
        let records = decode_yaml(content).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], "1");
        assert_eq!(records[0]["tags"][1], "style");
        assert_eq!(records[1]["category"], "");
    }

    #[test]
    fn test_decode_yaml_mapping_is_shape_error() {
        let err = decode_yaml("id: '1'\ntitle: A\n").unwrap_err();
        assert_eq!(err.kind(), "DecodeError");
        assert!(err.to_string().contains("expected an array"), "got: {err}");
    }

    #[test]
    fn test_decode_yaml_syntax_error() {
        let err = decode_yaml(": : :\n  - [unclosed\n").unwrap_err();
        assert_eq!(err.kind(), "DecodeError");
        assert!(err.to_string().starts_with("failed to decode yaml rulebase"));
    }

    #[test]
    fn test_decode_yaml_empty_document_is_shape_error() {
        let err = decode_yaml("   \n").unwrap_err();
        assert!(err.to_string().contains("found null"), "got: {err}");
    }
}
