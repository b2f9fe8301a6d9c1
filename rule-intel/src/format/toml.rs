//! TOML rulebase decoder.
//!
//! TOML has no top-level arrays, so a TOML rulebase keeps its rules in the
//! `rules` array of tables:
//!
//! ```toml
//! [[rules]]
//! id = "1"
//! title = "No eval"
//! category = "security"
//! content = "Never call eval()"
//! ```

use serde_json::Value;

use crate::error::RulebaseError;

/// Decode a TOML rulebase from its `rules` array.
///
/// A document without a `rules` key is an empty rulebase.
///
/// # Errors
///
/// Returns [`RulebaseError::Decode`] on a syntax error or if `rules` is not an
/// array of tables, and [`RulebaseError::CapabilityUnavailable`] without the
/// `toml` feature.
pub fn decode_toml(content: &str) -> Result<Vec<Value>, RulebaseError> {
    let document = parse_toml(content)?;
    let rules = match document {
        Value::Object(mut table) => table.remove("rules").unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    super::json::records_from_value(rules, "toml")
}

/// Parse a TOML document into a generic value.
///
/// Shared with the Markdown decoder for `+++` front-matter.
///
/// # Errors
///
/// Returns [`RulebaseError::Decode`] on a syntax error.
#[cfg(feature = "toml")]
pub fn parse_toml(content: &str) -> Result<Value, RulebaseError> {
    let table: ::toml::Table =
        ::toml::from_str(content).map_err(|e| RulebaseError::decode("toml", e))?;
    serde_json::to_value(table).map_err(|e| RulebaseError::decode("toml", e))
}

/// Stand-in used when the `toml` feature is disabled.
///
/// # Errors
///
/// Always returns [`RulebaseError::CapabilityUnavailable`].
#[cfg(not(feature = "toml"))]
pub fn parse_toml(_content: &str) -> Result<Value, RulebaseError> {
    Err(RulebaseError::CapabilityUnavailable {
        format: "toml".to_owned(),
        feature: "toml",
    })
}
