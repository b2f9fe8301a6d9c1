//! JSON rulebase decoder.
//!
//! Also owns the shape check every other decoder delegates to once it has a
//! `serde_json::Value`: the document must be an array whose elements are all
//! objects.

use serde_json::Value;

use crate::error::RulebaseError;

/// Decode a JSON rulebase.
///
/// # Errors
///
/// Returns [`RulebaseError::Decode`] on a syntax error or if the top level is
/// not an array of objects.
pub fn decode_json(content: &str) -> Result<Vec<Value>, RulebaseError> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| RulebaseError::decode("json", e))?;
    records_from_value(value, "json")
}

/// Check that `value` is an array of objects and return its elements.
///
/// # Errors
///
/// Returns [`RulebaseError::Decode`] tagged with `format` if the value is not
/// an array, or names the first element that is not an object.
pub fn records_from_value(value: Value, format: &str) -> Result<Vec<Value>, RulebaseError> {
    let Value::Array(items) = value else {
        return Err(RulebaseError::decode(
            format,
            format!("expected an array of rules at the top level, found {}", kind_of(&value)),
        ));
    };

    if let Some((idx, item)) = items.iter().enumerate().find(|(_, v)| !v.is_object()) {
        return Err(RulebaseError::decode(
            format,
            format!("rule at index {idx} is {}, expected an object", kind_of(item)),
        ));
    }

    Ok(items)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
