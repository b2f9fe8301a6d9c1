//! The rule record model.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RulebaseError;

/// Shared handle to a rule. Anomaly lists hold clones of these handles, so
/// every finding points at the same rule the rulebase holds.
pub type RuleRef = Rc<Rule>;

/// A single rule record.
///
/// `id` and `title` are required by the default schema; they default to the
/// empty string here so that a permissive user schema never makes the typed
/// view fail on their absence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Rule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Any other keys of the source record, in source order.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Rule {
    /// Create a rule with the given id and title and no other fields.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Set the tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Whether the category is absent or blank.
    #[must_use]
    pub fn has_blank_category(&self) -> bool {
        is_blank(self.category.as_deref())
    }

    /// Whether the content is absent or blank.
    #[must_use]
    pub fn has_blank_content(&self) -> bool {
        is_blank(self.content.as_deref())
    }
}

/// The one "absent or empty" predicate every detector uses.
///
/// A field counts as blank when it is missing or trims to the empty string.
#[must_use]
pub fn is_blank(field: Option<&str>) -> bool {
    field.is_none_or(|s| s.trim().is_empty())
}

/// Build typed rules from decoded records.
///
/// Runs after schema validation, so a record may carry optional fields of a
/// type the rule model does not use (a numeric `severity`, a string `tags`).
/// Those values are kept verbatim in [`Rule::extra`] and the typed field
/// stays unset.
///
/// # Errors
///
/// Returns [`RulebaseError::Decode`] naming the index of the offending record
/// when `id` or `title` is not a string.
pub fn rules_from_records(records: &[Value]) -> Result<Vec<RuleRef>, RulebaseError> {
    records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            rule_from_record(record)
                .map(Rc::new)
                .map_err(|e| RulebaseError::decode("rule", format!("record {idx}: {e}")))
        })
        .collect()
}

fn rule_from_record(record: &Value) -> Result<Rule, serde_json::Error> {
    let Some(object) = record.as_object() else {
        return Rule::deserialize(record);
    };

    let mut typed = Map::new();
    let mut mistyped = Map::new();
    for (key, value) in object {
        if fits_typed_field(key, value) {
            typed.insert(key.clone(), value.clone());
        } else {
            mistyped.insert(key.clone(), value.clone());
        }
    }

    let mut rule = Rule::deserialize(Value::Object(typed))?;
    rule.extra.extend(mistyped);
    Ok(rule)
}

/// Whether `value` can populate the optional typed field `key`. Keys that
/// are not optional typed fields always fit.
fn fits_typed_field(key: &str, value: &Value) -> bool {
    match key {
        "category" | "content" | "severity" | "status" => {
            matches!(value, Value::Null | Value::String(_))
        }
        "tags" => match value {
            Value::Null => true,
            Value::Array(items) => items.iter().all(Value::is_string),
            _ => false,
        },
        _ => true,
    }
}
