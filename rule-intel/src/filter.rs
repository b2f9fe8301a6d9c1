//! Record filtering by status and tags.
//!
//! Runs on the decoded records, before schema validation, so a filter can
//! narrow a rulebase to a schema-conformant subset.

use serde_json::Value;

use crate::config::FilterConfig;

/// Keep the records matching `filter`, preserving their order.
///
/// - `status`: exact equality with the record's `status` string.
/// - `tags`: the record's `tags` must share at least one entry with the set.
///
/// Both conditions must hold when both are set. A record without `status`
/// (or `tags`) never matches a non-empty status (or tag) filter.
#[must_use]
pub fn filter_records(records: Vec<Value>, filter: &FilterConfig) -> Vec<Value> {
    if filter.is_empty() {
        return records;
    }

    let before = records.len();
    let kept: Vec<Value> = records
        .into_iter()
        .filter(|record| matches_status(record, filter) && matches_tags(record, filter))
        .collect();
    tracing::debug!(before, after = kept.len(), "filtered records");
    kept
}

fn matches_status(record: &Value, filter: &FilterConfig) -> bool {
    match filter.status.as_deref() {
        None | Some("") => true,
        Some(wanted) => record.get("status").and_then(Value::as_str) == Some(wanted),
    }
}

fn matches_tags(record: &Value, filter: &FilterConfig) -> bool {
    if filter.tags.is_empty() {
        return true;
    }
    record
        .get("tags")
        .and_then(Value::as_array)
        .is_some_and(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .any(|tag| filter.tags.iter().any(|wanted| wanted == tag))
        })
}
