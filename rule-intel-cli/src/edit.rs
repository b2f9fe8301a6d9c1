//! In-place editing of JSON rulebases.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

/// Field updates for one rule. Unset (or empty string) fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleChanges {
    pub title: Option<String>,
    pub category: Option<String>,
    pub content: Option<String>,
    pub severity: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl RuleChanges {
    /// The updates to apply, in field order, as a JSON object.
    #[must_use]
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        let strings = [
            ("title", &self.title),
            ("category", &self.category),
            ("content", &self.content),
            ("severity", &self.severity),
        ];
        for (key, value) in strings {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                fields.insert(key.to_owned(), Value::String(value.to_owned()));
            }
        }
        if let Some(tags) = &self.tags {
            fields.insert(
                "tags".to_owned(),
                Value::Array(tags.iter().cloned().map(Value::String).collect()),
            );
        }
        fields
    }
}

/// Apply `changes` to the record whose `id` equals `id`; returns the fields
/// that were written.
///
/// # Errors
///
/// Returns an error if no record has that id.
pub fn apply_edit(
    records: &mut [Value],
    id: &str,
    changes: &RuleChanges,
) -> Result<Map<String, Value>> {
    let Some(rule) = records
        .iter_mut()
        .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
        .and_then(Value::as_object_mut)
    else {
        bail!("Rule not found: {id}");
    };

    let fields = changes.to_fields();
    for (key, value) in &fields {
        rule.insert(key.clone(), value.clone());
    }
    Ok(fields)
}

/// Rewrite a JSON rulebase file with one rule edited.
///
/// The file is re-serialized with 2-space indentation; key order of every
/// record is preserved. The new content goes to a temporary file next to the
/// rulebase, which then replaces it, so a failed write leaves the original
/// untouched.
///
/// # Errors
///
/// Returns an error if the file exceeds `max_file_size`, is not a readable
/// JSON array, the id is unknown, or the file cannot be written.
pub fn edit_rulebase(
    path: &Path,
    id: &str,
    changes: &RuleChanges,
    max_file_size: u64,
) -> Result<Map<String, Value>> {
    let raw = rule_intel::read_file_bounded(path, max_file_size)
        .with_context(|| format!("failed to read rulebase {}", path.display()))?;
    let mut records: Vec<Value> = serde_json::from_slice(&raw)
        .with_context(|| format!("{} is not a JSON array of rules", path.display()))?;

    let applied = apply_edit(&mut records, id, changes)?;

    let json = serde_json::to_string_pretty(&records)?;
    replace_file(path, json.as_bytes())
        .with_context(|| format!("failed to write rulebase {}", path.display()))?;
    tracing::info!(id, fields = applied.len(), path = %path.display(), "edited rule");
    Ok(applied)
}

fn replace_file(path: &Path, content: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let permissions = std::fs::metadata(path)?.permissions();

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.as_file().set_permissions(permissions)?;
    tmp.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_to_fields_skips_unset_and_empty() {
        let changes = RuleChanges {
            title: Some("New".to_owned()),
            category: Some(String::new()),
            tags: Some(vec!["a".to_owned(), "b".to_owned()]),
            ..RuleChanges::default()
        };
        assert_eq!(
            Value::Object(changes.to_fields()),
            json!({"title": "New", "tags": ["a", "b"]})
        );
    }

    #[test]
    fn test_apply_edit_updates_matching_rule() {
        let mut records = vec![
            json!({"id": "1", "title": "Old", "category": "c"}),
            json!({"id": "2", "title": "Other"}),
        ];
        let changes = RuleChanges {
            title: Some("New".to_owned()),
            severity: Some("high".to_owned()),
            ..RuleChanges::default()
        };
        let applied = apply_edit(&mut records, "1", &changes).unwrap();
        assert_eq!(applied.len(), 2);
        assert_eq!(
            records[0],
            json!({"id": "1", "title": "New", "category": "c", "severity": "high"})
        );
        assert_eq!(records[1]["title"], "Other");
    }

    #[test]
    fn test_apply_edit_unknown_id() {
        let mut records = vec![json!({"id": "1"})];
        let err = apply_edit(&mut records, "9", &RuleChanges::default()).unwrap_err();
        assert!(err.to_string().contains("Rule not found: 9"));
    }

    #[test]
    fn test_edit_rulebase_replaces_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, r#"[{"id": "1", "title": "Old", "zeta": 0}]"#).unwrap();

        let changes = RuleChanges {
            title: Some("New".to_owned()),
            ..RuleChanges::default()
        };
        edit_rulebase(&path, "1", &changes, 1024).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            raw,
            "[\n  {\n    \"id\": \"1\",\n    \"title\": \"New\",\n    \"zeta\": 0\n  }\n]"
        );
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "temporary file left behind");
    }

    #[test]
    fn test_edit_rulebase_rejects_oversized_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.json");
        let original = r#"[{"id": "1", "title": "Old"}]"#;
        std::fs::write(&path, original).unwrap();

        let changes = RuleChanges {
            title: Some("New".to_owned()),
            ..RuleChanges::default()
        };
        let err = edit_rulebase(&path, "1", &changes, 8).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read rulebase"), "got: {err:#}");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_edit_rulebase_unknown_id_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.json");
        let original = r#"[{"id": "1", "title": "Old"}]"#;
        std::fs::write(&path, original).unwrap();

        let err = edit_rulebase(&path, "9", &RuleChanges::default(), 1024).unwrap_err();
        assert!(err.to_string().contains("Rule not found: 9"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }
}
