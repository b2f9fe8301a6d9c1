//! Analysis and validation result types.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::rule::RuleRef;

/// Sentinel category label for rules whose category is absent or blank.
pub const UNDEFINED_CATEGORY: &str = "undefined";

/// Top-level keys of the core analysis fields, in output order.
pub const CORE_FIELDS: &[&str] = &[
    "totalRules",
    "missingCategories",
    "duplicateTitles",
    "emptyContents",
    "categoryStats",
];

/// Outcome of structural schema validation.
///
/// A failed validation is an expected result, not an error: callers decide
/// whether to proceed.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct ValidationOutcome {
    /// Whether the record sequence conforms to the schema.
    pub valid: bool,
    /// Violations in discovery order; empty when `valid`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
}

impl ValidationOutcome {
    /// Build an outcome from a (possibly empty) violation list.
    #[must_use]
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Number of violations.
    #[must_use]
    pub fn errors_count(&self) -> usize {
        self.errors.len()
    }
}

/// Per-category rule counts, keyed in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryStats {
    entries: Vec<(String, usize)>,
}

impl CategoryStats {
    /// Count one more rule under `label`.
    pub fn increment(&mut self, label: &str) {
        if let Some((_, count)) = self.entries.iter_mut().find(|(l, _)| l == label) {
            *count += 1;
        } else {
            self.entries.push((label.to_owned(), 1));
        }
    }

    /// Count for `label`, if any rule carries it.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, count)| *count)
    }

    /// `(label, count)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), *c))
    }

    /// Number of distinct labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no rule has been counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }
}

impl Serialize for CategoryStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, count) in &self.entries {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

/// Result of one analysis run.
///
/// Anomaly lists hold shared handles to the rules of the filtered rulebase,
/// in rulebase order. `extensions` carries fields contributed by a plugin;
/// when serialized, an extension whose key matches a core field replaces
/// that field.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct AnalysisResult {
    /// Rules considered, after filtering.
    pub total_rules: usize,
    /// Rules whose category is absent or blank.
    pub missing_categories: Vec<RuleRef>,
    /// Rules sharing their exact title with at least one other rule.
    pub duplicate_titles: Vec<RuleRef>,
    /// Rules whose content is absent or blank.
    pub empty_contents: Vec<RuleRef>,
    /// Rule counts per category.
    pub category_stats: CategoryStats,
    /// Plugin-contributed top-level fields.
    pub extensions: Map<String, Value>,
}

impl AnalysisResult {
    /// Shallow-merge plugin output onto this result (last write wins).
    #[must_use]
    pub fn with_extensions(mut self, plugin: &str, fields: Map<String, Value>) -> Self {
        for (key, value) in fields {
            if CORE_FIELDS.contains(&key.as_str()) {
                tracing::warn!(plugin, field = %key, "plugin output overrides a core analysis field");
            }
            self.extensions.insert(key, value);
        }
        self
    }

    /// Total number of anomaly findings across the three lists.
    #[must_use]
    pub fn anomalies_count(&self) -> usize {
        self.missing_categories.len() + self.duplicate_titles.len() + self.empty_contents.len()
    }
}

fn serialize_core_entry<M, T>(
    map: &mut M,
    extensions: &Map<String, Value>,
    key: &str,
    value: &T,
) -> Result<(), M::Error>
where
    M: SerializeMap,
    T: Serialize + ?Sized,
{
    match extensions.get(key) {
        Some(replacement) => map.serialize_entry(key, replacement),
        None => map.serialize_entry(key, value),
    }
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        let ext = &self.extensions;
        serialize_core_entry(&mut map, ext, "totalRules", &self.total_rules)?;
        serialize_core_entry(&mut map, ext, "missingCategories", &self.missing_categories)?;
        serialize_core_entry(&mut map, ext, "duplicateTitles", &self.duplicate_titles)?;
        serialize_core_entry(&mut map, ext, "emptyContents", &self.empty_contents)?;
        serialize_core_entry(&mut map, ext, "categoryStats", &self.category_stats)?;
        for (key, value) in ext {
            if !CORE_FIELDS.contains(&key.as_str()) {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}
