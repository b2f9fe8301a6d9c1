//! Configuration types for rulebase analysis.
//!
//! Split into the filter applied to the record sequence and the run-level
//! options around it, so callers can build one without the other.

/// Record filter applied before validation and detection.
///
/// An empty filter (no status, no tags) passes every record through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct FilterConfig {
    /// Keep only records whose `status` equals this string exactly.
    pub status: Option<String>,
    /// Keep only records sharing at least one tag with this set.
    pub tags: Vec<String>,
}

impl FilterConfig {
    /// Filter on status only.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Filter on a tag set (OR semantics within the set).
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this filter keeps every record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.as_deref().is_none_or(str::is_empty) && self.tags.is_empty()
    }
}

/// Run-level options for the analysis pipeline.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct AnalysisConfig {
    /// Filter applied to the decoded records.
    pub filter: FilterConfig,
    /// Maximum size in bytes of a rulebase or schema file (default: 10 MB).
    pub max_file_size: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            max_file_size: 10_485_760,
        }
    }
}
