//! Format-specific rulebase decoders.
//!
//! Each sub-module handles a specific document format and produces the same
//! thing: an ordered sequence of JSON objects, one per rule record.
//! - `json`: top-level array
//! - `yaml`: top-level sequence (delegates shape checks to `json`)
//! - `toml`: the `rules` array of tables
//! - `markdown`: front-matter `rules`, or a JSON array in the body

pub mod json;
pub mod markdown;
pub mod toml;
pub mod yaml;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value;

use crate::error::RulebaseError;

/// A supported rulebase document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RulebaseFormat {
    Json,
    Yaml,
    Toml,
    Markdown,
}

/// File extension (lowercase, without the dot) to format.
const EXTENSION_TABLE: &[(&str, RulebaseFormat)] = &[
    ("json", RulebaseFormat::Json),
    ("yaml", RulebaseFormat::Yaml),
    ("yml", RulebaseFormat::Yaml),
    ("toml", RulebaseFormat::Toml),
    ("md", RulebaseFormat::Markdown),
    ("markdown", RulebaseFormat::Markdown),
];

impl RulebaseFormat {
    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Markdown => "markdown",
        }
    }

    /// Look up a format by extension or name, case-insensitively.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim().trim_start_matches('.').to_ascii_lowercase();
        EXTENSION_TABLE
            .iter()
            .find(|(ext, _)| *ext == token)
            .map(|(_, format)| *format)
    }

    /// Infer the format from a path's extension.
    ///
    /// # Errors
    ///
    /// Returns [`RulebaseError::UnsupportedFormat`] naming the extension (empty
    /// if the path has none) when it is not in the extension table.
    pub fn from_path(path: &Path) -> Result<Self, RulebaseError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_token(&ext).ok_or(RulebaseError::UnsupportedFormat { token: ext })
    }
}

impl fmt::Display for RulebaseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RulebaseFormat {
    type Err = RulebaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| RulebaseError::UnsupportedFormat {
            token: s.to_owned(),
        })
    }
}

/// Decode raw bytes in the given format into rule records.
///
/// # Errors
///
/// Returns [`RulebaseError::Decode`] for non-UTF-8 input, syntax errors, or a
/// document that does not hold an array of objects, and
/// [`RulebaseError::CapabilityUnavailable`] if the format's feature is disabled.
pub fn decode(bytes: &[u8], format: RulebaseFormat) -> Result<Vec<Value>, RulebaseError> {
    let content = std::str::from_utf8(bytes).map_err(|e| {
        RulebaseError::decode(format.as_str(), format!("content is not valid UTF-8: {e}"))
    })?;

    let records = match format {
        RulebaseFormat::Json => json::decode_json(content)?,
        RulebaseFormat::Yaml => yaml::decode_yaml(content)?,
        RulebaseFormat::Toml => self::toml::decode_toml(content)?,
        RulebaseFormat::Markdown => markdown::decode_markdown(content)?,
    };
    tracing::debug!(%format, records = records.len(), "decoded rulebase");
    Ok(records)
}
