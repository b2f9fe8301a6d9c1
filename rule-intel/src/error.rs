//! Error types for rulebase analysis.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// An unrecoverable failure that aborts the current analysis run.
///
/// Structural schema violations are *not* represented here: they are an
/// expected outcome and are returned as data in
/// [`ValidationOutcome`](crate::ValidationOutcome).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RulebaseError {
    /// The rulebase bytes could not be decoded into a record sequence.
    #[error("failed to decode {format} rulebase: {message}")]
    Decode {
        /// Format the decoder was running as.
        format: String,
        /// Underlying parser message.
        message: String,
    },

    /// The format token (hint or file extension) is not a supported format.
    #[error("unsupported rulebase format '{token}'")]
    UnsupportedFormat {
        /// The offending format token.
        token: String,
    },

    /// The format is known but decoding support was not compiled in.
    #[error("{format} decoding is unavailable: rebuild with the '{feature}' feature enabled")]
    CapabilityUnavailable {
        /// Format that was requested.
        format: String,
        /// Cargo feature providing the capability.
        feature: &'static str,
    },

    /// The schema document is missing, unparsable, or not a valid JSON Schema.
    #[error("failed to load schema from {origin}: {message}")]
    SchemaLoad {
        /// Where the schema came from (a path, or `<builtin>`).
        origin: String,
        /// Human-readable cause.
        message: String,
    },

    /// The plugin reference could not be resolved to a runnable plugin.
    #[error("failed to load plugin '{plugin}': {message}")]
    PluginLoad {
        /// The plugin reference as given by the caller.
        plugin: String,
        /// Human-readable cause.
        message: String,
    },

    /// The plugin ran but failed.
    #[error("plugin '{plugin}' failed: {message}")]
    PluginExecution {
        /// Plugin name or path.
        plugin: String,
        /// Underlying failure message.
        message: String,
    },

    /// A source file could not be read.
    #[error("{}: {message}", path.display())]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// Human-readable cause.
        message: String,
    },
}

impl RulebaseError {
    /// Stable label naming the error kind, for callers that report it.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "DecodeError",
            Self::UnsupportedFormat { .. } => "UnsupportedFormatError",
            Self::CapabilityUnavailable { .. } => "CapabilityUnavailableError",
            Self::SchemaLoad { .. } => "SchemaLoadError",
            Self::PluginLoad { .. } => "PluginLoadError",
            Self::PluginExecution { .. } => "PluginExecutionError",
            Self::Io { .. } => "IoError",
        }
    }

    pub(crate) fn decode(format: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            format: format.into(),
            message: message.to_string(),
        }
    }
}

/// A single structural schema violation found in the record sequence.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ValidationError {
    /// JSON pointer into the record sequence (e.g. `/2/title`); empty for the root.
    pub instance_path: String,
    /// JSON pointer to the schema keyword that failed (e.g. `/items/required`).
    pub schema_path: String,
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    /// Format the error for human-readable output.
    ///
    /// `{instance_path}: {message}`, using `/` for the root.
    #[must_use]
    pub fn format_human_readable(&self) -> String {
        let at = if self.instance_path.is_empty() {
            "/"
        } else {
            self.instance_path.as_str()
        };
        format!("{at}: {}", self.message)
    }
}
