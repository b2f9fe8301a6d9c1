//! Interaction log.
//!
//! A JSON array of `{timestamp, type, payload}` entries kept in a single
//! file. Every operation re-reads the file, so concurrent writers lose
//! updates; the log is a convenience record, not a journal.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default log location, relative to the working directory.
pub const DEFAULT_MEMORY_FILE: &str = "memory.json";

/// What kind of interaction an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Edit,
    Suggest,
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Edit => "edit",
            Self::Suggest => "suggest",
        })
    }
}

/// One logged interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    pub payload: Value,
}

/// Handle to an interaction log file.
#[derive(Debug, Clone)]
pub struct InteractionLog {
    path: PathBuf,
}

impl InteractionLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Interaction>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read interaction log {}", self.path.display())
                });
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "interaction log is unreadable, treating it as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    fn store(&self, entries: &[Interaction]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write interaction log {}", self.path.display()))
    }

    /// Append an entry stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read or written.
    pub fn append(&self, kind: InteractionKind, payload: Value) -> Result<Interaction> {
        let mut entries = self.load()?;
        let entry = Interaction {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            kind,
            payload,
        };
        entries.push(entry.clone());
        self.store(&entries)?;
        tracing::debug!(%kind, entries = entries.len(), "appended interaction");
        Ok(entry)
    }

    /// All entries, or the most recent `limit` when `limit > 0`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the log exists but cannot be read.
    pub fn history(&self, limit: usize) -> Result<Vec<Interaction>> {
        let mut entries = self.load()?;
        if limit > 0 && entries.len() > limit {
            entries.drain(..entries.len() - limit);
        }
        Ok(entries)
    }

    /// Reset the log to an empty array.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn clear(&self) -> Result<()> {
        self.store(&[])
    }
}
