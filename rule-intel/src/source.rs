//! Rulebase and schema sources.
//!
//! The pipeline works on in-memory bytes; this module is the thin file
//! boundary that produces them. Reads are bounded so a stray multi-gigabyte
//! file fails fast instead of exhausting memory.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::RulebaseError;
use crate::format::RulebaseFormat;

/// Raw rulebase bytes plus what is known about where they came from.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct RulebaseSource {
    /// Raw document bytes.
    pub bytes: Vec<u8>,
    /// Originating path, used for extension-based format inference.
    pub path: Option<PathBuf>,
    /// Explicit format; wins over the path extension.
    pub format_hint: Option<RulebaseFormat>,
}

impl RulebaseSource {
    /// A source with no path; a format hint is then required to decode it.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            path: None,
            format_hint: None,
        }
    }

    /// Attach the originating path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach an explicit format.
    #[must_use]
    pub fn with_format(mut self, format: RulebaseFormat) -> Self {
        self.format_hint = Some(format);
        self
    }

    /// Resolve the format: the hint if present, otherwise the path extension.
    ///
    /// # Errors
    ///
    /// Returns [`RulebaseError::UnsupportedFormat`] if neither yields a known format.
    pub fn resolve_format(&self) -> Result<RulebaseFormat, RulebaseError> {
        if let Some(format) = self.format_hint {
            return Ok(format);
        }
        match &self.path {
            Some(path) => RulebaseFormat::from_path(path),
            None => Err(RulebaseError::UnsupportedFormat {
                token: String::new(),
            }),
        }
    }
}

/// Read a rulebase file into a [`RulebaseSource`] carrying its path.
///
/// # Errors
///
/// Returns [`RulebaseError::Io`] if the file cannot be read or exceeds `max_file_size`.
pub fn load_source(path: &Path, max_file_size: u64) -> Result<RulebaseSource, RulebaseError> {
    let bytes = read_file_bounded(path, max_file_size)?;
    Ok(RulebaseSource::from_bytes(bytes).with_path(path))
}

/// Read a file using a bounded read, enforcing `max_file_size`.
///
/// Reads at most `max_file_size + 1` bytes through `Read::take`, so the size
/// check and the read are the same operation.
///
/// # Errors
///
/// Returns [`RulebaseError::Io`] if the file cannot be opened or read, or is too large.
pub fn read_file_bounded(path: &Path, max_file_size: u64) -> Result<Vec<u8>, RulebaseError> {
    let io_error = |message: String| RulebaseError::Io {
        path: path.to_owned(),
        message,
    };

    let file =
        std::fs::File::open(path).map_err(|e| io_error(format!("failed to open file: {e}")))?;

    let mut buffer = Vec::new();
    file.take(max_file_size.saturating_add(1))
        .read_to_end(&mut buffer)
        .map_err(|e| io_error(format!("failed to read file: {e}")))?;

    if buffer.len() as u64 > max_file_size {
        return Err(io_error(format!(
            "file exceeds maximum size of {max_file_size} bytes"
        )));
    }

    Ok(buffer)
}
