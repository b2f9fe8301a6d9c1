//! External process plugins.
//!
//! The executable receives `{"rules": [...], "analysis": {...}}` as JSON on
//! stdin and writes its partial result as JSON on stdout. Empty stdout means
//! no contribution. A non-zero exit status is an execution failure carrying
//! the process's stderr.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Serialize;
use serde_json::Value;

use super::{AnalysisPlugin, PluginError};
use crate::report::AnalysisResult;
use crate::rule::RuleRef;

#[derive(Serialize)]
struct PluginInput<'a> {
    rules: &'a [RuleRef],
    analysis: &'a AnalysisResult,
}

/// A plugin implemented by an external executable.
#[derive(Debug, Clone)]
pub struct ProcessPlugin {
    path: PathBuf,
    name: String,
}

impl ProcessPlugin {
    /// Check that `path` names an executable file.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Load`] if the file is missing, not a regular
    /// file, or (on Unix) has no execute permission.
    pub fn load(path: &Path) -> Result<Self, PluginError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            PluginError::Load(format!("cannot access {}: {e}", path.display()))
        })?;

        if !metadata.is_file() {
            return Err(PluginError::Load(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if metadata.permissions().mode() & 0o111 == 0 {
                return Err(PluginError::Load(format!(
                    "{} is not executable",
                    path.display()
                )));
            }
        }

        Ok(Self {
            path: path.to_owned(),
            name: path.display().to_string(),
        })
    }

    /// Path of the executable.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AnalysisPlugin for ProcessPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "external executable plugin"
    }

    fn analyze(
        &self,
        rules: &[RuleRef],
        base: &AnalysisResult,
    ) -> Result<Option<Value>, PluginError> {
        let input = serde_json::to_vec(&PluginInput {
            rules,
            analysis: base,
        })
        .map_err(|e| PluginError::Execution(format!("failed to encode plugin input: {e}")))?;

        let mut child = Command::new(&self.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PluginError::Load(format!("failed to start {}: {e}", self.name)))?;

        // The plugin may write output before it has read all of its input.
        let stdin = child.stdin.take();
        let writer = std::thread::spawn(move || match stdin {
            Some(mut stdin) => stdin.write_all(&input),
            None => Ok(()),
        });

        let output = child
            .wait_with_output()
            .map_err(|e| PluginError::Execution(format!("failed to wait for plugin: {e}")))?;

        match writer.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => {
                return Err(PluginError::Execution(format!(
                    "failed to write plugin input: {e}"
                )));
            }
            Err(_) => {
                return Err(PluginError::Execution(
                    "plugin input writer panicked".to_owned(),
                ));
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            return Err(PluginError::Execution(if stderr.is_empty() {
                format!("process exited with {}", output.status)
            } else {
                format!("process exited with {}: {stderr}", output.status)
            }));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if stdout.is_empty() {
            return Ok(None);
        }

        serde_json::from_str(stdout)
            .map(Some)
            .map_err(|e| PluginError::Execution(format!("plugin output is not valid JSON: {e}")))
    }
}
