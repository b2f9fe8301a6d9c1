//! Plugin extension point.
//!
//! A plugin sees the filtered rules and the core analysis result and may
//! contribute extra top-level fields to the result. Plugins are resolved
//! through a [`PluginRegistry`]: a reference is either the name of a
//! registered plugin or a path to an executable run as a [`ProcessPlugin`].

mod builtin;
mod process;

use std::path::Path;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

pub use builtin::{ConflictCheckPlugin, DeprecatedRulesPlugin};
pub use process::ProcessPlugin;

use crate::error::RulebaseError;
use crate::report::AnalysisResult;
use crate::rule::RuleRef;

/// Failure raised by a plugin.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The plugin could not be brought up (missing, not executable, failed to start).
    #[error("{0}")]
    Load(String),
    /// The plugin ran and failed, or produced unusable output.
    #[error("{0}")]
    Execution(String),
}

/// Anything that can extend an analysis result.
pub trait AnalysisPlugin {
    /// Registry name (or path, for process plugins).
    fn name(&self) -> &str;

    /// One-line description for listings.
    fn description(&self) -> &str {
        ""
    }

    /// Inspect the rules and core result; return an object whose fields are
    /// merged into the result. Any non-object value, or `None`, contributes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns a [`PluginError`] if the plugin cannot run or fails.
    fn analyze(
        &self,
        rules: &[RuleRef],
        base: &AnalysisResult,
    ) -> Result<Option<Value>, PluginError>;
}

/// Named plugins available to an analysis run.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Rc<dyn AnalysisPlugin>>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|p| p.name()))
            .finish()
    }
}

impl PluginRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in plugins.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(ConflictCheckPlugin);
        registry.register(DeprecatedRulesPlugin);
        registry
    }

    /// Register a plugin; a later registration under the same name wins.
    pub fn register(&mut self, plugin: impl AnalysisPlugin + 'static) {
        let plugin: Rc<dyn AnalysisPlugin> = Rc::new(plugin);
        self.plugins.retain(|p| p.name() != plugin.name());
        self.plugins.push(plugin);
    }

    /// Look up a registered plugin by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Rc<dyn AnalysisPlugin>> {
        self.plugins.iter().find(|p| p.name() == name).cloned()
    }

    /// Registered plugins, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn AnalysisPlugin> {
        self.plugins.iter().map(AsRef::as_ref)
    }

    /// Resolve a plugin reference: a registered name first, then a path to an
    /// executable.
    ///
    /// # Errors
    ///
    /// Returns [`RulebaseError::PluginLoad`] if the reference is neither a
    /// registered name nor a loadable executable.
    pub fn resolve(&self, reference: &str) -> Result<Rc<dyn AnalysisPlugin>, RulebaseError> {
        if let Some(plugin) = self.get(reference) {
            return Ok(plugin);
        }
        match ProcessPlugin::load(Path::new(reference)) {
            Ok(plugin) => Ok(Rc::new(plugin)),
            Err(e) => Err(RulebaseError::PluginLoad {
                plugin: reference.to_owned(),
                message: format!(
                    "{e} (registered plugins: {})",
                    self.iter().map(AnalysisPlugin::name).collect::<Vec<_>>().join(", ")
                ),
            }),
        }
    }
}

/// Run a plugin and merge its output into `base`.
///
/// # Errors
///
/// Returns [`RulebaseError::PluginLoad`] or [`RulebaseError::PluginExecution`]
/// depending on how the plugin failed. No partial result survives a failure.
pub fn run_plugin(
    plugin: &dyn AnalysisPlugin,
    rules: &[RuleRef],
    base: AnalysisResult,
) -> Result<AnalysisResult, RulebaseError> {
    let name = plugin.name();
    tracing::debug!(plugin = name, "running plugin");

    let output = plugin.analyze(rules, &base).map_err(|e| match e {
        PluginError::Load(message) => RulebaseError::PluginLoad {
            plugin: name.to_owned(),
            message,
        },
        PluginError::Execution(message) => RulebaseError::PluginExecution {
            plugin: name.to_owned(),
            message,
        },
    })?;

    match output {
        Some(Value::Object(fields)) => {
            tracing::debug!(plugin = name, fields = fields.len(), "merging plugin output");
            Ok(base.with_extensions(name, fields))
        }
        Some(other) => {
            tracing::debug!(plugin = name, output = %other, "ignoring non-object plugin output");
            Ok(base)
        }
        None => Ok(base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::analyze_rules;
    use crate::rule::Rule;
    use serde_json::json;

    struct Fixed(Option<Value>);

    impl AnalysisPlugin for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn analyze(
            &self,
            _rules: &[RuleRef],
            _base: &AnalysisResult,
        ) -> Result<Option<Value>, PluginError> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    impl AnalysisPlugin for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn analyze(
            &self,
            _rules: &[RuleRef],
            _base: &AnalysisResult,
        ) -> Result<Option<Value>, PluginError> {
            Err(PluginError::Execution("boom".to_owned()))
        }
    }

    fn rules() -> Vec<RuleRef> {
        vec![Rc::new(Rule::new("1", "A").with_category("c").with_content("x"))]
    }

    #[test]
    fn test_object_output_is_merged() {
        let rules = rules();
        let base = analyze_rules(&rules);
        let result = run_plugin(&Fixed(Some(json!({"score": 9}))), &rules, base).unwrap();
        assert_eq!(result.extensions.get("score"), Some(&json!(9)));
    }

    #[test]
    fn test_non_object_output_is_ignored() {
        let rules = rules();
        for output in [None, Some(json!(null)), Some(json!([1, 2])), Some(json!("text"))] {
            let base = analyze_rules(&rules);
            let result = run_plugin(&Fixed(output), &rules, base).unwrap();
            assert!(result.extensions.is_empty());
        }
    }

    #[test]
    fn test_execution_failure_is_fatal() {
        let rules = rules();
        let base = analyze_rules(&rules);
        let err = run_plugin(&Failing, &rules, base).unwrap_err();
        assert_eq!(err.kind(), "PluginExecutionError");
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_registry_resolves_builtins_by_name() {
        let registry = PluginRegistry::with_builtins();
        assert_eq!(registry.resolve("conflict-check").unwrap().name(), "conflict-check");
        assert_eq!(registry.resolve("deprecated").unwrap().name(), "deprecated");
    }

    #[test]
    fn test_registry_unknown_reference_is_load_error() {
        let registry = PluginRegistry::with_builtins();
        let err = registry.resolve("./no-such-plugin").err().unwrap();
        assert_eq!(err.kind(), "PluginLoadError");
        assert!(err.to_string().contains("conflict-check"), "got: {err}");
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = PluginRegistry::new();
        registry.register(Fixed(None));
        registry.register(Fixed(Some(json!({"a": 1}))));
        assert_eq!(registry.iter().count(), 1);
    }
}
