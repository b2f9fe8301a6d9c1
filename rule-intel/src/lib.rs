//! # rule-intel
//!
//! Analysis pipeline for rulebases: ordered collections of rule records kept
//! as JSON, YAML, TOML or Markdown.
//!
//! A run decodes the document into generic records, filters them by status
//! and tags, gates on a JSON Schema, runs the anomaly detectors and optionally
//! one plugin. The result renders to JSON, Markdown, CSV or HTML.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use rule_intel::output::{ReportFormat, render};
//! use rule_intel::{AnalysisConfig, AnalysisOutcome, FilterConfig, RuleSchema, analyze, load_source};
//!
//! let mut config = AnalysisConfig::default();
//! config.filter = FilterConfig::default().with_status("active");
//!
//! let source = load_source(Path::new("rules.yaml"), config.max_file_size).unwrap();
//! let schema = RuleSchema::builtin().unwrap();
//!
//! match analyze(&source, &schema, &config, None).unwrap() {
//!     AnalysisOutcome::Completed(result) => println!("{}", render(&result, ReportFormat::Markdown).unwrap()),
//!     AnalysisOutcome::Rejected(outcome) => println!("{} violation(s)", outcome.errors_count()),
//! }
//! ```

mod config;
mod detect;
mod error;
mod filter;
pub mod format;
pub mod output;
pub mod plugin;
mod report;
mod rule;
mod schema;
mod source;

pub use config::{AnalysisConfig, FilterConfig};
pub use detect::{
    analyze_rules, category_stats, find_duplicate_titles, find_empty_contents,
    find_missing_categories,
};
pub use error::{RulebaseError, ValidationError};
pub use filter::filter_records;
pub use format::RulebaseFormat;
pub use plugin::{AnalysisPlugin, PluginError, PluginRegistry};
pub use report::{AnalysisResult, CORE_FIELDS, CategoryStats, UNDEFINED_CATEGORY, ValidationOutcome};
pub use rule::{Rule, RuleRef, is_blank, rules_from_records};
pub use schema::{BUILTIN_SCHEMA, RuleSchema};
pub use source::{RulebaseSource, load_source, read_file_bounded};

use serde_json::Value;

/// How an analysis run ended.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    /// The filtered records failed schema validation; no detection ran.
    Rejected(ValidationOutcome),
    /// Detection (and the plugin, if any) ran to completion.
    Completed(AnalysisResult),
}

/// Decode a source and apply the record filter.
///
/// # Errors
///
/// Returns an error if the format cannot be resolved or the document cannot
/// be decoded.
pub fn decode_records(
    source: &RulebaseSource,
    filter: &FilterConfig,
) -> Result<Vec<Value>, RulebaseError> {
    let format = source.resolve_format()?;
    let records = format::decode(&source.bytes, format)?;
    let decoded = records.len();
    let records = filter_records(records, filter);
    tracing::debug!(
        %format,
        decoded,
        kept = records.len(),
        "decoded and filtered rulebase"
    );
    Ok(records)
}

/// Decode, filter and validate a rulebase without running detection.
///
/// # Errors
///
/// Returns an error if decoding fails. Schema violations are reported in the
/// returned [`ValidationOutcome`], never as an error.
pub fn validate(
    source: &RulebaseSource,
    schema: &RuleSchema,
    config: &AnalysisConfig,
) -> Result<ValidationOutcome, RulebaseError> {
    let records = decode_records(source, &config.filter)?;
    let outcome = schema.validate(&records);
    tracing::info!(
        records = records.len(),
        valid = outcome.valid,
        errors = outcome.errors_count(),
        "validated rulebase"
    );
    Ok(outcome)
}

/// Run the full pipeline: decode, filter, validate, detect, then the plugin.
///
/// Validation gates detection: a rulebase that violates the schema yields
/// [`AnalysisOutcome::Rejected`] and neither detectors nor plugin run.
///
/// # Errors
///
/// Returns an error if decoding fails, a record cannot be read as a rule, or
/// the plugin fails to load or run. A failing plugin leaves no partial result.
pub fn analyze(
    source: &RulebaseSource,
    schema: &RuleSchema,
    config: &AnalysisConfig,
    plugin: Option<&dyn AnalysisPlugin>,
) -> Result<AnalysisOutcome, RulebaseError> {
    let records = decode_records(source, &config.filter)?;

    let outcome = schema.validate(&records);
    if !outcome.valid {
        tracing::info!(
            errors = outcome.errors_count(),
            schema = schema.origin(),
            "rulebase rejected by schema"
        );
        return Ok(AnalysisOutcome::Rejected(outcome));
    }

    let rules = rules_from_records(&records)?;
    let mut result = analyze_rules(&rules);
    if let Some(plugin) = plugin {
        result = plugin::run_plugin(plugin, &rules, result)?;
    }

    tracing::info!(
        total = result.total_rules,
        anomalies = result.anomalies_count(),
        extensions = result.extensions.len(),
        "analysis complete"
    );
    Ok(AnalysisOutcome::Completed(result))
}
