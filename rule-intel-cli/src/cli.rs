// Commands write reports to stdout and diagnostics to stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::json;

use rule_intel::output::{self, ReportFormat};
use rule_intel::{
    AnalysisConfig, AnalysisOutcome, FilterConfig, PluginRegistry, RuleSchema, RulebaseFormat,
    RulebaseSource, ValidationOutcome, load_source,
};

use crate::edit::{RuleChanges, edit_rulebase};
use crate::logging;
use crate::memory::{DEFAULT_MEMORY_FILE, InteractionKind, InteractionLog};

#[derive(Parser, Debug)]
#[command(
    name = "rule-intel",
    version,
    about = "Rulebase analysis: validation, anomaly detection and reporting"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the rulebase, detect anomalies and render a report
    Analyze(AnalyzeArgs),
    /// Validate the rulebase against the schema
    Validate(ValidateArgs),
    /// Edit a rule in a JSON rulebase
    Edit(EditArgs),
    /// Inspect or clear the interaction log
    Memory {
        #[command(subcommand)]
        action: MemoryCommand,
    },
    /// List built-in plugins
    Plugins,
}

/// Options shared by commands that read a rulebase.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Path to the rulebase file
    #[arg(short, long)]
    pub rulebase: PathBuf,

    /// Path to a JSON Schema file (defaults to the built-in rule schema)
    #[arg(short, long)]
    pub schema: Option<PathBuf>,

    /// Rulebase format (json, yaml, toml, md); inferred from the extension if omitted
    #[arg(long, value_name = "FORMAT")]
    pub input_format: Option<RulebaseFormat>,

    /// Only consider rules with this status
    #[arg(long)]
    pub status: Option<String>,

    /// Only consider rules carrying at least one of these tags (comma-separated)
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format: json, md, csv or html
    #[arg(short, long, default_value = "json")]
    pub format: ReportFormat,

    /// Plugin to run after detection: a built-in name or a path to an executable
    #[arg(long)]
    pub plugin: Option<String>,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Print the validation outcome as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// ID of the rule to edit
    pub id: String,

    /// Path to the JSON rulebase file
    #[arg(short, long)]
    pub rulebase: PathBuf,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New category
    #[arg(long)]
    pub category: Option<String>,

    /// New content
    #[arg(long)]
    pub content: Option<String>,

    /// New severity
    #[arg(long)]
    pub severity: Option<String>,

    /// New tags (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    /// Interaction log file
    #[arg(long, default_value = DEFAULT_MEMORY_FILE)]
    pub memory: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum MemoryCommand {
    /// Print logged interactions as JSON
    List {
        /// Show only the most recent N entries
        #[arg(short, long, default_value_t = 0)]
        limit: usize,

        /// Interaction log file
        #[arg(long, default_value = DEFAULT_MEMORY_FILE)]
        memory: PathBuf,
    },
    /// Remove every logged interaction
    Clear {
        /// Interaction log file
        #[arg(long, default_value = DEFAULT_MEMORY_FILE)]
        memory: PathBuf,
    },
}

/// Parse the command line and run the selected command.
///
/// # Errors
///
/// Returns an error if the command fails, including when the rulebase does
/// not validate.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    run_command(cli.command)
}

fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::Analyze(args) => run_analyze(&args),
        Commands::Validate(args) => run_validate(&args),
        Commands::Edit(args) => run_edit(args),
        Commands::Memory { action } => run_memory(action),
        Commands::Plugins => {
            for plugin in PluginRegistry::with_builtins().iter() {
                println!("{:<16} {}", plugin.name(), plugin.description());
            }
            Ok(())
        }
    }
}

impl SourceArgs {
    fn config(&self) -> AnalysisConfig {
        let mut filter =
            FilterConfig::default().with_tags(self.tags.iter().map(|t| t.trim().to_owned()));
        if let Some(status) = &self.status {
            filter = filter.with_status(status.as_str());
        }
        let mut config = AnalysisConfig::default();
        config.filter = filter;
        config
    }

    fn load(&self, config: &AnalysisConfig) -> Result<(RulebaseSource, RuleSchema)> {
        let mut source = load_source(&self.rulebase, config.max_file_size)?;
        if let Some(format) = self.input_format {
            source = source.with_format(format);
        }
        let schema = match &self.schema {
            Some(path) => RuleSchema::load(path, config.max_file_size)?,
            None => RuleSchema::builtin()?,
        };
        Ok((source, schema))
    }
}

fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let config = args.source.config();
    let (source, schema) = args.source.load(&config)?;

    let plugin = match &args.plugin {
        Some(reference) => Some(PluginRegistry::with_builtins().resolve(reference)?),
        None => None,
    };

    let outcome = rule_intel::analyze(&source, &schema, &config, plugin.as_deref())?;
    let result = match outcome {
        AnalysisOutcome::Completed(result) => result,
        AnalysisOutcome::Rejected(validation) => {
            report_validation(&validation, schema.origin())?;
            bail!(
                "rulebase validation failed with {} error(s)",
                validation.errors_count()
            );
        }
    };

    let mut report = output::render(&result, args.format)
        .context("failed to render analysis report")?;
    if !report.ends_with('\n') {
        report.push('\n');
    }
    match &args.output {
        Some(path) => write_report(path, &report)?,
        None => print!("{report}"),
    }
    Ok(())
}

fn write_report(path: &Path, report: &str) -> Result<()> {
    std::fs::write(path, report)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote report");
    Ok(())
}

fn run_validate(args: &ValidateArgs) -> Result<()> {
    let config = args.source.config();
    let (source, schema) = args.source.load(&config)?;
    let outcome = rule_intel::validate(&source, &schema, &config)?;

    if args.json {
        output::write_validation_json(&outcome, &mut std::io::stdout().lock())?;
    } else {
        report_validation(&outcome, schema.origin())?;
    }

    if !outcome.valid {
        bail!(
            "rulebase validation failed with {} error(s)",
            outcome.errors_count()
        );
    }
    Ok(())
}

/// Human-readable validation report: stdout when valid, stderr otherwise,
/// with the verdict line colored.
fn report_validation(outcome: &ValidationOutcome, schema_origin: &str) -> Result<()> {
    let mut buffer = Vec::new();
    output::write_validation(outcome, schema_origin, &mut buffer)?;
    let text = String::from_utf8_lossy(&buffer);
    let (verdict, details) = text.split_once('\n').unwrap_or((text.as_ref(), ""));

    if outcome.valid {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", verdict.green())?;
        write!(out, "{details}")?;
    } else {
        let mut err = std::io::stderr().lock();
        writeln!(err, "{}", verdict.red().bold())?;
        write!(err, "{details}")?;
    }
    Ok(())
}

fn run_edit(args: EditArgs) -> Result<()> {
    let changes = RuleChanges {
        title: args.title,
        category: args.category,
        content: args.content,
        severity: args.severity,
        tags: args.tags,
    };

    if RulebaseFormat::from_path(&args.rulebase).ok() != Some(RulebaseFormat::Json) {
        bail!(
            "edit supports JSON rulebases only: {}",
            args.rulebase.display()
        );
    }

    let max_file_size = AnalysisConfig::default().max_file_size;
    let applied = edit_rulebase(&args.rulebase, &args.id, &changes, max_file_size)?;
    println!("Rule {} updated.", args.id);

    InteractionLog::new(args.memory).append(
        InteractionKind::Edit,
        json!({ "id": args.id, "changes": applied }),
    )?;
    Ok(())
}

fn run_memory(action: MemoryCommand) -> Result<()> {
    match action {
        MemoryCommand::List { limit, memory } => {
            let entries = InteractionLog::new(memory).history(limit)?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        MemoryCommand::Clear { memory } => {
            InteractionLog::new(memory).clear()?;
            println!("Memory cleared.");
        }
    }
    Ok(())
}
