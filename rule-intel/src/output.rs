//! Rendering of analysis results and validation outcomes.
//!
//! Every renderer is a pure function of its input. Only the JSON renderer
//! shows plugin-contributed fields; the Markdown, CSV and HTML layouts are
//! fixed to the core fields.

use std::fmt;
use std::fmt::Write as _;
use std::io::Write;
use std::str::FromStr;

use crate::report::{AnalysisResult, ValidationOutcome};
use crate::rule::RuleRef;

/// Output format for an analysis result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    #[default]
    Json,
    Markdown,
    Csv,
    Html,
}

impl ReportFormat {
    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
            Self::Csv => "csv",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "md" | "markdown" => Ok(Self::Markdown),
            "csv" => Ok(Self::Csv),
            "html" => Ok(Self::Html),
            other => Err(format!(
                "unknown output format '{other}' (expected json, md, csv or html)"
            )),
        }
    }
}

/// Render an analysis result in the given format.
///
/// # Errors
///
/// Returns an error if the JSON renderer cannot serialize the result.
pub fn render(result: &AnalysisResult, format: ReportFormat) -> serde_json::Result<String> {
    match format {
        ReportFormat::Json => render_json(result),
        ReportFormat::Markdown => Ok(render_markdown(result)),
        ReportFormat::Csv => Ok(render_csv(result)),
        ReportFormat::Html => Ok(render_html(result)),
    }
}

/// Anomaly sections in output order: heading and the rules it lists.
fn anomaly_sections(result: &AnalysisResult) -> [(&'static str, &[RuleRef]); 3] {
    [
        ("Rules with Missing Categories", result.missing_categories.as_slice()),
        ("Rules with Duplicate Titles", result.duplicate_titles.as_slice()),
        ("Rules with Empty Contents", result.empty_contents.as_slice()),
    ]
}

fn summary_lines(result: &AnalysisResult) -> [(&'static str, usize); 4] {
    [
        ("Total Rules", result.total_rules),
        ("Missing Categories", result.missing_categories.len()),
        ("Duplicate Titles", result.duplicate_titles.len()),
        ("Empty Contents", result.empty_contents.len()),
    ]
}

/// Full structural dump with 2-space indentation, plugin fields included.
///
/// # Errors
///
/// Returns an error if serialization fails; no partial report is produced.
pub fn render_json(result: &AnalysisResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

/// Markdown report: summary, category table, one section per non-empty anomaly list.
#[must_use]
pub fn render_markdown(result: &AnalysisResult) -> String {
    let mut md = String::from("# Rulebase Analysis\n\n");
    for (label, count) in summary_lines(result) {
        let _ = writeln!(md, "- {label}: **{count}**");
    }
    md.push_str("\n## Category Stats\n\n| Category | Count |\n|---|---|\n");
    for (category, count) in result.category_stats.iter() {
        let _ = writeln!(md, "| {} | {count} |", escape_md_cell(category));
    }

    if result.anomalies_count() > 0 {
        md.push_str("\n## Details\n");
        for (heading, rules) in anomaly_sections(result) {
            if rules.is_empty() {
                continue;
            }
            let _ = writeln!(md, "\n### {heading}\n");
            for rule in rules {
                let _ = writeln!(
                    md,
                    "- [{}] {}",
                    single_line(&rule.id),
                    single_line(&rule.title)
                );
            }
        }
    }

    md
}

/// `Category,Count` rows; anomaly lists and plugin fields are not represented.
#[must_use]
pub fn render_csv(result: &AnalysisResult) -> String {
    let mut csv = String::from("Category,Count\n");
    for (category, count) in result.category_stats.iter() {
        let _ = writeln!(csv, "\"{}\",{count}", category.replace('"', "\"\""));
    }
    csv
}

/// HTML fragment with the same structure as the Markdown report.
#[must_use]
pub fn render_html(result: &AnalysisResult) -> String {
    let mut html = String::from("<h1>Rulebase Analysis</h1>\n<ul>\n");
    for (label, count) in summary_lines(result) {
        let _ = writeln!(html, "<li>{label}: <b>{count}</b></li>");
    }
    html.push_str("</ul>\n<h2>Category Stats</h2>\n<table border=\"1\">\n");
    html.push_str("<tr><th>Category</th><th>Count</th></tr>\n");
    for (category, count) in result.category_stats.iter() {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{count}</td></tr>",
            escape_html(category)
        );
    }
    html.push_str("</table>\n");

    for (heading, rules) in anomaly_sections(result) {
        if rules.is_empty() {
            continue;
        }
        let _ = writeln!(html, "<h3>{heading}</h3>\n<ul>");
        for rule in rules {
            let _ = writeln!(
                html,
                "<li>[{}] {}</li>",
                escape_html(&rule.id),
                escape_html(&rule.title)
            );
        }
        html.push_str("</ul>\n");
    }

    html
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

fn escape_md_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Write a validation outcome as JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_validation_json(
    outcome: &ValidationOutcome,
    writer: &mut dyn Write,
) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(outcome)?;
    writeln!(writer, "{json}")
}

/// Write a validation outcome as human-readable plain text.
///
/// Color/ANSI formatting is the responsibility of the caller.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_validation(
    outcome: &ValidationOutcome,
    schema_origin: &str,
    writer: &mut dyn Write,
) -> std::io::Result<()> {
    if outcome.valid {
        writeln!(writer, "Rulebase is valid (schema: {schema_origin}).")?;
        return Ok(());
    }

    writeln!(
        writer,
        "Rulebase validation failed: {} error(s) against schema {schema_origin}",
        outcome.errors_count()
    )?;
    for error in &outcome.errors {
        writeln!(writer, "  {}", error.format_human_readable())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::analyze_rules;
    use crate::error::ValidationError;
    use crate::rule::Rule;
    use serde_json::json;
    use std::rc::Rc;

    fn sample() -> AnalysisResult {
        let rules = vec![
            Rc::new(Rule::new("1", "A").with_category("Cat1").with_content("foo")),
            Rc::new(Rule::new("2", "B").with_category("").with_content("bar")),
            Rc::new(Rule::new("3", "A").with_category("Cat1").with_content("")),
            Rc::new(Rule::new("4", "C").with_category("Cat2").with_content("baz")),
        ];
        analyze_rules(&rules)
    }

    fn clean() -> AnalysisResult {
        let rules = vec![Rc::new(
            Rule::new("1", "A").with_category("Cat1").with_content("foo"),
        )];
        analyze_rules(&rules)
    }

    #[test]
    fn test_report_format_parsing() {
        assert_eq!("MD".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert_eq!("html".parse::<ReportFormat>().unwrap(), ReportFormat::Html);
        assert!("xml".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_json_uses_two_space_indent() {
        let json = render_json(&sample()).unwrap();
        assert!(json.starts_with("{\n  \"totalRules\": 4,"), "got: {json}");
    }

    #[test]
    fn test_markdown_report() {
        let md = render_markdown(&sample());
        let expected = "\
# Rulebase Analysis

- Total Rules: **4**
- Missing Categories: **1**
- Duplicate Titles: **2**
- Empty Contents: **1**

## Category Stats

| Category | Count |
|---|---|
| Cat1 | 2 |
| undefined | 1 |
| Cat2 | 1 |

## Details

### Rules with Missing Categories

- [2] B

### Rules with Duplicate Titles

- [1] A
- [3] A

### Rules with Empty Contents

- [3] A
";
        assert_eq!(md, expected);
    }

    #[test]
    fn test_markdown_omits_empty_sections() {
        let md = render_markdown(&clean());
        assert!(!md.contains("## Details"));
        assert!(!md.contains("###"));
        assert!(md.contains("| Cat1 | 1 |"));
    }

    #[test]
    fn test_markdown_list_items_stay_on_one_line() {
        // No content, so the rule is listed under empty contents.
        let rules = vec![Rc::new(
            Rule::new("r\n1", "Line one\n- [x] injected").with_category("c"),
        )];
        let md = render_markdown(&analyze_rules(&rules));
        assert!(md.contains("\n- [r 1] Line one - [x] injected\n"), "got: {md}");
        assert!(!md.contains("\n- [x] injected"));
    }

    #[test]
    fn test_csv_report() {
        assert_eq!(
            render_csv(&sample()),
            "Category,Count\n\"Cat1\",2\n\"undefined\",1\n\"Cat2\",1\n"
        );
    }

    #[test]
    fn test_csv_escapes_quotes() {
        let rules = vec![Rc::new(Rule::new("1", "A").with_category("say \"hi\""))];
        let csv = render_csv(&analyze_rules(&rules));
        assert!(csv.contains("\"say \"\"hi\"\"\",1"), "got: {csv}");
    }

    #[test]
    fn test_html_report_sections() {
        let html = render_html(&sample());
        assert!(html.starts_with("<h1>Rulebase Analysis</h1>"));
        assert!(html.contains("<li>Total Rules: <b>4</b></li>"));
        assert!(html.contains("<tr><td>Cat1</td><td>2</td></tr>"));
        assert!(html.contains("<h3>Rules with Duplicate Titles</h3>\n<ul>\n<li>[1] A</li>\n<li>[3] A</li>\n</ul>"));
        assert!(!render_html(&clean()).contains("<h3>"));
    }

    #[test]
    fn test_html_escapes_text() {
        // No content, so the rule is listed under empty contents.
        let rules = vec![Rc::new(Rule::new("1", "<script>").with_category("a&b"))];
        let html = render_html(&analyze_rules(&rules));
        assert!(html.contains("<td>a&amp;b</td>"));
        assert!(html.contains("[1] &lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_plugin_fields_only_in_json() {
        let mut fields = serde_json::Map::new();
        fields.insert("conflicts".to_owned(), json!([{"rule1": "1", "rule2": "3"}]));
        let result = sample().with_extensions("test", fields);

        let json: serde_json::Value =
            serde_json::from_str(&render(&result, ReportFormat::Json).unwrap()).unwrap();
        assert_eq!(json["conflicts"][0]["rule1"], "1");
        for format in [ReportFormat::Csv, ReportFormat::Markdown, ReportFormat::Html] {
            assert!(!render(&result, format).unwrap().contains("conflicts"));
        }
    }

    #[test]
    fn test_write_validation_human() {
        let outcome = ValidationOutcome::from_errors(vec![ValidationError {
            instance_path: "/0".to_owned(),
            schema_path: "/items/required".to_owned(),
            message: "\"id\" is a required property".to_owned(),
        }]);
        let mut buf = Vec::new();
        write_validation(&outcome, "rule-schema.json", &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("1 error(s)"));
        assert!(text.contains("/0: \"id\" is a required property"));
    }

    #[test]
    fn test_write_validation_json_valid() {
        let mut buf = Vec::new();
        write_validation_json(&ValidationOutcome::from_errors(vec![]), &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value, json!({"valid": true}));
    }
}
