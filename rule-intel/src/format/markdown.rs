//! Markdown rulebase decoder.
//!
//! Rules are looked up in three places, first match wins:
//! 1. a `rules` array in the front-matter (`---` YAML or `+++` TOML),
//! 2. the body, when the whole body is a JSON array,
//! 3. the first fenced code block tagged `json` whose content is a JSON array.
//!
//! A document with none of these is an empty rulebase, not an error.

use serde_json::Value;

use crate::error::RulebaseError;
use crate::format::json::records_from_value;

/// Front-matter block kinds, keyed by their delimiter line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrontMatterKind {
    Yaml,
    Toml,
}

impl FrontMatterKind {
    fn from_delimiter(line: &str) -> Option<Self> {
        match line.trim_end() {
            "---" => Some(Self::Yaml),
            "+++" => Some(Self::Toml),
            _ => None,
        }
    }

    fn closes(self, line: &str) -> bool {
        let line = line.trim_end();
        match self {
            Self::Yaml => line == "---" || line == "...",
            Self::Toml => line == "+++",
        }
    }
}

/// Fenced code block tracking for the body scan.
#[derive(Debug, Clone, PartialEq, Eq)]
enum MarkdownState {
    Prose,
    FencedBlock {
        is_json: bool,
        fence_char: char,
        opening_fence_len: usize,
    },
}

fn parse_fence(trimmed_line: &str) -> Option<(char, usize)> {
    let fence_char = match trimmed_line.as_bytes().first() {
        Some(b'`') => '`',
        Some(b'~') => '~',
        _ => return None,
    };

    let fence_len = trimmed_line
        .chars()
        .take_while(|&c| c == fence_char)
        .count();
    if fence_len >= 3 {
        Some((fence_char, fence_len))
    } else {
        None
    }
}

/// Split a document into its front-matter (if any) and body.
///
/// An opening delimiter without a matching closing one is not front-matter:
/// the whole document is then the body.
fn split_front_matter(content: &str) -> (Option<(FrontMatterKind, String)>, String) {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines();

    let Some(kind) = lines.next().and_then(FrontMatterKind::from_delimiter) else {
        return (None, content.to_owned());
    };

    let mut front = Vec::new();
    while let Some(line) = lines.next() {
        if kind.closes(line) {
            let body: Vec<&str> = lines.collect();
            return (Some((kind, front.join("\n"))), body.join("\n"));
        }
        front.push(line);
    }

    (None, content.to_owned())
}

/// Content of the first fenced block whose info string is `json`.
fn first_json_block(body: &str) -> Option<String> {
    let mut state = MarkdownState::Prose;
    let mut block: Vec<&str> = Vec::new();

    for line in body.lines() {
        let trimmed_line = line.trim_start();
        if let Some((fence_char, fence_len)) = parse_fence(trimmed_line) {
            match &state {
                MarkdownState::Prose => {
                    let language = trimmed_line[fence_len..].trim().to_lowercase();
                    state = MarkdownState::FencedBlock {
                        is_json: language == "json",
                        fence_char,
                        opening_fence_len: fence_len,
                    };
                    continue;
                }
                MarkdownState::FencedBlock {
                    is_json,
                    fence_char: open_fence_char,
                    opening_fence_len,
                } => {
                    // Closing fence must match the opening char and be at least as long.
                    if fence_char == *open_fence_char && fence_len >= *opening_fence_len {
                        if *is_json {
                            return Some(block.join("\n"));
                        }
                        state = MarkdownState::Prose;
                        continue;
                    }
                }
            }
        }

        if let MarkdownState::FencedBlock { is_json: true, .. } = state {
            block.push(line);
        }
    }

    None
}

fn parse_front_matter(kind: FrontMatterKind, front: &str) -> Result<Value, RulebaseError> {
    match kind {
        FrontMatterKind::Yaml => super::yaml::parse_yaml(front),
        FrontMatterKind::Toml => super::toml::parse_toml(front),
    }
}

fn json_array(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(value @ Value::Array(_)) => Some(value),
        _ => None,
    }
}

/// Decode a Markdown rulebase.
///
/// # Errors
///
/// Returns [`RulebaseError::Decode`] if the front-matter is malformed or the
/// rule array found holds non-object elements, and
/// [`RulebaseError::CapabilityUnavailable`] when the `markdown` feature (or
/// the feature for the front-matter language) is disabled.
pub fn decode_markdown(content: &str) -> Result<Vec<Value>, RulebaseError> {
    if !cfg!(feature = "markdown") {
        return Err(RulebaseError::CapabilityUnavailable {
            format: "markdown".to_owned(),
            feature: "markdown",
        });
    }

    let (front_matter, body) = split_front_matter(content);

    if let Some((kind, front)) = front_matter {
        let front = parse_front_matter(kind, &front).map_err(|e| match e {
            RulebaseError::Decode { message, .. } => {
                RulebaseError::decode("markdown", format!("invalid front-matter: {message}"))
            }
            other => other,
        })?;
        if let Some(rules @ Value::Array(_)) = front.get("rules") {
            return records_from_value(rules.clone(), "markdown");
        }
    }

    if let Some(rules) = json_array(&body) {
        return records_from_value(rules, "markdown");
    }

    if let Some(rules) = first_json_block(&body).as_deref().and_then(json_array) {
        return records_from_value(rules, "markdown");
    }

    tracing::debug!("no rules found in markdown document");
    Ok(Vec::new())
}

#[cfg(all(test, feature = "markdown"))]
mod tests {
    use super::*;

    #[test]
    fn test_split_front_matter() {
        let (front, body) = split_front_matter("---\ntitle: x\n---\n# Heading\n");
        let (kind, text) = front.unwrap();
        assert_eq!(kind, FrontMatterKind::Yaml);
        assert_eq!(text, "title: x");
        assert_eq!(body, "# Heading");
    }

    #[test]
    fn test_unclosed_front_matter_is_body() {
        let (front, body) = split_front_matter("---\ntitle: x\n");
        assert!(front.is_none());
        assert!(body.starts_with("---"));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_yaml_front_matter_rules() {
        let content = "---\nrules:\n  - id: '1'\n    title: A\n  - id: '2'\n    title: B\n---\n# Rules\n";
        let records = decode_markdown(content).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["title"], "B");
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_front_matter_rules() {
        let content = "+++\n[[rules]]\nid = \"1\"\ntitle = \"A\"\n+++\nBody text\n";
        let records = decode_markdown(content).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], "1");
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_front_matter_without_rules_falls_back_to_body() {
        let content = "---\nauthor: me\n---\n[{\"id\": \"9\", \"title\": \"Z\"}]\n";
        let records = decode_markdown(content).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], "9");
    }

    #[test]
    fn test_body_json_array() {
        let records = decode_markdown("[{\"id\": \"1\", \"title\": \"A\"}]").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_fenced_json_block() {
        let content = "# Rules\n\n```sh\necho [1]\n```\n\nSome prose.\n\n```json\n[\n  {\"id\": \"1\", \"title\": \"A\"}\n]\n```\n";
        let records = decode_markdown(content).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["title"], "A");
    }

    #[test]
    fn test_no_rules_is_empty_not_error() {
        let records = decode_markdown("# Just a heading\n\nNothing here.\n").unwrap();
        assert!(records.is_empty());
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_malformed_front_matter_is_decode_error() {
        let err = decode_markdown("---\nrules: [unclosed\n---\n").unwrap_err();
        assert_eq!(err.kind(), "DecodeError");
        assert!(err.to_string().contains("invalid front-matter"), "got: {err}");
    }
}
