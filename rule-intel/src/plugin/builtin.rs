//! Plugins that ship with the crate.

use serde::Serialize;
use serde_json::Value;

use super::{AnalysisPlugin, PluginError};
use crate::report::AnalysisResult;
use crate::rule::RuleRef;

/// Flags pairs of rules in one category where one allows what the other forbids.
///
/// A pair `(a, b)` of rules with distinct ids conflicts when both have
/// non-empty content, `a` mentions "allow" and `b` mentions "forbid"
/// (case-insensitive). Emits `conflicts: [{rule1, rule2, category}]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictCheckPlugin;

#[derive(Serialize)]
struct Conflict<'a> {
    rule1: &'a str,
    rule2: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
}

fn mentions(content: Option<&str>, word: &str) -> bool {
    content.is_some_and(|c| !c.is_empty() && c.to_lowercase().contains(word))
}

impl AnalysisPlugin for ConflictCheckPlugin {
    fn name(&self) -> &str {
        "conflict-check"
    }

    fn description(&self) -> &str {
        "pairs of rules in one category where one allows and the other forbids"
    }

    fn analyze(
        &self,
        rules: &[RuleRef],
        _base: &AnalysisResult,
    ) -> Result<Option<Value>, PluginError> {
        let mut conflicts = Vec::new();
        for r1 in rules {
            if !mentions(r1.content.as_deref(), "allow") {
                continue;
            }
            for r2 in rules {
                if r1.id != r2.id
                    && r1.category == r2.category
                    && mentions(r2.content.as_deref(), "forbid")
                {
                    conflicts.push(Conflict {
                        rule1: &r1.id,
                        rule2: &r2.id,
                        category: r1.category.as_deref(),
                    });
                }
            }
        }

        let conflicts = serde_json::to_value(conflicts)
            .map_err(|e| PluginError::Execution(e.to_string()))?;
        Ok(Some(serde_json::json!({ "conflicts": conflicts })))
    }
}

/// Counts rules whose `status` is `"deprecated"`.
///
/// Emits `deprecatedCount` and `deprecatedRuleIds`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeprecatedRulesPlugin;

impl AnalysisPlugin for DeprecatedRulesPlugin {
    fn name(&self) -> &str {
        "deprecated"
    }

    fn description(&self) -> &str {
        "count and list rules with status 'deprecated'"
    }

    fn analyze(
        &self,
        rules: &[RuleRef],
        _base: &AnalysisResult,
    ) -> Result<Option<Value>, PluginError> {
        let ids: Vec<&str> = rules
            .iter()
            .filter(|r| r.status.as_deref() == Some("deprecated"))
            .map(|r| r.id.as_str())
            .collect();
        Ok(Some(serde_json::json!({
            "deprecatedCount": ids.len(),
            "deprecatedRuleIds": ids,
        })))
    }
}
