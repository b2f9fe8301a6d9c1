//! Anomaly detectors.
//!
//! Independent, side-effect-free passes over the filtered rulebase. Each
//! returns handles to the offending rules in rulebase order.

use std::collections::HashMap;
use std::rc::Rc;

use crate::report::{AnalysisResult, CategoryStats, UNDEFINED_CATEGORY};
use crate::rule::{RuleRef, is_blank};

/// Rules whose category is absent or trims to empty.
#[must_use]
pub fn find_missing_categories(rules: &[RuleRef]) -> Vec<RuleRef> {
    rules
        .iter()
        .filter(|rule| rule.has_blank_category())
        .map(Rc::clone)
        .collect()
}

/// Rules whose exact title (case-sensitive, untrimmed) is shared with at
/// least one other rule. Every member of each duplicate group is returned.
#[must_use]
pub fn find_duplicate_titles(rules: &[RuleRef]) -> Vec<RuleRef> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for rule in rules {
        *counts.entry(rule.title.as_str()).or_default() += 1;
    }
    rules
        .iter()
        .filter(|rule| counts.get(rule.title.as_str()).is_some_and(|&n| n > 1))
        .map(Rc::clone)
        .collect()
}

/// Rules whose content is absent or trims to empty.
#[must_use]
pub fn find_empty_contents(rules: &[RuleRef]) -> Vec<RuleRef> {
    rules
        .iter()
        .filter(|rule| rule.has_blank_content())
        .map(Rc::clone)
        .collect()
}

/// Rule count per category, with [`UNDEFINED_CATEGORY`] for absent or blank
/// categories.
#[must_use]
pub fn category_stats(rules: &[RuleRef]) -> CategoryStats {
    let mut stats = CategoryStats::default();
    for rule in rules {
        match rule.category.as_deref() {
            Some(label) if !is_blank(Some(label)) => stats.increment(label),
            _ => stats.increment(UNDEFINED_CATEGORY),
        }
    }
    stats
}

/// Run every detector and assemble the core analysis result.
#[must_use]
pub fn analyze_rules(rules: &[RuleRef]) -> AnalysisResult {
    let result = AnalysisResult {
        total_rules: rules.len(),
        missing_categories: find_missing_categories(rules),
        duplicate_titles: find_duplicate_titles(rules),
        empty_contents: find_empty_contents(rules),
        category_stats: category_stats(rules),
        extensions: serde_json::Map::new(),
    };
    tracing::debug!(
        total = result.total_rules,
        missing_categories = result.missing_categories.len(),
        duplicate_titles = result.duplicate_titles.len(),
        empty_contents = result.empty_contents.len(),
        "ran anomaly detectors"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    fn rulebase() -> Vec<RuleRef> {
        vec![
            Rc::new(Rule::new("1", "A").with_category("Cat1").with_content("foo")),
            Rc::new(Rule::new("2", "B").with_category("").with_content("bar")),
            Rc::new(Rule::new("3", "A").with_category("Cat1").with_content("")),
            Rc::new(Rule::new("4", "C").with_category("Cat2").with_content("baz")),
        ]
    }

    fn ids(rules: &[RuleRef]) -> Vec<&str> {
        rules.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_finds_missing_categories() {
        assert_eq!(ids(&find_missing_categories(&rulebase())), vec!["2"]);
    }

    #[test]
    fn test_whitespace_and_absent_categories_are_missing() {
        let rules = vec![
            Rc::new(Rule::new("1", "A").with_category("   ")),
            Rc::new(Rule::new("2", "B")),
            Rc::new(Rule::new("3", "C").with_category(" x ")),
        ];
        assert_eq!(ids(&find_missing_categories(&rules)), vec!["1", "2"]);
    }

    #[test]
    fn test_finds_duplicate_titles() {
        assert_eq!(ids(&find_duplicate_titles(&rulebase())), vec!["1", "3"]);
    }

    #[test]
    fn test_duplicate_titles_are_exact_and_group_inclusive() {
        let rules = vec![
            Rc::new(Rule::new("1", "Same")),
            Rc::new(Rule::new("2", "same")),
            Rc::new(Rule::new("3", "Same ")),
            Rc::new(Rule::new("4", "Same")),
            Rc::new(Rule::new("5", "Same").with_category("Other")),
        ];
        assert_eq!(ids(&find_duplicate_titles(&rules)), vec!["1", "4", "5"]);
    }

    #[test]
    fn test_finds_empty_contents() {
        assert_eq!(ids(&find_empty_contents(&rulebase())), vec!["3"]);
    }

    #[test]
    fn test_category_stats() {
        let stats = category_stats(&rulebase());
        assert_eq!(stats.get("Cat1"), Some(2));
        assert_eq!(stats.get("Cat2"), Some(1));
        assert_eq!(stats.get(UNDEFINED_CATEGORY), Some(1));
        assert_eq!(stats.len(), 3);
    }

    #[test]
    fn test_stats_sum_to_total() {
        let rules = rulebase();
        let result = analyze_rules(&rules);
        assert_eq!(result.total_rules, 4);
        assert_eq!(result.category_stats.total(), result.total_rules);
    }

    #[test]
    fn test_findings_share_rules_with_rulebase() {
        let rules = rulebase();
        let result = analyze_rules(&rules);
        assert!(Rc::ptr_eq(&result.missing_categories[0], &rules[1]));
        assert!(Rc::ptr_eq(&result.duplicate_titles[1], &rules[2]));
        assert!(Rc::ptr_eq(&result.empty_contents[0], &rules[2]));
    }

    #[test]
    fn test_empty_rulebase() {
        let result = analyze_rules(&[]);
        assert_eq!(result.total_rules, 0);
        assert!(result.category_stats.is_empty());
        assert_eq!(result.anomalies_count(), 0);
    }
}
