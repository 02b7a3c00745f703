//! Audit rule selection
//!
//! Exclusions always win: a rule id listed in `exclude_rules` never reaches the
//! audit engine, even when it was explicitly included.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFilterConfig {
    pub tags: BTreeSet<String>,
    pub include_rules: Vec<String>,
    pub exclude_rules: BTreeSet<String>,
}

/// Per-invocation overrides; `None` keeps the configured default
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOverrides {
    pub tags: Option<Vec<String>>,
    pub include_rules: Option<Vec<String>>,
    pub exclude_rules: Option<Vec<String>>,
}

/// The filtered selection handed to the audit engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRequest {
    pub tags: Vec<String>,
    pub rules: Vec<String>,
    /// Exclusions are forwarded too so the engine can disable them in tag mode
    pub disabled_rules: Vec<String>,
}

impl RuleFilterConfig {
    pub fn from_defaults<T, R, E>(tags: T, baseline_rules: R, exclude_rules: E) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            include_rules: baseline_rules.into_iter().map(Into::into).collect(),
            exclude_rules: exclude_rules.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_overrides(&self, overrides: &RuleOverrides) -> Self {
        Self {
            tags: overrides
                .tags
                .as_ref()
                .map(|t| t.iter().cloned().collect())
                .unwrap_or_else(|| self.tags.clone()),
            include_rules: overrides
                .include_rules
                .clone()
                .unwrap_or_else(|| self.include_rules.clone()),
            exclude_rules: overrides
                .exclude_rules
                .as_ref()
                .map(|e| e.iter().cloned().collect())
                .unwrap_or_else(|| self.exclude_rules.clone()),
        }
    }

    /// `include_rules − exclude_rules`, in include order, first occurrence wins
    pub fn effective_rules(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut effective = Vec::new();
        for rule in &self.include_rules {
            if self.exclude_rules.contains(rule) {
                continue;
            }
            if seen.insert(rule.as_str()) {
                effective.push(rule.clone());
            }
        }
        effective
    }

    pub fn to_request(&self) -> AuditRequest {
        AuditRequest {
            tags: self.tags.iter().cloned().collect(),
            rules: self.effective_rules(),
            disabled_rules: self.exclude_rules.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_exclude_removes_included_rule() {
        let filter = RuleFilterConfig::from_defaults(["wcag2a"], ["a", "b", "c"], ["b"]);
        assert_eq!(filter.effective_rules(), vec!["a", "c"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let filter =
            RuleFilterConfig::from_defaults(Vec::<String>::new(), ["a", "b", "a", "c"], ["c"]);
        assert_eq!(filter.effective_rules(), vec!["a", "b"]);
    }

    #[test]
    fn test_overrides_replace_defaults() {
        let filter = RuleFilterConfig::from_defaults(["wcag2a"], ["a", "b"], ["b"]);
        let overridden = filter.with_overrides(&RuleOverrides {
            tags: Some(vec!["wcag21aa".to_string()]),
            include_rules: Some(vec!["b".to_string(), "d".to_string()]),
            exclude_rules: None,
        });

        assert_eq!(overridden.tags.iter().collect::<Vec<_>>(), vec!["wcag21aa"]);
        // default exclusion still applies to an explicitly included rule
        assert_eq!(overridden.effective_rules(), vec!["d"]);
    }

    #[test]
    fn test_empty_overrides_are_identity() {
        let filter = RuleFilterConfig::from_defaults(["wcag2a", "wcag2aa"], ["a"], ["z"]);
        assert_eq!(filter.with_overrides(&RuleOverrides::default()), filter);
    }

    #[test]
    fn test_request_carries_tags_and_exclusions() {
        let filter = RuleFilterConfig::from_defaults(["wcag2aa", "wcag2a"], ["a", "b"], ["b"]);
        let request = filter.to_request();
        assert_eq!(request.tags, vec!["wcag2a", "wcag2aa"]);
        assert_eq!(request.rules, vec!["a"]);
        assert_eq!(request.disabled_rules, vec!["b"]);
    }

    proptest! {
        #[test]
        fn prop_effective_rules_never_contain_exclusions(
            include in prop::collection::vec("[a-e]", 0..12),
            exclude in prop::collection::vec("[a-e]", 0..5),
        ) {
            let filter = RuleFilterConfig::from_defaults(Vec::<String>::new(), include.clone(), exclude.clone());
            let effective = filter.effective_rules();

            for rule in &effective {
                prop_assert!(!exclude.contains(rule));
                prop_assert!(include.contains(rule));
            }

            // order follows first occurrence in the include list
            let positions: Vec<_> = effective
                .iter()
                .map(|r| include.iter().position(|i| i == r).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
