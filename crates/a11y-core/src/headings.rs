//! Heading hierarchy validation
//!
//! A page should open with a top-level-ish heading (h1-h3) and never jump more
//! than two levels between consecutive headings, in either direction.

use serde::{Deserialize, Serialize};

use crate::snapshot::Heading;

/// Highest level the first heading on a page may have
pub const MAX_FIRST_HEADING_LEVEL: u8 = 3;

/// Largest allowed level difference between consecutive headings
pub const MAX_LEVEL_JUMP: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingHierarchyResult {
    is_valid: bool,
    issues: Vec<String>,
}

impl HeadingHierarchyResult {
    fn from_issues(issues: Vec<String>) -> Self {
        Self {
            is_valid: issues.is_empty(),
            issues,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }
}

/// Check heading levels in document order
pub fn check_heading_hierarchy(headings: &[Heading]) -> HeadingHierarchyResult {
    let mut issues = Vec::new();

    if let Some(first) = headings.first() {
        if first.level() > MAX_FIRST_HEADING_LEVEL {
            issues.push(format!(
                "First heading is h{} ({}), expected h1-h{}",
                first.level(),
                describe(first),
                MAX_FIRST_HEADING_LEVEL
            ));
        }
    }

    for (index, pair) in headings.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.level().abs_diff(next.level()) > MAX_LEVEL_JUMP {
            issues.push(format!(
                "Heading level jumps from h{} to h{} (heading {}: {})",
                prev.level(),
                next.level(),
                index + 2,
                describe(next)
            ));
        }
    }

    HeadingHierarchyResult::from_issues(issues)
}

fn describe(heading: &Heading) -> String {
    if heading.text.is_empty() {
        "<empty>".to_string()
    } else {
        format!("{:?}", heading.text)
    }
}
