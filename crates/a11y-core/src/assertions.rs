//! Soft assertions
//!
//! A page run checks several independent categories (audit violations,
//! headings, images, ARIA, keyboard, client errors). Failures are recorded
//! instead of panicking so one run reports every failing category at once.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionFailure {
    pub category: String,
    pub message: String,
}

impl std::fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} soft assertion(s) failed:\n{}", .0.len(), render(.0))]
pub struct AssertionFailures(pub Vec<AssertionFailure>);

fn render(failures: &[AssertionFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("  - {}", f))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Default)]
pub struct SoftAssertions {
    failures: Vec<AssertionFailure>,
}

impl SoftAssertions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure when `condition` is false. Returns `condition`.
    pub fn check<F>(&mut self, category: &str, condition: bool, message: F) -> bool
    where
        F: FnOnce() -> String,
    {
        if !condition {
            self.failures.push(AssertionFailure {
                category: category.to_string(),
                message: message(),
            });
        }
        condition
    }

    /// Record a failure listing every entry when `items` is non-empty
    pub fn expect_empty(&mut self, category: &str, what: &str, items: &[String]) -> bool {
        self.check(category, items.is_empty(), || {
            format!("{} {}: {}", items.len(), what, items.join(" | "))
        })
    }

    pub fn fail(&mut self, category: &str, message: impl Into<String>) {
        self.failures.push(AssertionFailure {
            category: category.to_string(),
            message: message.into(),
        });
    }

    pub fn failures(&self) -> &[AssertionFailure] {
        &self.failures
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_failures(self) -> Vec<AssertionFailure> {
        self.failures
    }

    pub fn into_result(self) -> Result<(), AssertionFailures> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(AssertionFailures(self.failures))
        }
    }
}
