//! Interaction probing
//!
//! Clicks a handful of buttons and types into a handful of text inputs so that
//! handlers which only throw on interaction show up in the client-error
//! buckets. Every per-element failure is swallowed.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::page::{InteractionDriver, InteractionKind};

/// Text typed into fillable inputs
pub const PROBE_TEXT: &str = "a11y probe";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub skipped: usize,
}

#[instrument(skip(driver))]
pub async fn exercise_page<D: InteractionDriver>(driver: &D, max_per_kind: usize) -> InteractionSummary {
    let mut summary = InteractionSummary::default();
    if max_per_kind == 0 {
        return summary;
    }

    let targets = match driver.interaction_targets(max_per_kind).await {
        Ok(targets) => targets,
        Err(e) => {
            debug!("Could not collect interaction targets: {}", e);
            return summary;
        }
    };

    for target in targets {
        summary.attempted += 1;
        let result = match target.kind {
            InteractionKind::Click => driver.click(&target.selector).await,
            InteractionKind::Fill => driver.fill(&target.selector, PROBE_TEXT).await,
        };
        match result {
            Ok(()) => summary.succeeded += 1,
            Err(e) => {
                debug!(selector = %target.selector, "Interaction skipped: {}", e);
                summary.skipped += 1;
            }
        }
    }

    debug!(?summary, "Interaction probe finished");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::InteractionTarget;
    use anyhow::{anyhow, Result};
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeDriver {
        targets: Vec<InteractionTarget>,
        broken: Vec<String>,
        log: RefCell<Vec<String>>,
        requested: RefCell<Option<usize>>,
    }

    impl InteractionDriver for FakeDriver {
        async fn interaction_targets(&self, max_per_kind: usize) -> Result<Vec<InteractionTarget>> {
            *self.requested.borrow_mut() = Some(max_per_kind);
            Ok(self.targets.clone())
        }

        async fn click(&self, selector: &str) -> Result<()> {
            if self.broken.iter().any(|b| b == selector) {
                return Err(anyhow!("element detached"));
            }
            self.log.borrow_mut().push(format!("click {}", selector));
            Ok(())
        }

        async fn fill(&self, selector: &str, text: &str) -> Result<()> {
            self.log.borrow_mut().push(format!("fill {} {}", selector, text));
            Ok(())
        }
    }

    fn target(selector: &str, kind: InteractionKind) -> InteractionTarget {
        InteractionTarget {
            selector: selector.to_string(),
            kind,
        }
    }

    #[tokio::test]
    async fn test_failures_are_skipped() {
        let driver = FakeDriver {
            targets: vec![
                target("#save", InteractionKind::Click),
                target("#gone", InteractionKind::Click),
                target("#name", InteractionKind::Fill),
            ],
            broken: vec!["#gone".to_string()],
            ..FakeDriver::default()
        };

        let summary = exercise_page(&driver, 5).await;

        assert_eq!(
            summary,
            InteractionSummary {
                attempted: 3,
                succeeded: 2,
                skipped: 1,
            }
        );
        assert_eq!(
            driver.log.borrow().as_slice(),
            &["click #save".to_string(), "fill #name a11y probe".to_string()]
        );
        assert_eq!(*driver.requested.borrow(), Some(5));
    }

    #[tokio::test]
    async fn test_zero_budget_does_nothing() {
        let driver = FakeDriver {
            targets: vec![target("#save", InteractionKind::Click)],
            ..FakeDriver::default()
        };
        assert_eq!(exercise_page(&driver, 0).await, InteractionSummary::default());
        assert!(driver.requested.borrow().is_none());
    }

    #[tokio::test]
    async fn test_target_scan_failure_is_ignored() {
        struct Broken;

        impl InteractionDriver for Broken {
            async fn interaction_targets(&self, _: usize) -> Result<Vec<InteractionTarget>> {
                Err(anyhow!("execution context destroyed"))
            }

            async fn click(&self, _: &str) -> Result<()> {
                unreachable!()
            }

            async fn fill(&self, _: &str, _: &str) -> Result<()> {
                unreachable!()
            }
        }

        assert_eq!(exercise_page(&Broken, 5).await, InteractionSummary::default());
    }
}
