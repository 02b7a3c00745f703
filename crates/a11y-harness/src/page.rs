//! Page capabilities
//!
//! A page under audit is composed from small capabilities instead of a page
//! object hierarchy: one value that can navigate, one that can inspect the DOM.
//! [`crate::session::PageSession`] implements every capability on top of a
//! chromiumoxide page; tests substitute in-memory fakes.

#![allow(async_fn_in_trait)]

use a11y_core::{AccessibilityChecker, DomSnapshot, HeuristicReport};
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, instrument};

/// Moves a page to a URL
pub trait Navigator {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Wait for a pending navigation to settle, e.g. a client-side redirect
    async fn wait_for_load(&self, timeout: Duration) -> Result<()>;
}

/// Read-only DOM inspection
pub trait AccessibilityProbe {
    async fn snapshot(&self) -> Result<DomSnapshot>;

    async fn title(&self) -> Result<String>;
}

/// Primitives needed by the keyboard-navigation probe
pub trait FocusDriver {
    async fn focusable_count(&self) -> Result<usize>;

    /// Focus the first focusable element; `false` when there is none
    async fn focus_first(&self) -> Result<bool>;

    async fn press_tab(&self) -> Result<()>;

    /// Whether the active element is something other than the body and is visible
    async fn has_visible_focus(&self) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Click,
    Fill,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionTarget {
    pub selector: String,
    pub kind: InteractionKind,
}

/// Best-effort element interaction used to shake out runtime errors
pub trait InteractionDriver {
    async fn interaction_targets(&self, max_per_kind: usize) -> Result<Vec<InteractionTarget>>;

    async fn click(&self, selector: &str) -> Result<()>;

    async fn fill(&self, selector: &str, text: &str) -> Result<()>;
}

/// A site page built from a navigator and a probe
pub struct SitePage<N, P> {
    navigator: N,
    probe: P,
}

impl<N: Navigator, P: AccessibilityProbe> SitePage<N, P> {
    pub fn new(navigator: N, probe: P) -> Self {
        Self { navigator, probe }
    }

    #[instrument(skip(self))]
    pub async fn open(&self, url: &str, timeout: Duration) -> Result<()> {
        self.navigator.goto(url, timeout).await?;
        self.navigator.wait_for_load(timeout).await
    }

    /// Snapshot the DOM and run every snapshot-based check
    pub async fn run_heuristics(
        &self,
        checker: &AccessibilityChecker,
    ) -> Result<(DomSnapshot, HeuristicReport)> {
        let snapshot = self.probe.snapshot().await?;
        debug!(
            headings = snapshot.headings.len(),
            images = snapshot.images.len(),
            structural = snapshot.structural.len(),
            "DOM snapshot taken"
        );
        let report = checker.check(&snapshot);
        Ok((snapshot, report))
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }
}
