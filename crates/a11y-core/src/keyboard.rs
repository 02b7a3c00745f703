//! Keyboard-navigation probe settings and verdict
//!
//! The probe itself needs a live page and lives in the harness; this module
//! only owns the tunables and the result so both sides agree on the contract.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// CSS selector for elements reachable with the Tab key
pub const FOCUSABLE_SELECTOR: &str = "a[href], area[href], button:not([disabled]), \
input:not([disabled]):not([type=\"hidden\"]), select:not([disabled]), \
textarea:not([disabled]), summary, [contenteditable=\"true\"], \
[tabindex]:not([tabindex=\"-1\"])";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardProbeConfig {
    /// Upper bound on Tab presses (default: 5)
    pub max_elements: usize,
    /// Pause after each key press so focus styles can settle
    pub settle: Duration,
    /// How long to wait for a visibly focused element after each press
    pub focus_timeout: Duration,
}

impl Default for KeyboardProbeConfig {
    fn default() -> Self {
        Self {
            max_elements: 5,
            settle: Duration::from_millis(100),
            focus_timeout: Duration::from_millis(1000),
        }
    }
}

impl KeyboardProbeConfig {
    /// Number of Tab presses to attempt for a page with `focusable` elements
    pub fn presses_for(&self, focusable: usize) -> usize {
        focusable.min(self.max_elements)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardNavResult {
    success: bool,
    navigated_elements: usize,
}

impl KeyboardNavResult {
    pub fn from_count(navigated_elements: usize) -> Self {
        Self {
            success: navigated_elements > 0,
            navigated_elements,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn navigated_elements(&self) -> usize {
        self.navigated_elements
    }
}
