//! Accessibility heuristics over a DOM snapshot
//!
//! Pure, browser-free checks layered on top of a rule-based audit engine:
//!
//! - **Headings**: first heading h1-h3, no jump of more than two levels
//! - **Images**: share of non-decorative images without alt text
//! - **ARIA**: landmark count and role allow-list validation
//! - **Keyboard**: probe settings and the navigation verdict
//! - **Rules**: include/exclude filtering of audit rule ids
//! - **Client errors**: per-session console / exception / network buckets
//!
//! # Example
//!
//! ```
//! use a11y_core::{AccessibilityChecker, DomSnapshot, Heading};
//!
//! let snapshot = DomSnapshot {
//!     headings: vec![Heading::new(1, "Home").unwrap(), Heading::new(4, "Deep").unwrap()],
//!     ..DomSnapshot::default()
//! };
//! let report = AccessibilityChecker::new().check(&snapshot);
//! assert!(!report.headings.is_valid());
//! ```

pub mod aria;
pub mod assertions;
pub mod client_errors;
pub mod error;
pub mod headings;
pub mod images;
pub mod keyboard;
pub mod rules;
pub mod snapshot;

use serde::{Deserialize, Serialize};

pub use aria::{check_aria_implementation, AriaResult};
pub use assertions::{AssertionFailure, AssertionFailures, SoftAssertions};
pub use client_errors::{
    CaptureMode, ClientErrorBuckets, ConsoleLevel, ConsoleMessage, FailedRequest, PageError,
    SourceLocation,
};
pub use error::CoreError;
pub use headings::{check_heading_hierarchy, HeadingHierarchyResult};
pub use images::{check_image_accessibility, ImageAccessibilityResult};
pub use keyboard::{KeyboardNavResult, KeyboardProbeConfig};
pub use rules::{AuditRequest, RuleFilterConfig, RuleOverrides};
pub use snapshot::{DomSnapshot, Heading, ImageElement, StructuralElement};

/// Results of every snapshot-based check for one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicReport {
    pub headings: HeadingHierarchyResult,
    pub images: ImageAccessibilityResult,
    pub aria: AriaResult,
}

/// Pass/fail limits applied to a [`HeuristicReport`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicThresholds {
    /// Highest tolerated share of images without alt text (0-100)
    #[serde(default)]
    pub max_missing_alt_percentage: f64,
    /// Fail pages that expose no landmark at all
    #[serde(default)]
    pub require_landmarks: bool,
    /// Fail pages where no Tab transition was observed
    #[serde(default = "default_true")]
    pub require_keyboard_navigation: bool,
}

fn default_true() -> bool {
    true
}

impl HeuristicThresholds {
    pub fn validate(&self) -> Result<(), CoreError> {
        let value = self.max_missing_alt_percentage;
        if !(0.0..=100.0).contains(&value) {
            return Err(CoreError::InvalidPercentage {
                field: "max_missing_alt_percentage",
                value,
            });
        }
        Ok(())
    }
}

impl Default for HeuristicThresholds {
    fn default() -> Self {
        Self {
            max_missing_alt_percentage: 0.0,
            require_landmarks: false,
            require_keyboard_navigation: true,
        }
    }
}

/// Entry point for the snapshot-based checks
pub struct AccessibilityChecker;

impl AccessibilityChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, snapshot: &DomSnapshot) -> HeuristicReport {
        HeuristicReport {
            headings: check_heading_hierarchy(&snapshot.headings),
            images: check_image_accessibility(&snapshot.images),
            aria: check_aria_implementation(&snapshot.structural),
        }
    }

    /// Record a soft failure for every category that breaks `thresholds`
    pub fn assert_report(
        &self,
        report: &HeuristicReport,
        thresholds: &HeuristicThresholds,
        soft: &mut SoftAssertions,
    ) {
        soft.expect_empty("headings", "heading hierarchy issues", report.headings.issues());

        soft.check(
            "images",
            report.images.percentage_without_alt() <= thresholds.max_missing_alt_percentage,
            || {
                format!(
                    "{} of {} images lack alt text ({:.1}%, allowed {:.1}%)",
                    report.images.images_without_alt(),
                    report.images.total_images(),
                    report.images.percentage_without_alt(),
                    thresholds.max_missing_alt_percentage
                )
            },
        );

        soft.expect_empty("aria", "invalid ARIA roles", report.aria.issues());

        if thresholds.require_landmarks {
            soft.check("aria", report.aria.landmark_count() > 0, || {
                "page exposes no landmarks (main, nav, header, footer)".to_string()
            });
        }
    }

    pub fn assert_keyboard(
        &self,
        result: &KeyboardNavResult,
        thresholds: &HeuristicThresholds,
        soft: &mut SoftAssertions,
    ) {
        if thresholds.require_keyboard_navigation {
            soft.check("keyboard", result.success(), || {
                "no visible focus transition observed after pressing Tab".to_string()
            });
        }
    }
}

impl Default for AccessibilityChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> DomSnapshot {
        DomSnapshot {
            url: "https://example.com".to_string(),
            title: "Example".to_string(),
            headings: vec![
                Heading::new(1, "Home").unwrap(),
                Heading::new(2, "About").unwrap(),
            ],
            images: vec![ImageElement {
                alt: Some("logo".to_string()),
                role: None,
                src: Some("/logo.svg".to_string()),
            }],
            structural: vec![
                StructuralElement::new("main", None),
                StructuralElement::new("div", Some("button")),
            ],
            focusable_count: 3,
        }
    }

    #[test]
    fn test_clean_page_passes() {
        let checker = AccessibilityChecker::new();
        let report = checker.check(&snapshot());
        let mut soft = SoftAssertions::new();
        checker.assert_report(
            &report,
            &HeuristicThresholds {
                require_landmarks: true,
                ..HeuristicThresholds::default()
            },
            &mut soft,
        );
        assert!(soft.is_clean(), "{:?}", soft.failures());
    }

    #[test]
    fn test_every_category_reported() {
        let mut page = snapshot();
        page.headings.push(Heading::new(5, "Deep").unwrap());
        page.images.push(ImageElement::default());
        page.structural = vec![StructuralElement::new("div", Some("foo"))];

        let checker = AccessibilityChecker::new();
        let report = checker.check(&page);
        let mut soft = SoftAssertions::new();
        checker.assert_report(
            &report,
            &HeuristicThresholds {
                require_landmarks: true,
                ..HeuristicThresholds::default()
            },
            &mut soft,
        );
        checker.assert_keyboard(
            &KeyboardNavResult::from_count(0),
            &HeuristicThresholds::default(),
            &mut soft,
        );

        let categories: Vec<_> = soft.failures().iter().map(|f| f.category.clone()).collect();
        assert_eq!(
            categories,
            vec!["headings", "images", "aria", "aria", "keyboard"]
        );
    }

    #[test]
    fn test_alt_threshold_is_inclusive() {
        let mut page = snapshot();
        page.images.push(ImageElement::default());
        let checker = AccessibilityChecker::new();
        let report = checker.check(&page);

        let mut soft = SoftAssertions::new();
        checker.assert_report(
            &report,
            &HeuristicThresholds {
                max_missing_alt_percentage: 50.0,
                ..HeuristicThresholds::default()
            },
            &mut soft,
        );
        assert!(soft.is_clean());
    }

    #[test]
    fn test_keyboard_requirement_can_be_disabled() {
        let mut soft = SoftAssertions::new();
        AccessibilityChecker::new().assert_keyboard(
            &KeyboardNavResult::from_count(0),
            &HeuristicThresholds {
                require_keyboard_navigation: false,
                ..HeuristicThresholds::default()
            },
            &mut soft,
        );
        assert!(soft.is_clean());
    }

    #[test]
    fn test_threshold_percentage_is_validated() {
        assert!(HeuristicThresholds::default().validate().is_ok());
        let err = HeuristicThresholds {
            max_missing_alt_percentage: 150.0,
            ..HeuristicThresholds::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid percentage for max_missing_alt_percentage: 150 (expected 0-100)"
        );
        assert!(HeuristicThresholds {
            max_missing_alt_percentage: f64::NAN,
            ..HeuristicThresholds::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_check_is_idempotent() {
        let checker = AccessibilityChecker::new();
        let page = snapshot();
        assert_eq!(checker.check(&page), checker.check(&page));
    }
}
