//! Rule-based audit through axe-core
//!
//! The axe source is read once per suite and injected into every page before
//! navigation, the same way the web-vitals script is. Whether the engine is
//! usable is decided once per page by [`AxeAuditor::detect`]; afterwards the
//! audit takes one of two explicit paths:
//!
//! - [`AuditCapability::Available`]: run axe with the filtered rule selection
//! - [`AuditCapability::Unavailable`]: log a warning and check that the page
//!   has a non-empty title
//!
//! # Example
//!
//! ```no_run
//! use a11y_core::AuditRequest;
//! use a11y_harness::audit::{AxeAuditor, AxeSource};
//! use a11y_harness::session::PageSession;
//! use chromiumoxide::Page;
//!
//! async fn example(page: Page) -> anyhow::Result<()> {
//!     let auditor = AxeAuditor::new(AxeSource::from_file("axe.min.js"));
//!     auditor.prepare(&page).await?;
//!     page.goto("https://example.com").await?;
//!
//!     let session = PageSession::new(page);
//!     let capability = auditor.detect(&session).await;
//!     let outcome = auditor.audit(&session, &capability, &AuditRequest::default()).await?;
//!     println!("{} violations", outcome.violations().len());
//!     Ok(())
//! }
//! ```

#![allow(async_fn_in_trait)]

use a11y_core::{AuditRequest, SoftAssertions};
use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::page::AccessibilityProbe;

/// axe-core source text, shared by every page of a run
#[derive(Debug, Clone)]
pub struct AxeSource(Arc<str>);

impl AxeSource {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read axe-core script: {}", path.display()))?;
        Ok(Self::from_inline(source))
    }

    pub fn from_inline(source: impl Into<String>) -> Self {
        Self(Arc::from(source.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether the audit engine can run on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditCapability {
    Available,
    Unavailable { reason: String },
}

impl AuditCapability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// One axe violation; everything besides the id and impact is kept verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxeViolation {
    pub id: String,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl AxeViolation {
    pub fn help(&self) -> Option<&str> {
        self.details.get("help").and_then(Value::as_str)
    }

    /// Number of DOM nodes the violation was reported for
    pub fn node_count(&self) -> usize {
        self.details
            .get("nodes")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditOutcome {
    Completed {
        violations: Vec<AxeViolation>,
    },
    Fallback {
        reason: String,
        title: String,
        title_present: bool,
    },
}

impl AuditOutcome {
    /// Violations of a completed audit; empty for the fallback
    pub fn violations(&self) -> &[AxeViolation] {
        match self {
            Self::Completed { violations } => violations,
            Self::Fallback { .. } => &[],
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// Record a soft failure when the outcome breaks the page thresholds
    pub fn assert_outcome(&self, max_violations: usize, soft: &mut SoftAssertions) {
        match self {
            Self::Completed { violations } => {
                soft.check("audit", violations.len() <= max_violations, || {
                    let ids: Vec<&str> = violations.iter().map(|v| v.id.as_str()).collect();
                    format!(
                        "{} violations (allowed {}): {}",
                        violations.len(),
                        max_violations,
                        ids.join(", ")
                    )
                });
            }
            Self::Fallback { title_present, .. } => {
                soft.check("audit", *title_present, || {
                    "audit engine unavailable and page has no title".to_string()
                });
            }
        }
    }
}

/// Pages able to host the audit engine
pub trait AxeHost: AccessibilityProbe {
    /// Whether `axe.run` is callable in the current document
    async fn axe_loaded(&self) -> Result<bool>;

    async fn run_axe(&self, options: &Value) -> Result<Vec<AxeViolation>>;
}

/// Options object passed as the second argument of `axe.run`
///
/// Explicit rules take precedence over tags. Excluded rules are disabled in
/// either mode so tag expansion cannot bring them back.
pub fn axe_run_options(request: &AuditRequest) -> Value {
    let mut options = Map::new();

    if !request.rules.is_empty() {
        options.insert(
            "runOnly".to_string(),
            json!({ "type": "rule", "values": request.rules }),
        );
    } else if !request.tags.is_empty() {
        options.insert(
            "runOnly".to_string(),
            json!({ "type": "tag", "values": request.tags }),
        );
    }

    if !request.disabled_rules.is_empty() {
        let disabled: Map<String, Value> = request
            .disabled_rules
            .iter()
            .map(|id| (id.clone(), json!({ "enabled": false })))
            .collect();
        options.insert("rules".to_string(), Value::Object(disabled));
    }

    Value::Object(options)
}

pub struct AxeAuditor {
    source: std::result::Result<AxeSource, String>,
}

impl AxeAuditor {
    /// Keep the load error as the reason every page falls back
    pub fn new(source: Result<AxeSource>) -> Self {
        Self {
            source: source.map_err(|e| format!("{:#}", e)),
        }
    }

    /// Auditor whose pages always take the fallback path
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            source: Err(reason.into()),
        }
    }

    /// Build from the configured script path, falling back when none is set
    pub fn from_script_path(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::new(AxeSource::from_file(path)),
            None => Self::unavailable("no axe-core script configured"),
        }
    }

    /// Inject axe into every document the page loads from now on
    ///
    /// Must be called before navigation.
    #[instrument(skip(self, page))]
    pub async fn prepare(&self, page: &Page) -> Result<()> {
        let Ok(source) = &self.source else {
            return Ok(());
        };
        debug!("Injecting axe-core into page");
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
            source.as_str().to_string(),
        ))
        .await
        .context("Failed to inject axe-core script")?;
        Ok(())
    }

    pub async fn detect<H: AxeHost>(&self, host: &H) -> AuditCapability {
        if let Err(reason) = &self.source {
            return AuditCapability::Unavailable {
                reason: reason.clone(),
            };
        }
        match host.axe_loaded().await {
            Ok(true) => AuditCapability::Available,
            Ok(false) => AuditCapability::Unavailable {
                reason: "axe-core did not load in the page".to_string(),
            },
            Err(e) => AuditCapability::Unavailable {
                reason: format!("axe-core detection failed: {:#}", e),
            },
        }
    }

    #[instrument(skip_all)]
    pub async fn audit<H: AxeHost>(
        &self,
        host: &H,
        capability: &AuditCapability,
        request: &AuditRequest,
    ) -> Result<AuditOutcome> {
        match capability {
            AuditCapability::Available => {
                let options = axe_run_options(request);
                debug!(%options, "Running axe");
                let violations = host.run_axe(&options).await.context("axe.run failed")?;
                debug!(count = violations.len(), "Audit completed");
                Ok(AuditOutcome::Completed { violations })
            }
            AuditCapability::Unavailable { reason } => {
                warn!("Audit engine unavailable, using title check: {}", reason);
                let title = host.title().await.context("Failed to read page title")?;
                Ok(AuditOutcome::Fallback {
                    reason: reason.clone(),
                    title_present: !title.trim().is_empty(),
                    title,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a11y_core::DomSnapshot;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    struct FakeHost {
        title: String,
        loaded: bool,
        violations: Vec<AxeViolation>,
        last_options: RefCell<Option<Value>>,
    }

    impl FakeHost {
        fn new(title: &str, loaded: bool) -> Self {
            Self {
                title: title.to_string(),
                loaded,
                violations: Vec::new(),
                last_options: RefCell::new(None),
            }
        }
    }

    impl AccessibilityProbe for FakeHost {
        async fn snapshot(&self) -> Result<DomSnapshot> {
            Ok(DomSnapshot::default())
        }

        async fn title(&self) -> Result<String> {
            Ok(self.title.clone())
        }
    }

    impl AxeHost for FakeHost {
        async fn axe_loaded(&self) -> Result<bool> {
            Ok(self.loaded)
        }

        async fn run_axe(&self, options: &Value) -> Result<Vec<AxeViolation>> {
            *self.last_options.borrow_mut() = Some(options.clone());
            Ok(self.violations.clone())
        }
    }

    fn violation(id: &str) -> AxeViolation {
        serde_json::from_value(json!({
            "id": id,
            "impact": "serious",
            "help": "Images must have alternate text",
            "nodes": [{"html": "<img src=a.png>"}, {"html": "<img src=b.png>"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_rule_mode_options() {
        let request = AuditRequest {
            tags: vec!["wcag2a".to_string()],
            rules: vec!["image-alt".to_string(), "label".to_string()],
            disabled_rules: vec!["region".to_string()],
        };
        assert_eq!(
            axe_run_options(&request),
            json!({
                "runOnly": {"type": "rule", "values": ["image-alt", "label"]},
                "rules": {"region": {"enabled": false}}
            })
        );
    }

    #[test]
    fn test_tag_mode_options() {
        let request = AuditRequest {
            tags: vec!["wcag2a".to_string(), "wcag2aa".to_string()],
            rules: Vec::new(),
            disabled_rules: vec!["color-contrast".to_string()],
        };
        assert_eq!(
            axe_run_options(&request),
            json!({
                "runOnly": {"type": "tag", "values": ["wcag2a", "wcag2aa"]},
                "rules": {"color-contrast": {"enabled": false}}
            })
        );
    }

    #[test]
    fn test_empty_request_runs_everything() {
        assert_eq!(axe_run_options(&AuditRequest::default()), json!({}));
    }

    #[test]
    fn test_violation_keeps_details() {
        let v = violation("image-alt");
        assert_eq!(v.impact.as_deref(), Some("serious"));
        assert_eq!(v.help(), Some("Images must have alternate text"));
        assert_eq!(v.node_count(), 2);

        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["nodes"][1]["html"], "<img src=b.png>");
    }

    #[tokio::test]
    async fn test_missing_source_is_unavailable() {
        let auditor = AxeAuditor::from_script_path(None);
        let capability = auditor.detect(&FakeHost::new("Home", true)).await;
        assert!(!capability.is_available());
    }

    #[tokio::test]
    async fn test_unreadable_source_reason_is_kept() {
        let auditor = AxeAuditor::from_script_path(Some(Path::new("/nonexistent/axe.min.js")));
        match auditor.detect(&FakeHost::new("Home", true)).await {
            AuditCapability::Unavailable { reason } => {
                assert!(reason.contains("Failed to read axe-core script"));
            }
            other => panic!("expected unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_engine_not_loaded_is_unavailable() {
        let auditor = AxeAuditor::new(Ok(AxeSource::from_inline("/* axe */")));
        let capability = auditor.detect(&FakeHost::new("Home", false)).await;
        assert!(!capability.is_available());
    }

    #[tokio::test]
    async fn test_completed_audit_forwards_options() {
        let auditor = AxeAuditor::new(Ok(AxeSource::from_inline("/* axe */")));
        let mut host = FakeHost::new("Home", true);
        host.violations = vec![violation("image-alt")];

        let capability = auditor.detect(&host).await;
        assert_eq!(capability, AuditCapability::Available);

        let request = AuditRequest {
            tags: vec!["wcag2a".to_string()],
            ..AuditRequest::default()
        };
        let outcome = auditor.audit(&host, &capability, &request).await.unwrap();

        assert_eq!(outcome.violations().len(), 1);
        assert!(!outcome.is_fallback());
        assert_eq!(
            host.last_options.borrow().clone().unwrap(),
            json!({"runOnly": {"type": "tag", "values": ["wcag2a"]}})
        );
    }

    #[tokio::test]
    async fn test_fallback_checks_title() {
        let auditor = AxeAuditor::unavailable("offline");
        let host = FakeHost::new("  ", true);
        let capability = auditor.detect(&host).await;
        let outcome = auditor
            .audit(&host, &capability, &AuditRequest::default())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            AuditOutcome::Fallback {
                reason: "offline".to_string(),
                title: "  ".to_string(),
                title_present: false,
            }
        );
        assert!(outcome.violations().is_empty());
        assert!(host.last_options.borrow().is_none());

        let mut soft = SoftAssertions::new();
        outcome.assert_outcome(0, &mut soft);
        assert_eq!(soft.failures().len(), 1);
        assert_eq!(soft.failures()[0].category, "audit");
    }

    #[test]
    fn test_violation_threshold() {
        let outcome = AuditOutcome::Completed {
            violations: vec![violation("image-alt"), violation("label")],
        };

        let mut soft = SoftAssertions::new();
        outcome.assert_outcome(2, &mut soft);
        assert!(soft.is_clean());

        outcome.assert_outcome(1, &mut soft);
        assert_eq!(
            soft.failures()[0].message,
            "2 violations (allowed 1): image-alt, label"
        );
    }
}
