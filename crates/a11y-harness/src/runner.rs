//! Suite execution orchestration
//!
//! One browser instance, one page per URL. Pages are audited concurrently up
//! to `suite.parallel_contexts`; each page owns its capture buffers and nothing
//! mutable is shared between pages.
//!
//! Per page the steps are:
//!
//! ```text
//! new page ─▶ attach capture ─▶ inject axe ─▶ navigate
//!    ─▶ detect audit engine ─▶ snapshot heuristics ─▶ audit
//!    ─▶ keyboard probe ─▶ interactions (opt-in)
//!    ─▶ network quiescence ─▶ collect buckets ─▶ soft asserts ─▶ close
//! ```
//!
//! # Example
//!
//! ```no_run
//! use a11y_harness::{runner::SuiteRunner, SuiteConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = SuiteConfig::from_file("a11y.toml")?;
//! let runner = SuiteRunner::new(config.suite.headless).await?;
//! let results = runner.run(&config).await?;
//!
//! for page in &results.pages {
//!     println!("{}: {}", page.url, if page.passed { "PASS" } else { "FAIL" });
//! }
//! # Ok(())
//! # }
//! ```

use a11y_core::{
    AccessibilityChecker, AuditRequest, ClientErrorBuckets, HeuristicReport, KeyboardNavResult,
    KeyboardProbeConfig, RuleOverrides, SoftAssertions,
};
use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

use crate::audit::{AuditOutcome, AxeAuditor};
use crate::capture::ErrorCapture;
use crate::config::{BaselineRules, SiteList, SuiteConfig};
use crate::interact::{exercise_page, InteractionSummary};
use crate::keyboard::probe_keyboard_navigation;
use crate::page::SitePage;
use crate::session::PageSession;

/// Results from a complete suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResults {
    pub suite_name: String,
    /// RFC 3339 timestamp of the start of the run
    pub started_at: String,
    pub total_duration_ms: u64,
    /// One report per URL, in site-list order
    pub pages: Vec<PageReport>,
    pub passed: bool,
    /// Every page failure, prefixed with its URL
    pub failures: Vec<String>,
}

impl SuiteResults {
    pub fn from_pages(
        suite_name: impl Into<String>,
        started_at: String,
        total_duration_ms: u64,
        pages: Vec<PageReport>,
    ) -> Self {
        let failures: Vec<String> = pages
            .iter()
            .flat_map(|page| {
                page.failures
                    .iter()
                    .map(move |failure| format!("{}: {}", page.url, failure))
            })
            .collect();
        Self {
            suite_name: suite_name.into(),
            started_at,
            total_duration_ms,
            passed: pages.iter().all(|p| p.passed),
            pages,
            failures,
        }
    }

    pub fn failed_pages(&self) -> impl Iterator<Item = &PageReport> {
        self.pages.iter().filter(|p| !p.passed)
    }
}

/// Everything observed on one URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    pub url: String,
    pub title: Option<String>,
    /// `None` when the page never got far enough to be audited
    pub audit: Option<AuditOutcome>,
    pub heuristics: Option<HeuristicReport>,
    pub keyboard: Option<KeyboardNavResult>,
    pub interactions: Option<InteractionSummary>,
    pub client_errors: ClientErrorBuckets,
    pub duration_ms: u64,
    pub passed: bool,
    pub failures: Vec<String>,
}

impl PageReport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            audit: None,
            heuristics: None,
            keyboard: None,
            interactions: None,
            client_errors: ClientErrorBuckets::default(),
            duration_ms: 0,
            passed: false,
            failures: Vec::new(),
        }
    }

    /// Settle pass/fail from the collected soft assertions
    pub fn conclude(&mut self, soft: SoftAssertions, started: Instant) {
        self.failures = soft
            .into_failures()
            .iter()
            .map(ToString::to_string)
            .collect();
        self.passed = self.failures.is_empty();
        self.duration_ms = started.elapsed().as_millis() as u64;
    }
}

/// Read-only state shared by every page of a run
struct RunContext<'a> {
    config: &'a SuiteConfig,
    request: AuditRequest,
    auditor: AxeAuditor,
    checker: AccessibilityChecker,
    keyboard: KeyboardProbeConfig,
}

/// The suite runner
pub struct SuiteRunner {
    browser: Browser,
    _handle: tokio::task::JoinHandle<()>,
}

impl SuiteRunner {
    /// Launch a browser, headless unless `headless` is false
    pub async fn new(headless: bool) -> Result<Self> {
        let mut builder = BrowserConfig::builder();
        if !headless {
            builder = builder.with_head();
        }
        Self::with_config(builder.build().map_err(|e| anyhow::anyhow!("{}", e))?).await
    }

    /// Create a runner with custom browser configuration
    ///
    /// ```no_run
    /// use a11y_harness::runner::SuiteRunner;
    /// use chromiumoxide::browser::BrowserConfig;
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// let browser_config = BrowserConfig::builder()
    ///     .chrome_executable("/opt/chrome/chrome")
    ///     .build()
    ///     .map_err(anyhow::Error::msg)?;
    /// let runner = SuiteRunner::with_config(browser_config).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn with_config(config: BrowserConfig) -> Result<Self> {
        info!("Launching browser for accessibility audits");
        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        info!("Browser launched successfully");
        Ok(Self::from_browser(browser, handle))
    }

    /// Wrap an already launched browser and its handler task
    pub fn from_browser(browser: Browser, handle: tokio::task::JoinHandle<()>) -> Self {
        Self {
            browser,
            _handle: handle,
        }
    }

    /// Run the suite with the configured rule selection
    pub async fn run(&self, config: &SuiteConfig) -> Result<SuiteResults> {
        self.run_with_overrides(config, &RuleOverrides::default())
            .await
    }

    /// Run the suite, replacing parts of the rule selection for this run only
    pub async fn run_with_overrides(
        &self,
        config: &SuiteConfig,
        overrides: &RuleOverrides,
    ) -> Result<SuiteResults> {
        let sites = config.load_sites()?;
        let baseline = config.load_baseline_rules()?;
        self.run_sites(config, &sites, &baseline, overrides).await
    }

    #[instrument(skip_all, fields(suite = %config.suite.name))]
    pub async fn run_sites(
        &self,
        config: &SuiteConfig,
        sites: &SiteList,
        baseline: &BaselineRules,
        overrides: &RuleOverrides,
    ) -> Result<SuiteResults> {
        sites.validate()?;
        let start_time = Instant::now();
        let started_at = chrono::Utc::now().to_rfc3339();

        let request = sites.rule_filter(baseline).with_overrides(overrides).to_request();
        debug!(
            tags = ?request.tags,
            rules = request.rules.len(),
            disabled = request.disabled_rules.len(),
            "Rule selection resolved"
        );

        let context = Arc::new(RunContext {
            config,
            request,
            auditor: AxeAuditor::from_script_path(config.axe_script().as_deref()),
            checker: AccessibilityChecker::new(),
            keyboard: config.keyboard_probe(),
        });

        info!(
            "Starting suite '{}' with {} urls",
            config.suite.name,
            sites.urls.len()
        );

        let parallel_contexts = config.suite.parallel_contexts as usize;
        let semaphore = Arc::new(Semaphore::new(parallel_contexts));

        let page_futures: Vec<_> = sites
            .urls
            .iter()
            .enumerate()
            .map(|(index, url)| {
                let sem = semaphore.clone();
                let context = context.clone();
                async move {
                    let _permit = sem.acquire().await;
                    (index, self.check_url(&context, url).await)
                }
            })
            .collect();

        let mut pages: Vec<(usize, PageReport)> = stream::iter(page_futures)
            .buffer_unordered(parallel_contexts)
            .collect()
            .await;
        pages.sort_by_key(|(index, _)| *index);

        let results = SuiteResults::from_pages(
            config.suite.name.clone(),
            started_at,
            start_time.elapsed().as_millis() as u64,
            pages.into_iter().map(|(_, page)| page).collect(),
        );

        if results.passed {
            info!(
                "Suite '{}' passed in {}ms",
                config.suite.name, results.total_duration_ms
            );
        } else {
            warn!(
                "Suite '{}' completed with {} failures",
                config.suite.name,
                results.failures.len()
            );
        }

        Ok(results)
    }

    /// Audit a single URL in its own page
    #[instrument(skip(self, context))]
    async fn check_url(&self, context: &RunContext<'_>, url: &str) -> PageReport {
        let started = Instant::now();
        let mut report = PageReport::new(url);
        let mut soft = SoftAssertions::new();
        let config = context.config;

        let page = match self.browser.new_page("about:blank").await {
            Ok(p) => p,
            Err(e) => {
                error!("Failed to create page: {}", e);
                soft.fail("browser", format!("Failed to create page: {}", e));
                report.conclude(soft, started);
                return report;
            }
        };

        let capture = match ErrorCapture::attach(&page, config.capture.mode).await {
            Ok(capture) => Some(capture),
            Err(e) => {
                warn!("Client error capture unavailable: {:#}", e);
                soft.fail("capture", format!("{:#}", e));
                None
            }
        };

        if let Err(e) = context.auditor.prepare(&page).await {
            warn!("{:#}", e);
        }

        let session = PageSession::new(page.clone());
        let site = SitePage::new(session.clone(), session);

        match site.open(url, config.timeouts.navigation()).await {
            Ok(()) => self.inspect(context, &site, &mut report, &mut soft).await,
            Err(e) => {
                warn!("Navigation failed: {:#}", e);
                soft.fail("navigation", format!("{:#}", e));
            }
        }

        if let Some(capture) = capture {
            let buckets = capture.finish(config.timeouts.quiescence()).await;
            buckets.assert_clean(&mut soft);
            report.client_errors = buckets;
        }

        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }

        report.conclude(soft, started);
        if report.passed {
            info!("PASS {}", url);
        } else {
            warn!("FAIL {} ({} failures)", url, report.failures.len());
        }
        report
    }

    async fn inspect(
        &self,
        context: &RunContext<'_>,
        site: &SitePage<PageSession, PageSession>,
        report: &mut PageReport,
        soft: &mut SoftAssertions,
    ) {
        let thresholds = &context.config.thresholds;
        let session = site.probe();

        let capability = context.auditor.detect(session).await;

        match site.run_heuristics(&context.checker).await {
            Ok((snapshot, heuristics)) => {
                context
                    .checker
                    .assert_report(&heuristics, &thresholds.heuristics, soft);
                report.title = Some(snapshot.title);
                report.heuristics = Some(heuristics);
            }
            Err(e) => soft.fail("heuristics", format!("DOM snapshot failed: {:#}", e)),
        }

        match context
            .auditor
            .audit(session, &capability, &context.request)
            .await
        {
            Ok(outcome) => {
                outcome.assert_outcome(thresholds.max_violations, soft);
                report.audit = Some(outcome);
            }
            Err(e) => soft.fail("audit", format!("{:#}", e)),
        }

        let keyboard = probe_keyboard_navigation(session, &context.keyboard).await;
        context
            .checker
            .assert_keyboard(&keyboard, &thresholds.heuristics, soft);
        report.keyboard = Some(keyboard);

        if context.config.interaction.enabled {
            report.interactions =
                Some(exercise_page(session, context.config.interaction.max_elements).await);
        }
    }

    /// Close the browser and clean up resources
    pub async fn close(mut self) -> Result<()> {
        info!("Closing browser");
        self.browser.close().await.context("Failed to close browser")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AxeViolation;
    use pretty_assertions::assert_eq;

    fn page(url: &str, failures: &[&str]) -> PageReport {
        let mut report = PageReport::new(url);
        report.failures = failures.iter().map(|f| f.to_string()).collect();
        report.passed = failures.is_empty();
        report
    }

    #[test]
    fn test_conclude_collects_soft_failures() {
        let mut report = PageReport::new("https://example.com");
        let mut soft = SoftAssertions::new();
        soft.fail("headings", "First heading is h4");
        soft.fail("network", "1 failed requests: net::ERR_FAILED https://example.com/a.js");

        report.conclude(soft, Instant::now());

        assert!(!report.passed);
        assert_eq!(
            report.failures,
            vec![
                "[headings] First heading is h4".to_string(),
                "[network] 1 failed requests: net::ERR_FAILED https://example.com/a.js"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_clean_page_passes() {
        let mut report = PageReport::new("https://example.com");
        report.conclude(SoftAssertions::new(), Instant::now());
        assert!(report.passed);
    }

    #[test]
    fn test_suite_results_aggregate_pages() {
        let results = SuiteResults::from_pages(
            "Marketing",
            "2026-01-01T00:00:00Z".to_string(),
            1200,
            vec![
                page("https://example.com/", &[]),
                page("https://example.com/about", &["[aria] page exposes no landmarks"]),
            ],
        );

        assert!(!results.passed);
        assert_eq!(
            results.failures,
            vec!["https://example.com/about: [aria] page exposes no landmarks".to_string()]
        );
        let failed: Vec<_> = results.failed_pages().map(|p| p.url.as_str()).collect();
        assert_eq!(failed, vec!["https://example.com/about"]);
    }

    #[test]
    fn test_navigation_failure_affects_only_its_page() {
        let results = SuiteResults::from_pages(
            "Mixed",
            String::new(),
            0,
            vec![
                page("https://example.com/", &[]),
                page("https://unreachable.invalid/", &["[navigation] Navigation failed"]),
                page("https://example.com/contact", &[]),
            ],
        );
        assert_eq!(results.failed_pages().count(), 1);
        assert_eq!(results.pages.len(), 3);
    }

    #[test]
    fn test_page_report_serialization() {
        let mut report = PageReport::new("https://example.com");
        report.audit = Some(AuditOutcome::Completed {
            violations: vec![AxeViolation {
                id: "image-alt".to_string(),
                impact: Some("critical".to_string()),
                details: serde_json::Map::new(),
            }],
        });
        report.keyboard = Some(KeyboardNavResult::from_count(3));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["audit"]["status"], "completed");
        assert_eq!(json["audit"]["violations"][0]["id"], "image-alt");
        assert_eq!(json["keyboard"]["navigatedElements"], 3);
        assert_eq!(json["client_errors"]["consoleErrors"], serde_json::json!([]));
    }
}
