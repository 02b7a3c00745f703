//! Browser harness for accessibility and client-error audits
//!
//! Drives a Chromium instance over CDP and applies the checks from
//! [`a11y_core`] to every page of a site list.
//!
//! # Features
//!
//! - **Rule-based audit**: axe-core injected per page, filtered by tags and rule ids,
//!   with a title check when the engine cannot load
//! - **Heuristics**: heading hierarchy, image alt text, ARIA roles and landmarks
//! - **Keyboard probe**: bounded Tab traversal with visible-focus detection
//! - **Client errors**: console errors, uncaught exceptions and failed requests,
//!   captured per page from attach to network quiescence
//! - **Parallel Execution**: one browser, several pages audited at once
//! - **Multiple Output Formats**: JSON, Console and Markdown reports plus
//!   per-URL JSON artifacts
//!
//! # Example
//!
//! ```no_run
//! use a11y_harness::{ArtifactWriter, OutputFormat, Reporter, SuiteConfig, SuiteRunner};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = SuiteConfig::from_file("a11y.toml")?;
//!
//! let runner = SuiteRunner::new(config.suite.headless).await?;
//! let results = runner.run(&config).await?;
//!
//! Reporter::new(OutputFormat::Console).report(&results)?;
//! ArtifactWriter::new(config.output_dir()).write_suite(&results)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [suite]
//! name = "Marketing site"
//! sites_file = "sites.json"
//! rules_file = "rules.json"
//! parallel_contexts = 4
//!
//! [audit]
//! axe_script = "node_modules/axe-core/axe.min.js"
//!
//! [capture]
//! mode = "errors_only"
//!
//! [thresholds]
//! max_violations = 0
//! max_missing_alt_percentage = 0.0
//! require_landmarks = false
//! ```

pub mod audit;
pub mod capture;
pub mod cli;
pub mod config;
pub mod interact;
pub mod keyboard;
pub mod page;
pub mod reporter;
pub mod runner;
pub mod session;

pub use audit::{AuditCapability, AuditOutcome, AxeAuditor, AxeSource, AxeViolation};
pub use capture::ErrorCapture;
pub use config::{BaselineRules, SiteList, SuiteConfig};
pub use reporter::{ArtifactWriter, OutputFormat, Reporter};
pub use runner::{PageReport, SuiteResults, SuiteRunner};
pub use session::PageSession;
