//! Suite result reporting
//!
//! # Output Formats
//!
//! - **JSON**: Machine-readable format for CI/CD integration
//! - **Console**: Human-readable summary with per-page status
//! - **Markdown**: Documentation-friendly format for reports
//!
//! Independently of the format, [`ArtifactWriter`] persists one directory of
//! JSON attachments per audited URL.
//!
//! # Example
//!
//! ```no_run
//! use a11y_harness::reporter::{ArtifactWriter, OutputFormat, Reporter};
//! use a11y_harness::runner::SuiteResults;
//!
//! # fn example(results: SuiteResults) -> anyhow::Result<()> {
//! Reporter::new(OutputFormat::Console).report(&results)?;
//! ArtifactWriter::new("a11y-results").write_suite(&results)?;
//! # Ok(())
//! # }
//! ```

mod artifacts;
mod console;
mod json;
mod markdown;

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use crate::runner::SuiteResults;

pub use artifacts::{slug, ArtifactWriter};
pub use console::ConsoleReporter;
pub use json::JsonReporter;
pub use markdown::MarkdownReporter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    JsonPretty,
    #[default]
    Console,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "json-pretty" | "pretty" => Ok(Self::JsonPretty),
            "console" | "text" => Ok(Self::Console),
            "markdown" | "md" => Ok(Self::Markdown),
            other => anyhow::bail!("unknown output format: {}", other),
        }
    }
}

pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Report results to stdout
    pub fn report(&self, results: &SuiteResults) -> Result<()> {
        let output = self.format_results(results)?;
        print!("{}", output);
        io::stdout().flush()?;
        Ok(())
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, results: &SuiteResults, path: P) -> Result<()> {
        let path = path.as_ref();
        let output = self.format_results(results)?;
        fs::write(path, output)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    pub fn format_results(&self, results: &SuiteResults) -> Result<String> {
        match self.format {
            OutputFormat::Json => JsonReporter::format(results, false),
            OutputFormat::JsonPretty => JsonReporter::format(results, true),
            OutputFormat::Console => ConsoleReporter::format(results),
            OutputFormat::Markdown => MarkdownReporter::format(results),
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use a11y_core::{
        AccessibilityChecker, CaptureMode, ClientErrorBuckets, DomSnapshot, Heading,
        ImageElement, KeyboardNavResult, PageError,
    };

    use crate::audit::{AuditOutcome, AxeViolation};
    use crate::runner::{PageReport, SuiteResults};

    /// Two pages: a clean one and one with every kind of finding
    pub fn sample_results() -> SuiteResults {
        let checker = AccessibilityChecker::new();

        let mut home = PageReport::new("https://example.com/");
        home.title = Some("Home".to_string());
        home.audit = Some(AuditOutcome::Completed {
            violations: Vec::new(),
        });
        home.heuristics = Some(checker.check(&DomSnapshot {
            headings: vec![Heading::new(1, "Home").unwrap()],
            ..DomSnapshot::default()
        }));
        home.keyboard = Some(KeyboardNavResult::from_count(4));
        home.passed = true;

        let mut about = PageReport::new("https://example.com/about?tab=team");
        about.title = Some(String::new());
        about.audit = Some(AuditOutcome::Completed {
            violations: vec![serde_json::from_value::<AxeViolation>(serde_json::json!({
                "id": "image-alt",
                "impact": "critical",
                "help": "Images must have alternate text",
                "nodes": [{"html": "<img src=\"team.png\">"}]
            }))
            .unwrap()],
        });
        about.heuristics = Some(checker.check(&DomSnapshot {
            headings: vec![Heading::new(4, "Team").unwrap()],
            images: vec![ImageElement::default()],
            ..DomSnapshot::default()
        }));
        about.keyboard = Some(KeyboardNavResult::from_count(0));
        let mut buckets = ClientErrorBuckets::new(CaptureMode::ErrorsOnly);
        buckets.record_page_error(&PageError {
            message: "TypeError: team is undefined".to_string(),
            stack: None,
        });
        about.client_errors = buckets;
        about.failures = vec![
            "[headings] 1 heading hierarchy issues: First heading is h4".to_string(),
            "[page] 1 uncaught exceptions: TypeError: team is undefined".to_string(),
        ];

        SuiteResults::from_pages(
            "Marketing site",
            "2026-01-01T00:00:00Z".to_string(),
            4200,
            vec![home, about],
        )
    }
}
