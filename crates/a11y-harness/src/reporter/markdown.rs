//! Markdown reporter, suitable for CI job summaries

use anyhow::Result;
use std::fmt::Write;

use crate::audit::AuditOutcome;
use crate::runner::{PageReport, SuiteResults};

pub struct MarkdownReporter;

impl MarkdownReporter {
    pub fn format(results: &SuiteResults) -> Result<String> {
        let mut output = String::new();
        let status = if results.passed { "✅ Passed" } else { "❌ Failed" };

        writeln!(output, "# Accessibility audit: {}", results.suite_name)?;
        writeln!(output)?;
        writeln!(
            output,
            "**{}** · {} pages · {}ms · started {}",
            status,
            results.pages.len(),
            results.total_duration_ms,
            results.started_at
        )?;
        writeln!(output)?;

        writeln!(output, "| Page | Status | Violations | Headings | Missing alt | Landmarks | Keyboard | Client errors |")?;
        writeln!(output, "|------|--------|-----------:|----------|------------:|----------:|---------:|--------------:|")?;
        for page in &results.pages {
            Self::format_row(&mut output, page)?;
        }

        let failed: Vec<_> = results.failed_pages().collect();
        if !failed.is_empty() {
            writeln!(output)?;
            writeln!(output, "## Failures")?;
            for page in failed {
                writeln!(output)?;
                writeln!(output, "### {}", page.url)?;
                writeln!(output)?;
                for failure in &page.failures {
                    writeln!(output, "- {}", escape(failure.lines().next().unwrap_or("")))?;
                }
            }
        }

        Ok(output)
    }

    fn format_row(output: &mut String, page: &PageReport) -> Result<()> {
        let violations = match &page.audit {
            Some(AuditOutcome::Completed { violations }) => violations.len().to_string(),
            Some(AuditOutcome::Fallback { .. }) => "fallback".to_string(),
            None => "-".to_string(),
        };
        let (headings, missing_alt, landmarks) = match &page.heuristics {
            Some(h) => (
                if h.headings.is_valid() { "ok" } else { "issues" }.to_string(),
                format!("{:.1}%", h.images.percentage_without_alt()),
                h.aria.landmark_count().to_string(),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        let keyboard = page
            .keyboard
            .map_or("-".to_string(), |k| k.navigated_elements().to_string());
        let errors = &page.client_errors;

        writeln!(
            output,
            "| {} | {} | {} | {} | {} | {} | {} | {} |",
            escape(&page.url),
            if page.passed { "✅" } else { "❌" },
            violations,
            headings,
            missing_alt,
            landmarks,
            keyboard,
            errors.console_errors.len() + errors.page_errors.len() + errors.request_failures.len()
        )?;
        Ok(())
    }
}

fn escape(s: &str) -> String {
    s.replace('|', "\\|")
}
