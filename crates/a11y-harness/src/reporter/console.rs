//! Console reporter for suite results
//!
//! Provides human-readable output with ASCII tables and status indicators.

use anyhow::Result;
use std::fmt::Write;

use crate::audit::AuditOutcome;
use crate::runner::{PageReport, SuiteResults};

pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn format(results: &SuiteResults) -> Result<String> {
        let mut output = String::new();

        writeln!(output)?;
        writeln!(output, "╔══════════════════════════════════════════════════════════════╗")?;
        writeln!(output, "║                 ACCESSIBILITY AUDIT RESULTS                  ║")?;
        writeln!(output, "╚══════════════════════════════════════════════════════════════╝")?;
        writeln!(output)?;

        writeln!(output, "Suite:     {}", results.suite_name)?;
        writeln!(output, "Started:   {}", results.started_at)?;
        writeln!(output, "Duration:  {}ms", results.total_duration_ms)?;
        writeln!(output, "Pages:     {}", results.pages.len())?;
        writeln!(output)?;

        for page in &results.pages {
            Self::format_page(&mut output, page)?;
        }

        writeln!(output, "────────────────────────────────────────────────────────────────")?;
        let status = if results.passed { "PASSED" } else { "FAILED" };
        let status_symbol = if results.passed { "✓" } else { "✗" };
        writeln!(output, "Overall Status: {} {}", status_symbol, status)?;

        if !results.failures.is_empty() {
            writeln!(output)?;
            writeln!(output, "Failures:")?;
            for failure in &results.failures {
                writeln!(output, "  • {}", first_line(failure))?;
            }
        }

        writeln!(output)?;
        Ok(output)
    }

    fn format_page(output: &mut String, page: &PageReport) -> Result<()> {
        let status = if page.passed { "✓" } else { "✗" };

        writeln!(output, "────────────────────────────────────────────────────────────────")?;
        writeln!(output, "Page: {} {}", page.url, status)?;
        writeln!(output, "────────────────────────────────────────────────────────────────")?;

        if let Some(title) = &page.title {
            writeln!(output, "  Title:      {}", if title.is_empty() { "<empty>" } else { title })?;
        }
        writeln!(output, "  Duration:   {}ms", page.duration_ms)?;

        match &page.audit {
            Some(AuditOutcome::Completed { violations }) => {
                writeln!(output, "  Audit:      {} violations", violations.len())?;
                for violation in violations {
                    writeln!(
                        output,
                        "    - {} [{}] {} node(s)",
                        violation.id,
                        violation.impact.as_deref().unwrap_or("unknown"),
                        violation.node_count()
                    )?;
                }
            }
            Some(AuditOutcome::Fallback { reason, title_present, .. }) => {
                writeln!(
                    output,
                    "  Audit:      fallback ({}), title {}",
                    reason,
                    if *title_present { "present" } else { "missing" }
                )?;
            }
            None => writeln!(output, "  Audit:      not run")?,
        }

        if let Some(heuristics) = &page.heuristics {
            writeln!(output)?;
            writeln!(output, "  ┌────────────┬────────┬──────────────────────────────┐")?;
            writeln!(output, "  │ Check      │ Status │ Detail                       │")?;
            writeln!(output, "  ├────────────┼────────┼──────────────────────────────┤")?;
            Self::format_row(
                output,
                "Headings",
                heuristics.headings.is_valid(),
                &format!("{} issues", heuristics.headings.issues().len()),
            )?;
            Self::format_row(
                output,
                "Images",
                heuristics.images.images_without_alt() == 0,
                &format!(
                    "{}/{} without alt ({:.1}%)",
                    heuristics.images.images_without_alt(),
                    heuristics.images.total_images(),
                    heuristics.images.percentage_without_alt()
                ),
            )?;
            Self::format_row(
                output,
                "ARIA",
                heuristics.aria.valid_roles(),
                &format!("{} landmarks", heuristics.aria.landmark_count()),
            )?;
            if let Some(keyboard) = &page.keyboard {
                Self::format_row(
                    output,
                    "Keyboard",
                    keyboard.success(),
                    &format!("{} focus stops", keyboard.navigated_elements()),
                )?;
            }
            writeln!(output, "  └────────────┴────────┴──────────────────────────────┘")?;
        }

        let errors = &page.client_errors;
        writeln!(
            output,
            "  Client errors: {} console, {} uncaught, {} network",
            errors.console_errors.len(),
            errors.page_errors.len(),
            errors.request_failures.len()
        )?;

        if let Some(interactions) = &page.interactions {
            writeln!(
                output,
                "  Interactions:  {} attempted, {} skipped",
                interactions.attempted, interactions.skipped
            )?;
        }

        if !page.failures.is_empty() {
            writeln!(output)?;
            writeln!(output, "  Failures:")?;
            for failure in &page.failures {
                writeln!(output, "    ✗ {}", first_line(failure))?;
            }
        }

        writeln!(output)?;
        Ok(())
    }

    fn format_row(output: &mut String, name: &str, ok: bool, detail: &str) -> Result<()> {
        writeln!(
            output,
            "  │ {:<10} │ {:^6} │ {:<28} │",
            name,
            if ok { "ok" } else { "FAIL" },
            detail
        )?;
        Ok(())
    }
}

/// Stack traces stay in the artifacts
fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or(s)
}
