//! Command-line arguments for the suite runner

use a11y_core::RuleOverrides;
use clap::Parser;
use std::path::PathBuf;

use crate::reporter::OutputFormat;

/// Run an accessibility suite from a TOML config file
#[derive(Parser, Debug)]
#[command(name = "run_suite")]
#[command(
    version,
    about = "Accessibility and client-error audit over a list of pages"
)]
pub struct RunArgs {
    /// Suite configuration file
    pub config: PathBuf,

    /// Report format: console, json, json-pretty or markdown
    #[arg(short, long, default_value = "console")]
    pub format: OutputFormat,

    /// Write the formatted report to a file instead of stdout
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Replace the site list's wcagTags for this run
    #[arg(long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    /// Replace the baseline rules for this run
    #[arg(long, value_delimiter = ',')]
    pub rules: Option<Vec<String>>,

    /// Replace the site list's excludeRules for this run
    #[arg(long, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,
}

impl RunArgs {
    /// Rule selection overrides; blank list entries are dropped
    pub fn overrides(&self) -> RuleOverrides {
        RuleOverrides {
            tags: self.tags.as_deref().map(non_blank),
            include_rules: self.rules.as_deref().map(non_blank),
            exclude_rules: self.exclude.as_deref().map(non_blank),
        }
    }
}

fn non_blank(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let args = RunArgs::try_parse_from(["run_suite", "a11y.toml"]).unwrap();
        assert_eq!(args.config, PathBuf::from("a11y.toml"));
        assert_eq!(args.format, OutputFormat::Console);
        assert_eq!(args.report, None);
        assert_eq!(args.overrides(), RuleOverrides::default());
    }

    #[test]
    fn test_all_flags() {
        let args = RunArgs::try_parse_from([
            "run_suite",
            "suites/a11y.toml",
            "--format",
            "markdown",
            "--report",
            "out/report.md",
            "--tags",
            "wcag2a,wcag2aa",
            "--rules",
            "image-alt, label,",
            "--exclude",
            "region",
        ])
        .unwrap();

        assert_eq!(args.format, OutputFormat::Markdown);
        assert_eq!(args.report, Some(PathBuf::from("out/report.md")));
        assert_eq!(
            args.overrides(),
            RuleOverrides {
                tags: Some(vec!["wcag2a".to_string(), "wcag2aa".to_string()]),
                include_rules: Some(vec!["image-alt".to_string(), "label".to_string()]),
                exclude_rules: Some(vec!["region".to_string()]),
            }
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(RunArgs::try_parse_from(["run_suite"]).is_err());
        assert!(RunArgs::try_parse_from(["run_suite", "a.toml", "--format", "yaml"]).is_err());
        assert!(RunArgs::try_parse_from(["run_suite", "a.toml", "--bogus"]).is_err());
    }
}
