//! JSON reporter for suite results

use crate::runner::SuiteResults;
use anyhow::Result;

pub struct JsonReporter;

impl JsonReporter {
    pub fn format(results: &SuiteResults, pretty: bool) -> Result<String> {
        let output = if pretty {
            serde_json::to_string_pretty(results)?
        } else {
            serde_json::to_string(results)?
        };
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::fixtures::sample_results;

    #[test]
    fn test_json_format_compact() {
        let output = JsonReporter::format(&sample_results(), false).unwrap();
        assert!(!output.contains('\n'));
        assert!(output.contains("\"suite_name\":\"Marketing site\""));
    }

    #[test]
    fn test_json_format_pretty() {
        let output = JsonReporter::format(&sample_results(), true).unwrap();
        assert!(output.contains('\n'));
        assert!(output.contains("  "));
    }

    #[test]
    fn test_json_parses_back() {
        let results = sample_results();
        let json = JsonReporter::format(&results, false).unwrap();
        let parsed: SuiteResults = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.suite_name, results.suite_name);
        assert_eq!(parsed.passed, results.passed);
        assert_eq!(parsed.pages[1].client_errors.page_errors.len(), 1);
        assert_eq!(
            parsed.pages[1].audit.as_ref().unwrap().violations()[0].id,
            "image-alt"
        );
    }
}
