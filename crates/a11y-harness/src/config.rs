//! Configuration parsing for audit suites
//!
//! A suite is described by a TOML file that points at two JSON inputs:
//!
//! - a **site list** (`wcagTags`, `excludeRules`, `urls`)
//! - a **baseline rule list** (flat array of axe rule ids)
//!
//! Relative paths inside the TOML file resolve against the file's directory.

use a11y_core::{CaptureMode, HeuristicThresholds, KeyboardProbeConfig, RuleFilterConfig};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// URL schemes the runner is able to open
const SUPPORTED_SCHEMES: [&str; 4] = ["http://", "https://", "file://", "data:"];

/// Main configuration structure loaded from TOML files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    pub suite: SuiteSection,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub keyboard: KeyboardConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    /// Directory relative paths are resolved against
    #[serde(skip)]
    base_dir: PathBuf,
}

impl SuiteConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed or
    /// required fields are missing
    ///
    /// # Example
    ///
    /// ```no_run
    /// use a11y_harness::config::SuiteConfig;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = SuiteConfig::from_file("a11y.toml")?;
    /// let sites = config.load_sites()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_str(&content)?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config)
    }

    /// Parse configuration from a TOML string; relative paths resolve against
    /// the current directory
    ///
    /// ```
    /// use a11y_harness::config::SuiteConfig;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = SuiteConfig::from_str(r#"
    ///     [suite]
    ///     name = "Marketing site"
    ///     sites_file = "sites.json"
    /// "#)?;
    /// assert_eq!(config.suite.parallel_contexts, 4);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        let mut config: Self = toml::from_str(s).context("Failed to parse TOML configuration")?;
        config.base_dir = PathBuf::from(".");
        if config.suite.parallel_contexts == 0 {
            anyhow::bail!("suite.parallel_contexts must be at least 1");
        }
        config
            .thresholds
            .heuristics
            .validate()
            .context("Invalid [thresholds] section")?;
        Ok(config)
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn load_sites(&self) -> anyhow::Result<SiteList> {
        SiteList::from_file(self.resolve(&self.suite.sites_file))
    }

    /// Baseline rules, empty when no rules file is configured
    pub fn load_baseline_rules(&self) -> anyhow::Result<BaselineRules> {
        match &self.suite.rules_file {
            Some(path) => BaselineRules::from_file(self.resolve(path)),
            None => Ok(BaselineRules::default()),
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.suite.output_dir)
    }

    pub fn axe_script(&self) -> Option<PathBuf> {
        self.audit.axe_script.as_deref().map(|p| self.resolve(p))
    }

    pub fn keyboard_probe(&self) -> KeyboardProbeConfig {
        KeyboardProbeConfig {
            max_elements: self.keyboard.max_elements,
            settle: Duration::from_millis(self.keyboard.settle_ms),
            focus_timeout: Duration::from_millis(self.keyboard.focus_timeout_ms),
        }
    }
}

/// Core suite parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteSection {
    /// Name of the suite
    pub name: String,
    /// JSON site list (`wcagTags`, `excludeRules`, `urls`)
    pub sites_file: PathBuf,
    /// JSON array of baseline axe rule ids
    #[serde(default)]
    pub rules_file: Option<PathBuf>,
    /// Where JSON artifacts are written (default: a11y-results)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Number of pages audited concurrently (default: 4)
    #[serde(default = "default_parallel_contexts")]
    pub parallel_contexts: u32,
    /// Run the browser without a window (default: true)
    #[serde(default = "default_true")]
    pub headless: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("a11y-results")
}

fn default_parallel_contexts() -> u32 {
    4
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_navigation_ms")]
    pub navigation_ms: u64,
    /// Network must stay idle this long before client errors are collected
    #[serde(default = "default_quiescence_idle_ms")]
    pub quiescence_idle_ms: u64,
    /// Upper bound on the quiescence wait
    #[serde(default = "default_quiescence_max_ms")]
    pub quiescence_max_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            navigation_ms: default_navigation_ms(),
            quiescence_idle_ms: default_quiescence_idle_ms(),
            quiescence_max_ms: default_quiescence_max_ms(),
        }
    }
}

impl TimeoutsConfig {
    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn quiescence(&self) -> Quiescence {
        Quiescence {
            idle_window: Duration::from_millis(self.quiescence_idle_ms),
            max_wait: Duration::from_millis(self.quiescence_max_ms),
        }
    }
}

fn default_navigation_ms() -> u64 {
    30_000
}

fn default_quiescence_idle_ms() -> u64 {
    500
}

fn default_quiescence_max_ms() -> u64 {
    5_000
}

/// Bounded network-idle wait applied before reading client-error buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quiescence {
    pub idle_window: Duration,
    pub max_wait: Duration,
}

impl Default for Quiescence {
    fn default() -> Self {
        TimeoutsConfig::default().quiescence()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyboardConfig {
    #[serde(default = "default_max_elements")]
    pub max_elements: usize,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_focus_timeout_ms")]
    pub focus_timeout_ms: u64,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            max_elements: default_max_elements(),
            settle_ms: default_settle_ms(),
            focus_timeout_ms: default_focus_timeout_ms(),
        }
    }
}

fn default_max_elements() -> usize {
    5
}

fn default_settle_ms() -> u64 {
    100
}

fn default_focus_timeout_ms() -> u64 {
    1_000
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default)]
    pub mode: CaptureMode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Path to `axe.min.js`; without it every page uses the fallback check
    #[serde(default)]
    pub axe_script: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_elements")]
    pub max_elements: usize,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_elements: default_max_elements(),
        }
    }
}

/// Pass/fail thresholds for a page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    /// Highest tolerated number of audit violations (default: 0)
    #[serde(default)]
    pub max_violations: usize,
    #[serde(flatten)]
    pub heuristics: HeuristicThresholds,
}

/// Site list consumed from JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteList {
    #[serde(default)]
    pub wcag_tags: Vec<String>,
    #[serde(default)]
    pub exclude_rules: Vec<String>,
    pub urls: Vec<String>,
}

impl SiteList {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read site list: {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let sites: Self = serde_json::from_str(s).context("Failed to parse site list JSON")?;
        sites.validate()?;
        Ok(sites)
    }

    /// Every URL must be absolute with a scheme the browser can open
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.urls.is_empty() {
            anyhow::bail!("site list contains no urls");
        }
        for url in &self.urls {
            let lower = url.to_ascii_lowercase();
            if !SUPPORTED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
                anyhow::bail!("url has no supported scheme (http, https, file, data): {}", url);
            }
        }
        Ok(())
    }

    pub fn rule_filter(&self, baseline: &BaselineRules) -> RuleFilterConfig {
        RuleFilterConfig::from_defaults(
            self.wcag_tags.iter().cloned(),
            baseline.0.iter().cloned(),
            self.exclude_rules.iter().cloned(),
        )
    }
}

/// Flat JSON array of axe rule ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaselineRules(pub Vec<String>);

impl BaselineRules {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read baseline rules: {}", path.display()))?;
        serde_json::from_str(&content).context("Failed to parse baseline rules JSON")
    }
}
