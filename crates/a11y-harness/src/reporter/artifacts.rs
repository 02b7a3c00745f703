//! Per-URL JSON attachments
//!
//! ```text
//! <output_dir>/
//! ├── suite.json
//! └── example-com-about-tab-team/
//!     ├── violations.json
//!     ├── headings.json
//!     ├── images.json
//!     ├── aria.json
//!     ├── keyboard.json
//!     └── client-errors.json
//! ```

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::runner::{PageReport, SuiteResults};

const MAX_SLUG_LEN: usize = 80;

lazy_static! {
    static ref SCHEME: Regex = Regex::new(r"^[a-z][a-z0-9+.-]*:(//)?").unwrap();
    static ref NON_ALNUM: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Directory-safe name for a URL
pub fn slug(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    let without_scheme = SCHEME.replace(&lower, "");
    let dashed = NON_ALNUM.replace_all(&without_scheme, "-");
    let mut slug: String = dashed.trim_matches('-').chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "page".to_string()
    } else {
        slug
    }
}

pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `suite.json` and one attachment directory per page
    ///
    /// Returns the page directories in page order. URLs with colliding slugs
    /// get a numeric suffix.
    pub fn write_suite(&self, results: &SuiteResults) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.root).with_context(|| {
            format!("Failed to create output directory: {}", self.root.display())
        })?;
        write_json(&self.root.join("suite.json"), results)?;

        let mut taken = HashSet::new();
        let mut dirs = Vec::with_capacity(results.pages.len());
        for page in &results.pages {
            let base = slug(&page.url);
            let mut name = base.clone();
            let mut n = 2;
            while !taken.insert(name.clone()) {
                name = format!("{}-{}", base, n);
                n += 1;
            }
            dirs.push(self.write_page(page, &name)?);
        }

        info!(
            "Wrote artifacts for {} pages to {}",
            dirs.len(),
            self.root.display()
        );
        Ok(dirs)
    }

    /// Attachments for one page; parts that were never produced are skipped
    pub fn write_page(&self, page: &PageReport, dir_name: &str) -> Result<PathBuf> {
        let dir = self.root.join(dir_name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create artifact directory: {}", dir.display()))?;

        if let Some(audit) = &page.audit {
            write_json(&dir.join("violations.json"), &audit.violations())?;
        }
        if let Some(heuristics) = &page.heuristics {
            write_json(&dir.join("headings.json"), &heuristics.headings)?;
            write_json(&dir.join("images.json"), &heuristics.images)?;
            write_json(&dir.join("aria.json"), &heuristics.aria)?;
        }
        if let Some(keyboard) = &page.keyboard {
            write_json(&dir.join("keyboard.json"), keyboard)?;
        }
        write_json(&dir.join("client-errors.json"), &page.client_errors)?;

        debug!(url = %page.url, dir = %dir.display(), "Page artifacts written");
        Ok(dir)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
