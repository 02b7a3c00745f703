//! chromiumoxide-backed page session
//!
//! Implements every capability in [`crate::page`] on a single CDP page. DOM
//! inspection happens through one script evaluation per call; the key press
//! goes through `Input.dispatchKeyEvent` so focus moves exactly like a user
//! pressing Tab.

use a11y_core::keyboard::FOCUSABLE_SELECTOR;
use a11y_core::DomSnapshot;
use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::Page;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::audit::{AxeHost, AxeViolation};
use crate::page::{
    AccessibilityProbe, FocusDriver, InteractionDriver, InteractionKind, InteractionTarget,
    Navigator,
};

/// Attribute used to tag elements picked for interaction probing
const PROBE_ATTRIBUTE: &str = "data-a11y-probe";

/// Virtual key code for Tab
const TAB_KEY_CODE: i64 = 9;

#[derive(Debug, Clone)]
pub struct PageSession {
    page: Page,
}

impl PageSession {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String, what: &str) -> Result<T> {
        self.page
            .evaluate(script.as_str())
            .await
            .with_context(|| format!("Failed to evaluate {}", what))?
            .into_value()
            .with_context(|| format!("Unexpected result from {}", what))
    }

    async fn dispatch_tab(&self, kind: DispatchKeyEventType) -> Result<()> {
        let params = DispatchKeyEventParams::builder()
            .r#type(kind)
            .key("Tab")
            .code("Tab")
            .windows_virtual_key_code(TAB_KEY_CODE)
            .native_virtual_key_code(TAB_KEY_CODE)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build key event: {}", e))?;
        self.page.execute(params).await.context("Key dispatch failed")?;
        Ok(())
    }
}

fn selector_literal() -> String {
    serde_json::to_string(FOCUSABLE_SELECTOR).unwrap_or_else(|_| "'a[href], button'".to_string())
}

/// Script returning a JSON document shaped like [`DomSnapshot`]
pub fn snapshot_script() -> String {
    format!(
        r#"(() => {{
            const attr = (el, name) => el.hasAttribute(name) ? el.getAttribute(name) : null;
            return {{
                url: location.href,
                title: document.title || '',
                headings: Array.from(document.querySelectorAll('h1, h2, h3, h4, h5, h6')).map(h => ({{
                    level: Number(h.tagName.substring(1)),
                    text: (h.textContent || '').trim()
                }})),
                images: Array.from(document.querySelectorAll('img')).map(img => ({{
                    alt: attr(img, 'alt'),
                    role: attr(img, 'role'),
                    src: attr(img, 'src')
                }})),
                structural: Array.from(document.querySelectorAll('main, nav, header, footer, [role]')).map(el => ({{
                    tag: el.tagName.toLowerCase(),
                    role: attr(el, 'role'),
                    id: el.id || null
                }})),
                focusable_count: document.querySelectorAll({selector}).length
            }};
        }})()"#,
        selector = selector_literal()
    )
}

const VISIBLE_FOCUS_SCRIPT: &str = r#"(() => {
    const el = document.activeElement;
    if (!el || el === document.body || el === document.documentElement) {
        return false;
    }
    const rect = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    return rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden'
        && style.display !== 'none';
})()"#;

impl Navigator for PageSession {
    #[instrument(skip(self))]
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        debug!("Navigating to: {}", url);
        tokio::time::timeout(timeout, self.page.goto(url))
            .await
            .with_context(|| format!("Navigation timed out after {:?}: {}", timeout, url))?
            .with_context(|| format!("Navigation failed: {}", url))?;
        Ok(())
    }

    async fn wait_for_load(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.page.wait_for_navigation())
            .await
            .with_context(|| format!("Page load timed out after {:?}", timeout))?
            .context("Wait for navigation failed")?;
        Ok(())
    }
}

impl AccessibilityProbe for PageSession {
    async fn snapshot(&self) -> Result<DomSnapshot> {
        self.eval(snapshot_script(), "DOM snapshot").await
    }

    async fn title(&self) -> Result<String> {
        self.eval("document.title || ''".to_string(), "document title")
            .await
    }
}

impl FocusDriver for PageSession {
    async fn focusable_count(&self) -> Result<usize> {
        self.eval(
            format!("document.querySelectorAll({}).length", selector_literal()),
            "focusable count",
        )
        .await
    }

    async fn focus_first(&self) -> Result<bool> {
        self.eval(
            format!(
                r#"(() => {{
                    const el = document.querySelector({});
                    if (!el) return false;
                    el.focus();
                    return true;
                }})()"#,
                selector_literal()
            ),
            "focus of first element",
        )
        .await
    }

    async fn press_tab(&self) -> Result<()> {
        self.dispatch_tab(DispatchKeyEventType::KeyDown).await?;
        self.dispatch_tab(DispatchKeyEventType::KeyUp).await
    }

    async fn has_visible_focus(&self) -> Result<bool> {
        self.eval(VISIBLE_FOCUS_SCRIPT.to_string(), "visible focus check")
            .await
    }
}

impl AxeHost for PageSession {
    async fn axe_loaded(&self) -> Result<bool> {
        self.eval(
            "typeof window.axe === 'object' && typeof window.axe.run === 'function'".to_string(),
            "axe-core detection",
        )
        .await
    }

    #[instrument(skip_all)]
    async fn run_axe(&self, options: &serde_json::Value) -> Result<Vec<AxeViolation>> {
        self.eval(
            format!(
                "(async () => (await window.axe.run(document, {})).violations)()",
                options
            ),
            "axe.run",
        )
        .await
    }
}

impl InteractionDriver for PageSession {
    async fn interaction_targets(&self, max_per_kind: usize) -> Result<Vec<InteractionTarget>> {
        let script = format!(
            r#"(() => {{
                const pick = (selector, kind) => Array.from(document.querySelectorAll(selector))
                    .slice(0, {max})
                    .map((el, i) => {{
                        const mark = kind + '-' + i;
                        el.setAttribute('{attr}', mark);
                        return {{ mark, kind }};
                    }});
                return pick('button[type="button"], [role="button"]', 'click')
                    .concat(pick('input[type="text"], input[type="search"], input[type="email"], input:not([type]), textarea', 'fill'));
            }})()"#,
            max = max_per_kind,
            attr = PROBE_ATTRIBUTE
        );

        #[derive(serde::Deserialize)]
        struct Marked {
            mark: String,
            kind: String,
        }

        let marked: Vec<Marked> = self.eval(script, "interaction target scan").await?;
        Ok(marked
            .into_iter()
            .map(|m| InteractionTarget {
                selector: format!("[{}=\"{}\"]", PROBE_ATTRIBUTE, m.mark),
                kind: if m.kind == "fill" {
                    InteractionKind::Fill
                } else {
                    InteractionKind::Click
                },
            })
            .collect())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("Element not found: {}", selector))?;
        element.click().await.context("Click failed")?;
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("Element not found: {}", selector))?;
        element.click().await.context("Focus before typing failed")?;
        element.type_str(text).await.context("Type failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_script_embeds_selector() {
        let script = snapshot_script();
        assert!(script.contains("focusable_count"));
        assert!(script.contains(r#"[tabindex]:not([tabindex=\"-1\"])"#));
        assert!(script.starts_with("(() =>"));
    }

    #[test]
    fn test_selector_literal_is_quoted_js_string() {
        let literal = selector_literal();
        assert!(literal.starts_with('"') && literal.ends_with('"'));
        let parsed: String = serde_json::from_str(&literal).unwrap();
        assert_eq!(parsed, FOCUSABLE_SELECTOR);
    }
}
