//! Keyboard-navigation probe
//!
//! Best-effort, non-exhaustive: focus the first focusable element, press Tab a
//! bounded number of times and count how often a visibly focused element shows
//! up. The first miss ends the probe without failing it.

use a11y_core::{KeyboardNavResult, KeyboardProbeConfig};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, instrument};

use crate::page::FocusDriver;

/// Interval between visible-focus polls
const FOCUS_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[instrument(skip(driver, config), fields(max = config.max_elements))]
pub async fn probe_keyboard_navigation<D: FocusDriver>(
    driver: &D,
    config: &KeyboardProbeConfig,
) -> KeyboardNavResult {
    let focusable = match driver.focusable_count().await {
        Ok(count) => count,
        Err(e) => {
            debug!("Could not count focusable elements: {}", e);
            0
        }
    };

    let presses = config.presses_for(focusable);
    if presses == 0 {
        debug!("No focusable elements, skipping keyboard probe");
        return KeyboardNavResult::from_count(0);
    }

    match driver.focus_first().await {
        Ok(true) => {}
        Ok(false) => return KeyboardNavResult::from_count(0),
        Err(e) => {
            debug!("Could not focus first element: {}", e);
            return KeyboardNavResult::from_count(0);
        }
    }

    let mut navigated = 0;
    for step in 0..presses {
        if let Err(e) = driver.press_tab().await {
            debug!(step, "Tab press failed: {}", e);
            break;
        }
        sleep(config.settle).await;

        if !wait_for_visible_focus(driver, config.focus_timeout).await {
            debug!(step, "No visible focus after Tab, stopping early");
            break;
        }
        navigated += 1;
    }

    debug!(navigated, presses, "Keyboard probe finished");
    KeyboardNavResult::from_count(navigated)
}

async fn wait_for_visible_focus<D: FocusDriver>(driver: &D, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        match driver.has_visible_focus().await {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => {
                debug!("Focus check failed: {}", e);
                return false;
            }
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(FOCUS_POLL_INTERVAL).await;
    }
}
