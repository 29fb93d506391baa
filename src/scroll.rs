//! Lazy-content scroll pass
//!
//! Walks down the page in viewport-sized steps to trigger viewport-based
//! lazy loaders before capture, measuring page height between passes to
//! detect when content has stabilized.

use crate::CaptureError;
use chromiumoxide::Page;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};

/// Fraction of the viewport height advanced per scroll step. Less than a
/// full viewport so adjacent steps overlap and nothing is skipped past.
const SCROLL_STEP_SHARE: f64 = 0.8;

/// Pause at each scroll position, giving lazy loaders time to observe it.
const STEP_PAUSE: Duration = Duration::from_millis(100);

/// Sub-timeout for network activity triggered by a scroll pass to settle.
const NETWORK_SETTLE: Duration = Duration::from_secs(2);

/// Scroll through the page to trigger lazy-loaded content.
///
/// Stops when the page height stabilizes between passes, `max_iterations`
/// is reached, or `budget` is exhausted. The page is scrolled back to the
/// top on every exit path, including errors, so the subsequent capture
/// starts from a known position.
pub async fn scroll_for_lazy_content(
    page: &Page,
    viewport_height: u32,
    max_iterations: usize,
    budget: Duration,
) -> Result<(), CaptureError> {
    let result = scroll_pass(page, viewport_height, max_iterations, budget).await;

    // Return to the top regardless of how the pass ended.
    let _ = page.evaluate("window.scrollTo(0, 0)").await;
    sleep(STEP_PAUSE).await;

    result
}

async fn scroll_pass(
    page: &Page,
    viewport_height: u32,
    max_iterations: usize,
    budget: Duration,
) -> Result<(), CaptureError> {
    let started = Instant::now();
    let step = (f64::from(viewport_height) * SCROLL_STEP_SHARE).floor().max(1.0) as i64;
    let mut previous_height = 0i64;
    let mut iterations = 0usize;

    while iterations < max_iterations {
        if started.elapsed() > budget {
            break;
        }

        let current_height = page_height(page).await?;
        if current_height == previous_height {
            // No new content loaded since the last pass.
            break;
        }
        previous_height = current_height;

        let mut position = 0i64;
        while position < current_height && started.elapsed() < budget {
            page.evaluate(format!("window.scrollTo(0, {position})"))
                .await
                .map_err(|e| CaptureError::Script(e.to_string()))?;
            sleep(STEP_PAUSE).await;
            position += step;
        }

        // Give requests the scroll pass triggered a moment to finish before
        // measuring the height again; timing out here is not an error.
        let _ = timeout(NETWORK_SETTLE, page.wait_for_navigation()).await;

        iterations += 1;
    }

    Ok(())
}

async fn page_height(page: &Page) -> Result<i64, CaptureError> {
    page.evaluate("document.body.scrollHeight")
        .await
        .map_err(|e| CaptureError::Script(e.to_string()))?
        .into_value::<i64>()
        .map_err(|e| CaptureError::Script(e.to_string()))
}
