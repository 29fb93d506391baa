//! Single-unit capture operation
//!
//! [`capture_screenshot`] runs one navigate → stabilize → capture sequence
//! against an isolated execution context and always returns a
//! [`CaptureOutcome`]; failures become data, never errors. The [`Capturer`]
//! trait is the seam the retry and scheduling layers run against.

use crate::{
    overlays, scroll_for_lazy_content, BrowserManager, CaptureError, CaptureRequest,
    ExecutionContext, TimeoutBudget,
};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::debug;

/// Terminal state of one capture attempt.
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    /// The capture completed; `image` holds the PNG bytes.
    Completed { device_name: String, image: Vec<u8> },
    /// The capture failed; `error` carries the raw signal text verbatim.
    Failed { device_name: String, error: String },
}

impl CaptureOutcome {
    pub fn device_name(&self) -> &str {
        match self {
            CaptureOutcome::Completed { device_name, .. } => device_name,
            CaptureOutcome::Failed { device_name, .. } => device_name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CaptureOutcome::Completed { .. })
    }
}

/// Executes one capture attempt for a request.
///
/// The production implementation drives the shared rendering engine; tests
/// substitute stubs to exercise retry and scheduling behavior without a
/// browser.
#[async_trait]
pub trait Capturer: Send + Sync {
    async fn capture(&self, request: &CaptureRequest) -> CaptureOutcome;
}

/// Production [`Capturer`] backed by a [`BrowserManager`].
pub struct ScreenshotCapturer {
    manager: Arc<BrowserManager>,
    budget: TimeoutBudget,
}

impl ScreenshotCapturer {
    pub fn new(manager: Arc<BrowserManager>) -> Self {
        Self {
            manager,
            budget: TimeoutBudget::default(),
        }
    }

    pub fn with_budget(manager: Arc<BrowserManager>, budget: TimeoutBudget) -> Self {
        Self { manager, budget }
    }
}

#[async_trait]
impl Capturer for ScreenshotCapturer {
    async fn capture(&self, request: &CaptureRequest) -> CaptureOutcome {
        capture_screenshot(&self.manager, request, &self.budget).await
    }
}

/// Capture one screenshot of `request.url` at `request.device`.
///
/// Phases: acquire context, navigate (60% of the timeout by default),
/// stabilize (25%), capture (15%), release context. The context is released
/// on every exit path. Never returns an error; failures are reported in the
/// outcome with the engine's raw signal text.
pub async fn capture_screenshot(
    manager: &BrowserManager,
    request: &CaptureRequest,
    budget: &TimeoutBudget,
) -> CaptureOutcome {
    let device_name = request.device.name.clone();

    let context = match manager.create_context(&request.device).await {
        Ok(context) => context,
        Err(e) => {
            return CaptureOutcome::Failed {
                device_name,
                error: e.to_string(),
            }
        }
    };

    let result = run_capture(&context, request, budget).await;

    // Release on every path; a second release elsewhere would be a no-op.
    manager.close_context(&context).await;

    match result {
        Ok(image) => CaptureOutcome::Completed { device_name, image },
        Err(e) => CaptureOutcome::Failed {
            device_name,
            error: e.to_string(),
        },
    }
}

async fn run_capture(
    context: &ExecutionContext,
    request: &CaptureRequest,
    budget: &TimeoutBudget,
) -> Result<Vec<u8>, CaptureError> {
    validate_url(&request.url)?;

    let page = context.new_page().await?;

    navigate(&page, &request.url, budget.navigation(request.timeout)).await?;
    stabilize(&page, request, budget.stabilize(request.timeout)).await;
    capture_image(&page, request.full_page, budget.capture(request.timeout)).await
}

fn validate_url(url: &str) -> Result<(), CaptureError> {
    let parsed =
        url::Url::parse(url).map_err(|_| CaptureError::InvalidUrl(url.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(CaptureError::InvalidUrl(format!(
            "{url} (invalid protocol: {scheme})"
        ))),
    }
}

/// Load the URL and wait for navigation to settle, bounded by `limit`.
async fn navigate(page: &Page, url: &str, limit: Duration) -> Result<(), CaptureError> {
    let load = async {
        page.goto(url)
            .await
            .map_err(|e| CaptureError::Navigation(e.to_string()))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| CaptureError::Navigation(e.to_string()))?;
        Ok::<(), CaptureError>(())
    };

    match timeout(limit, load).await {
        Ok(result) => result,
        Err(_) => Err(CaptureError::Timeout(limit)),
    }
}

/// Post-idle wait, overlay suppression, and the lazy-content scroll pass,
/// sharing one budget. Best-effort: an exhausted budget or a script failure
/// aborts the pass and capture proceeds with whatever content loaded.
async fn stabilize(page: &Page, request: &CaptureRequest, limit: Duration) {
    let deadline = Instant::now() + limit;

    sleep(request.post_idle_wait.min(limit)).await;

    if request.hide_overlays && Instant::now() < deadline {
        if let Err(e) = overlays::hide_overlays(page).await {
            debug!("overlay suppression failed: {e}");
        }
    }

    if request.scroll_for_lazy_content {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if !remaining.is_zero() {
            if let Err(e) = scroll_for_lazy_content(
                page,
                request.device.height,
                request.max_scroll_iterations,
                remaining,
            )
            .await
            {
                debug!("lazy-content scroll pass aborted: {e}");
            }
        }
    }
}

/// Take the screenshot, bounded by `limit`, with CSS animations frozen.
async fn capture_image(
    page: &Page,
    full_page: bool,
    limit: Duration,
) -> Result<Vec<u8>, CaptureError> {
    if let Err(e) = overlays::disable_animations(page).await {
        debug!("could not disable animations: {e}");
    }

    let params = ScreenshotParams::builder()
        .format(CaptureScreenshotFormat::Png)
        .full_page(full_page)
        .build();

    match timeout(limit, page.screenshot(params)).await {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(e)) => Err(CaptureError::Capture(e.to_string())),
        Err(_) => Err(CaptureError::Timeout(limit)),
    }
}
