//! Configuration and data model for capture runs
//!
//! Device profiles, per-unit capture requests, timeout budgeting, retry
//! policy, and the engine launch configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-unit timeout for a complete capture.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default wait after network idle before the page is considered stable.
pub const DEFAULT_POST_IDLE_WAIT: Duration = Duration::from_millis(500);

/// Default ceiling on lazy-content scroll passes.
pub const DEFAULT_MAX_SCROLL_ITERATIONS: usize = 10;

/// Device class of a profile, used to drive mobile emulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCategory {
    Phone,
    Tablet,
    Desktop,
}

/// A named viewport configuration to capture at.
///
/// Profiles are supplied externally (the catalog itself lives outside this
/// crate) and are not required to be unique within a batch: the same profile
/// may appear multiple times as distinct capture units.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceProfile {
    pub name: String,
    /// Viewport width in CSS pixels.
    pub width: u32,
    /// Viewport height in CSS pixels.
    pub height: u32,
    /// Device pixel ratio, 1.0 for standard displays.
    pub scale_factor: f64,
    pub category: DeviceCategory,
}

impl DeviceProfile {
    /// Whether the engine should emulate a mobile device for this profile.
    pub fn is_mobile(&self) -> bool {
        !matches!(self.category, DeviceCategory::Desktop)
    }
}

/// One capture unit: a URL rendered at one device profile.
///
/// Immutable for the lifetime of the unit; retries re-execute the same
/// request unchanged.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub url: String,
    pub device: DeviceProfile,
    /// Total time budget for the unit, split across phases by [`TimeoutBudget`].
    pub timeout: Duration,
    /// Extra wait after navigation settles, for late rendering.
    pub post_idle_wait: Duration,
    /// Run the lazy-content scroll pass before capturing.
    pub scroll_for_lazy_content: bool,
    pub max_scroll_iterations: usize,
    /// Suppress known consent-banner overlays before capturing.
    pub hide_overlays: bool,
    /// Capture the full scrollable page instead of the viewport.
    pub full_page: bool,
}

impl CaptureRequest {
    pub fn new(url: impl Into<String>, device: DeviceProfile) -> Self {
        Self {
            url: url.into(),
            device,
            timeout: DEFAULT_TIMEOUT,
            post_idle_wait: DEFAULT_POST_IDLE_WAIT,
            scroll_for_lazy_content: true,
            max_scroll_iterations: DEFAULT_MAX_SCROLL_ITERATIONS,
            hide_overlays: true,
            full_page: false,
        }
    }
}

/// Share of the per-unit timeout assigned to each capture phase.
///
/// The split is a policy decision, not a law; the defaults keep the
/// 60/25/15 division between navigation, stabilization, and the screenshot
/// itself.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct TimeoutBudget {
    pub navigation_share: f64,
    pub stabilize_share: f64,
    pub capture_share: f64,
}

impl Default for TimeoutBudget {
    fn default() -> Self {
        Self {
            navigation_share: 0.60,
            stabilize_share: 0.25,
            capture_share: 0.15,
        }
    }
}

impl TimeoutBudget {
    /// Budget for the navigation phase (page load up to network idle).
    pub fn navigation(&self, total: Duration) -> Duration {
        total.mul_f64(self.navigation_share)
    }

    /// Combined budget for the post-idle wait, overlay suppression, and
    /// lazy-content scroll pass.
    pub fn stabilize(&self, total: Duration) -> Duration {
        total.mul_f64(self.stabilize_share)
    }

    /// Budget for taking the screenshot.
    pub fn capture(&self, total: Duration) -> Duration {
        total.mul_f64(self.capture_share)
    }
}

/// Bounded retry policy for failed capture units.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryPolicy {
    /// Upper bound on capture executions per unit, minimum 1.
    pub max_attempts: usize,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// Launch configuration for the shared rendering engine.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Run the engine with a visible window instead of headless.
    pub headed: bool,
    /// Path to a Chrome/Chromium executable; auto-detected when `None`.
    pub chrome_path: Option<String>,
    /// Custom User-Agent for all contexts.
    pub user_agent: Option<String>,
}

/// Chrome command-line arguments for capture work.
pub fn engine_args(config: &EngineConfig) -> Vec<String> {
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-background-timer-throttling".to_string(),
        "--disable-backgrounding-occluded-windows".to_string(),
        "--disable-renderer-backgrounding".to_string(),
        "--disable-extensions".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-sync".to_string(),
        "--no-first-run".to_string(),
        "--hide-scrollbars".to_string(),
        "--mute-audio".to_string(),
    ];

    if !config.headed {
        args.push("--headless".to_string());
    }

    if let Some(user_agent) = &config.user_agent {
        args.push(format!("--user-agent={user_agent}"));
    }

    args
}

/// Durable record of one capture unit after retries are exhausted.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub device_name: String,
    pub success: bool,
    /// PNG bytes on success.
    pub image: Option<Vec<u8>>,
    /// Raw failure signal on failure, preserved verbatim.
    pub error: Option<String>,
    /// Number of capture executions actually performed for this unit.
    pub attempts: usize,
}

/// Aggregated outcome of a full batch run.
///
/// `results` has exactly one entry per input request, in input order.
#[derive(Debug, Clone)]
pub struct AggregateResult {
    pub results: Vec<ExecutionResult>,
    pub success_count: usize,
    pub failure_count: usize,
    pub total_attempts: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop() -> DeviceProfile {
        DeviceProfile {
            name: "Test Desktop".to_string(),
            width: 1920,
            height: 1080,
            scale_factor: 1.0,
            category: DeviceCategory::Desktop,
        }
    }

    #[test]
    fn request_defaults() {
        let request = CaptureRequest::new("https://example.com", desktop());
        assert_eq!(request.timeout, Duration::from_secs(30));
        assert_eq!(request.post_idle_wait, Duration::from_millis(500));
        assert!(request.scroll_for_lazy_content);
        assert_eq!(request.max_scroll_iterations, 10);
        assert!(request.hide_overlays);
        assert!(!request.full_page);
    }

    #[test]
    fn budget_split_of_thirty_seconds() {
        let budget = TimeoutBudget::default();
        let total = Duration::from_secs(30);
        assert_eq!(budget.navigation(total), Duration::from_secs(18));
        assert_eq!(budget.stabilize(total), Duration::from_millis(7500));
        assert_eq!(budget.capture(total), Duration::from_millis(4500));
    }

    #[test]
    fn mobile_emulation_follows_category() {
        let mut device = desktop();
        assert!(!device.is_mobile());
        device.category = DeviceCategory::Phone;
        assert!(device.is_mobile());
        device.category = DeviceCategory::Tablet;
        assert!(device.is_mobile());
    }

    #[test]
    fn retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_millis(500));
    }

    #[test]
    fn engine_args_headless_by_default() {
        let mut config = EngineConfig::default();
        assert!(engine_args(&config).contains(&"--headless".to_string()));
        config.headed = true;
        assert!(!engine_args(&config).contains(&"--headless".to_string()));
    }

    #[test]
    fn device_profile_roundtrips_through_serde() {
        let device = desktop();
        let json = serde_json::to_string(&device).expect("serializes");
        assert!(json.contains("\"desktop\""));
        let back: DeviceProfile = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back.name, device.name);
        assert_eq!(back.width, device.width);
    }
}
