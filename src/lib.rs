//! # viewshot
//!
//! Captures a URL across many device profiles against a single shared
//! headless Chrome instance, with bounded concurrency, per-phase timeout
//! budgeting, and classification-driven retry. The library collects a
//! complete result set even when individual captures fail: every request
//! yields exactly one [`ExecutionResult`], in input order.
//!
//! The rendering itself is Chrome's; this crate only sequences calls into
//! the engine (via `chromiumoxide`) and manages lifecycle, concurrency, and
//! failure around them. Output persistence and reporting are downstream
//! consumers of [`AggregateResult`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use viewshot::{
//!     capture_all_devices, BrowserManager, DeviceCategory, DeviceProfile, EngineConfig,
//!     ExecutionOptions,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = Arc::new(BrowserManager::new(EngineConfig::default()));
//!
//!     let devices = vec![DeviceProfile {
//!         name: "iPhone 14 Pro".to_string(),
//!         width: 393,
//!         height: 852,
//!         scale_factor: 3.0,
//!         category: DeviceCategory::Phone,
//!     }];
//!
//!     let batch = capture_all_devices(
//!         manager.clone(),
//!         "https://example.com",
//!         &devices,
//!         ExecutionOptions::default(),
//!     )
//!     .await?;
//!
//!     println!("{} captured, {} failed", batch.success_count, batch.failure_count);
//!     manager.close().await;
//!     Ok(())
//! }
//! ```

/// Configuration, device profiles, and result types
pub mod config;

/// Error types and retry classification
pub mod error;

/// Shared rendering-engine lifecycle and execution contexts
pub mod browser;

/// Single-unit capture operation and the `Capturer` seam
pub mod capture;

/// Lazy-content scroll pass
pub mod scroll;

/// Consent-banner and overlay suppression
pub mod overlays;

/// Bounded retry around the capture operation
pub mod retry;

/// Bounded-concurrency scheduler and aggregation
pub mod executor;


pub use browser::{BrowserManager, ExecutionContext};
pub use capture::{capture_screenshot, CaptureOutcome, Capturer, ScreenshotCapturer};
pub use config::{
    engine_args, AggregateResult, CaptureRequest, DeviceCategory, DeviceProfile, EngineConfig,
    ExecutionResult, RetryPolicy, TimeoutBudget, DEFAULT_MAX_SCROLL_ITERATIONS,
    DEFAULT_POST_IDLE_WAIT, DEFAULT_TIMEOUT,
};
pub use error::{classify, CaptureError, Verdict};
pub use executor::{
    capture_all_devices, run_all, ExecutionOptions, ProgressEvent, DEFAULT_CONCURRENCY,
    MAX_CONCURRENCY, MIN_CONCURRENCY,
};
pub use overlays::{hide_overlays, OVERLAY_SELECTORS};
pub use retry::capture_with_retry;
pub use scroll::scroll_for_lazy_content;
