//! Bounded-concurrency scheduler
//!
//! Fans capture units out over the device/request list under a semaphore
//! bound, publishes per-completion progress events, and aggregates results
//! in input order. A single unit's failure never aborts the batch; every
//! input yields exactly one result.

use crate::{
    capture_with_retry, AggregateResult, BrowserManager, CaptureError, CaptureRequest, Capturer,
    DeviceProfile, ExecutionResult, RetryPolicy, ScreenshotCapturer,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

/// Lowest accepted concurrency bound.
pub const MIN_CONCURRENCY: usize = 1;
/// Highest accepted concurrency bound; caps open contexts against the
/// shared engine.
pub const MAX_CONCURRENCY: usize = 50;
/// Default simultaneous in-flight units.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Published once per completed unit, after its result is finalized.
///
/// Completion order is not input order; `device_name` identifies the unit
/// so callers never have to infer identity positionally.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub completed: usize,
    pub total: usize,
    pub device_name: String,
    pub success: bool,
}

/// Options for a batch run.
pub struct ExecutionOptions {
    /// Simultaneous in-flight units, validated to `1..=50`.
    pub concurrency: usize,
    pub retry: RetryPolicy,
    /// Receives one [`ProgressEvent`] per completed unit when set.
    pub progress: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            retry: RetryPolicy::default(),
            progress: None,
        }
    }
}

/// Run every request under the concurrency bound and aggregate the results.
///
/// The returned `results` preserve input order regardless of completion
/// order, with exactly one entry per request. Unit failures are reported
/// inline; the only error this function itself returns is an invalid
/// configuration.
pub async fn run_all<C>(
    capturer: Arc<C>,
    requests: Vec<CaptureRequest>,
    options: ExecutionOptions,
) -> Result<AggregateResult, CaptureError>
where
    C: Capturer + ?Sized + 'static,
{
    if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&options.concurrency) {
        return Err(CaptureError::Configuration(format!(
            "concurrency must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}, got {}",
            options.concurrency
        )));
    }

    let total = requests.len();
    info!(
        total,
        concurrency = options.concurrency,
        "starting capture batch"
    );

    // Device names are kept aside so a lost task can still be accounted for.
    let device_names: Vec<String> = requests.iter().map(|r| r.device.name.clone()).collect();

    let semaphore = Arc::new(Semaphore::new(options.concurrency));
    let completed = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = requests
        .into_iter()
        .enumerate()
        .map(|(index, request)| {
            let capturer = capturer.clone();
            let semaphore = semaphore.clone();
            let completed = completed.clone();
            let retry = options.retry.clone();
            let progress = options.progress.clone();

            tokio::spawn(async move {
                // Slot admission: at most `concurrency` units are mid-phase.
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => capture_with_retry(capturer.as_ref(), &request, &retry).await,
                    // The semaphore is never closed while tasks run. No
                    // capture executed, so the placeholder reports 0 attempts.
                    Err(_) => ExecutionResult {
                        device_name: request.device.name.clone(),
                        success: false,
                        image: None,
                        error: Some("scheduler shut down".to_string()),
                        attempts: 0,
                    },
                };

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(progress) = &progress {
                    let _ = progress.send(ProgressEvent {
                        completed: done,
                        total,
                        device_name: result.device_name.clone(),
                        success: result.success,
                    });
                }

                (index, result)
            })
        })
        .collect();

    let mut slots: Vec<Option<ExecutionResult>> = (0..total).map(|_| None).collect();
    for task in tasks {
        match task.await {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => warn!("capture task aborted: {e}"),
        }
    }

    let results: Vec<ExecutionResult> = slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            // A lost task never reported back; `attempts` stays 0 because no
            // execution count survived to report.
            slot.unwrap_or_else(|| ExecutionResult {
                device_name: device_names[index].clone(),
                success: false,
                image: None,
                error: Some("capture task aborted".to_string()),
                attempts: 0,
            })
        })
        .collect();

    let success_count = results.iter().filter(|r| r.success).count();
    let failure_count = total - success_count;
    let total_attempts = results.iter().map(|r| r.attempts).sum();

    info!(success_count, failure_count, "capture batch finished");

    Ok(AggregateResult {
        results,
        success_count,
        failure_count,
        total_attempts,
    })
}

/// Capture one URL across a list of device profiles.
///
/// Builds one default [`CaptureRequest`] per profile and runs the batch
/// with a production capturer on `manager`.
pub async fn capture_all_devices(
    manager: Arc<BrowserManager>,
    url: &str,
    devices: &[DeviceProfile],
    options: ExecutionOptions,
) -> Result<AggregateResult, CaptureError> {
    let capturer = Arc::new(ScreenshotCapturer::new(manager));
    let requests = devices
        .iter()
        .map(|device| CaptureRequest::new(url, device.clone()))
        .collect();
    run_all(capturer, requests, options).await
}
