//! Bounded retry around the capture operation
//!
//! Retry decisions are made here and only here, strictly from the
//! classifier's verdict. A non-retryable failure stops immediately no matter
//! how much retry budget remains; classification is final across attempts.

use crate::{
    classify, CaptureOutcome, CaptureRequest, Capturer, ExecutionResult, RetryPolicy, Verdict,
};
use tokio::time::sleep;
use tracing::debug;

/// Execute a capture with bounded retry, returning the unit's durable result.
///
/// `attempts` in the result equals the number of capture executions actually
/// performed: at least 1, at most `policy.max_attempts`.
pub async fn capture_with_retry<C>(
    capturer: &C,
    request: &CaptureRequest,
    policy: &RetryPolicy,
) -> ExecutionResult
where
    C: Capturer + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0usize;

    loop {
        attempts += 1;

        match capturer.capture(request).await {
            CaptureOutcome::Completed { device_name, image } => {
                return ExecutionResult {
                    device_name,
                    success: true,
                    image: Some(image),
                    error: None,
                    attempts,
                };
            }
            CaptureOutcome::Failed { device_name, error } => {
                let verdict = classify(Some(&error));

                if verdict == Verdict::NonRetryable || attempts >= max_attempts {
                    if verdict == Verdict::NonRetryable {
                        debug!(device = %device_name, "failure is not retryable: {error}");
                    }
                    return ExecutionResult {
                        device_name,
                        success: false,
                        image: None,
                        error: Some(error),
                        attempts,
                    };
                }

                debug!(
                    device = %device_name,
                    "retrying after {:?} (attempt {attempts}/{max_attempts}): {error}",
                    policy.delay
                );
                sleep(policy.delay).await;
            }
        }
    }
}
