//! Error types and retry classification
//!
//! `CaptureError` carries the raw failure signal from the rendering engine;
//! `classify` decides whether a failed capture is worth retrying. The
//! classification table matches substrings case-insensitively and is a
//! heuristic: a message that merely mentions "timeout" classifies as
//! retryable even if the timeout was incidental. The table is deliberately
//! not tightened beyond what the raw engine signals warrant.

use std::time::Duration;
use thiserror::Error;

/// Failure in one phase of a capture operation.
///
/// The navigation, script, and capture variants display the engine's raw
/// signal text verbatim so downstream classification and formatting see the
/// unmodified message.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("context creation failed: {0}")]
    ContextFailed(String),

    #[error("{0}")]
    Navigation(String),

    #[error("{0}")]
    Script(String),

    #[error("{0}")]
    Capture(String),

    #[error("timeout {}ms exceeded", .0.as_millis())]
    Timeout(Duration),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Retry verdict for a failure signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Retryable,
    NonRetryable,
}

/// Ordered classification rules; first match governs.
///
/// Permanent failures (bad DNS, broken certificates, malformed URLs, client
/// errors) come first so they are never shadowed by the broader transient
/// patterns below them.
const CLASSIFICATION_RULES: &[(&str, Verdict)] = &[
    // Permanent failures
    ("err_name_not_resolved", Verdict::NonRetryable),
    ("err_cert_", Verdict::NonRetryable),
    ("invalid url", Verdict::NonRetryable),
    ("invalid protocol", Verdict::NonRetryable),
    ("401", Verdict::NonRetryable),
    ("403", Verdict::NonRetryable),
    ("404", Verdict::NonRetryable),
    // Transient failures
    ("timeout", Verdict::Retryable),
    ("exceeded", Verdict::Retryable),
    ("err_connection_reset", Verdict::Retryable),
    ("502", Verdict::Retryable),
    ("503", Verdict::Retryable),
];

/// Classify a raw failure signal as retryable or not.
///
/// An absent signal is non-retryable (there is nothing to retry against);
/// an unclassified signal defaults to retryable.
pub fn classify(error: Option<&str>) -> Verdict {
    let Some(message) = error else {
        return Verdict::NonRetryable;
    };

    let lower = message.to_lowercase();
    for (pattern, verdict) in CLASSIFICATION_RULES {
        if lower.contains(pattern) {
            return *verdict;
        }
    }

    Verdict::Retryable
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_signal_is_not_retryable() {
        assert_eq!(classify(None), Verdict::NonRetryable);
    }

    #[test]
    fn dns_failures_are_not_retryable() {
        assert_eq!(
            classify(Some("net::ERR_NAME_NOT_RESOLVED")),
            Verdict::NonRetryable
        );
    }

    #[test]
    fn certificate_failures_are_not_retryable() {
        assert_eq!(
            classify(Some("net::ERR_CERT_AUTHORITY_INVALID")),
            Verdict::NonRetryable
        );
        assert_eq!(
            classify(Some("net::ERR_CERT_DATE_INVALID")),
            Verdict::NonRetryable
        );
    }

    #[test]
    fn malformed_urls_are_not_retryable() {
        assert_eq!(classify(Some("invalid url")), Verdict::NonRetryable);
        // Matching is case-insensitive.
        assert_eq!(classify(Some("Invalid URL")), Verdict::NonRetryable);
        assert_eq!(
            classify(Some("invalid protocol: ftp")),
            Verdict::NonRetryable
        );
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert_eq!(classify(Some("404 Not Found")), Verdict::NonRetryable);
        assert_eq!(classify(Some("403 Forbidden")), Verdict::NonRetryable);
        assert_eq!(classify(Some("401 Unauthorized")), Verdict::NonRetryable);
    }

    #[test]
    fn timeouts_are_retryable() {
        assert_eq!(
            classify(Some("Timeout 30000ms exceeded")),
            Verdict::Retryable
        );
        assert_eq!(classify(Some("Navigation timeout")), Verdict::Retryable);
    }

    #[test]
    fn connection_resets_are_retryable() {
        assert_eq!(
            classify(Some("net::ERR_CONNECTION_RESET")),
            Verdict::Retryable
        );
    }

    #[test]
    fn server_errors_are_retryable() {
        assert_eq!(
            classify(Some("503 Service Unavailable")),
            Verdict::Retryable
        );
        assert_eq!(classify(Some("502 Bad Gateway")), Verdict::Retryable);
    }

    #[test]
    fn unclassified_signals_default_to_retryable() {
        assert_eq!(classify(Some("Network error")), Verdict::Retryable);
        assert_eq!(classify(Some("something odd happened")), Verdict::Retryable);
    }

    #[test]
    fn timeout_error_message_lands_in_retryable_rules() {
        let error = CaptureError::Timeout(Duration::from_secs(18));
        assert_eq!(error.to_string(), "timeout 18000ms exceeded");
        assert_eq!(classify(Some(&error.to_string())), Verdict::Retryable);
    }

    #[test]
    fn invalid_url_error_message_lands_in_non_retryable_rules() {
        let error = CaptureError::InvalidUrl("ftp://example.com".to_string());
        assert_eq!(classify(Some(&error.to_string())), Verdict::NonRetryable);
    }
}
