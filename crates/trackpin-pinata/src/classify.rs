//! HTTP failure classification.
//!
//! The one place where transport results become [`UploadError`] variants.
//! Callers branch on the variant; message text is never re-parsed downstream.

use reqwest::StatusCode;

use trackpin_core::UploadError;

/// Classify a non-success HTTP status from the pinning API (or its proxy).
///
/// 401/403 are credential failures and 413 a plan-size rejection; neither is
/// retryable at the current backend. 429 and 5xx are retryable in place.
/// Remaining 4xx responses (e.g. a malformed optional field in the richer
/// request) are surfaced as transient so the orchestrator falls through to
/// the lower-fidelity variant.
pub fn classify_status(status: StatusCode, body: &str) -> UploadError {
    match status.as_u16() {
        401 | 403 => UploadError::InvalidCredentials,
        413 => UploadError::PayloadTooLarge,
        429 => UploadError::RateLimited,
        code => UploadError::Transient(format!("HTTP {}: {}", code, truncate(body, 200))),
    }
}

/// Classify a transport-level reqwest failure (no HTTP status available).
pub fn classify_transport(err: reqwest::Error) -> UploadError {
    if err.is_timeout() {
        UploadError::Transient("request timed out".to_string())
    } else if err.is_connect() {
        UploadError::Transient(format!("network unreachable: {}", err))
    } else {
        UploadError::Transient(err.to_string())
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
