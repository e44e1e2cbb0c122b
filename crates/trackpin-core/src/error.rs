//! Error types module
//!
//! All upload-pipeline failures are unified under [`UploadError`]. Each
//! backend failure is classified into a variant once, at the transport
//! boundary, and carried end-to-end; callers branch on the variant, never on
//! message text. The orchestrator additionally preserves the per-backend
//! failure chain in [`AttemptFailure`] records so a terminal error can report
//! which backends were tried and why each failed.

use crate::models::BackendKind;

/// Validation failures raised before any network or storage call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("No file provided")]
    MissingFile,

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Unsupported audio format: {content_type} (allowed: {allowed:?})")]
    UnsupportedContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("File name too long: {len} characters (max: {max})")]
    FileNameTooLong { len: usize, max: usize },
}

/// One failed backend attempt, retained for diagnostics after fallthrough.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AttemptFailure {
    pub backend: BackendKind,
    pub error: String,
    pub retryable: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid file: {0}")]
    InvalidFile(#[from] ValidationError),

    #[error("Invalid API credentials")]
    InvalidCredentials,

    #[error("Payload too large for the pinning plan")]
    PayloadTooLarge,

    #[error("Rate limited by the pinning service")]
    RateLimited,

    #[error("Transient upload failure: {0}")]
    Transient(String),

    #[error("Backend proxy unavailable: {0}")]
    ProxyUnavailable(String),

    #[error("Local storage quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("No upload path succeeded ({})", summarize_attempts(.attempts))]
    AllBackendsFailed { attempts: Vec<AttemptFailure> },
}

fn summarize_attempts(attempts: &[AttemptFailure]) -> String {
    if attempts.is_empty() {
        return "no backends attempted".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.backend, a.error))
        .collect::<Vec<_>>()
        .join("; ")
}

impl UploadError {
    /// Whether the current backend may retry this error in place. Everything
    /// else falls through to the next backend immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, UploadError::RateLimited | UploadError::Transient(_))
    }
}
