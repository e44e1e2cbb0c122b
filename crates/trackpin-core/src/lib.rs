//! Trackpin Core Library
//!
//! This crate provides the domain models, error taxonomy, retry policy, and
//! configuration shared across all Trackpin components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod retry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AttemptFailure, UploadError, ValidationError};
pub use models::{
    AudioProperties, BackendKind, ContentId, LocalBlobRecord, UploadOutcome, UploadRequest,
};
pub use retry::RetryPolicy;
