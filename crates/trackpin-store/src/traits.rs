//! Content-store abstraction trait
//!
//! All backends (remote proxy/direct/simple pinning, local fallback) must
//! implement this trait. The orchestrator works with a priority-ordered list
//! of `Arc<dyn ContentStore>` without coupling to transport details.

use async_trait::async_trait;
use std::sync::Arc;

use trackpin_core::{BackendKind, ContentId, UploadError, UploadOutcome, UploadRequest};

/// Byte-level upload progress callback, invoked with 0–100.
///
/// Shared (`Arc`) because progress-capable backends move a clone into the
/// request body stream.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Which backend variant this store is, for outcome attribution and
    /// failure diagnostics.
    fn backend_kind(&self) -> BackendKind;

    /// Whether `put` reports byte-level progress through the callback.
    fn supports_progress(&self) -> bool {
        false
    }

    /// Persist the request's bytes and return a durable content identifier.
    ///
    /// Backends apply their own retry policy internally; an error returned
    /// here means the backend is exhausted and the orchestrator should fall
    /// through to the next one.
    async fn put(
        &self,
        request: &UploadRequest,
        on_progress: Option<ProgressCallback>,
    ) -> Result<UploadOutcome, UploadError>;

    /// Retrieve stored bytes for a previously produced identifier, or
    /// `Ok(None)` when this store does not hold them.
    async fn get(&self, id: &ContentId) -> Result<Option<Vec<u8>>, UploadError>;
}

/// Post-upload existence check for remote content identifiers.
///
/// A `false` result is inconclusive (gateway propagation delay), so callers
/// log it rather than failing the upload. Local identifiers are
/// self-verifying and never pass through here.
#[async_trait]
pub trait RemoteVerifier: Send + Sync {
    async fn verify(&self, hash: &str) -> bool;
}
