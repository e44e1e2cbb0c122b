//! Remote `ContentStore` backends.
//!
//! Thin adapters binding the Pinata client's put variants to the store trait.
//! Each applies the configured retry policy internally, so an error surfacing
//! from `put` means the backend is exhausted and the orchestrator should fall
//! through.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use trackpin_core::{
    BackendKind, ContentId, RetryPolicy, UploadError, UploadOutcome, UploadRequest,
};
use trackpin_store::{ContentStore, ProgressCallback};

use crate::client::{PinResponse, PinataClient};
use crate::proxy::ProxyClient;

fn remote_outcome(pin: PinResponse, backend: BackendKind, size_bytes: u64) -> UploadOutcome {
    UploadOutcome {
        content_id: ContentId::Remote(pin.ipfs_hash),
        size_bytes,
        completed_at: Utc::now(),
        backend,
        deduplicated: pin.is_duplicate,
        prior_failures: Vec::new(),
    }
}

async fn gateway_get(
    client: &PinataClient,
    id: &ContentId,
) -> Result<Option<Vec<u8>>, UploadError> {
    match id {
        ContentId::Remote(hash) => client.fetch(hash).await,
        ContentId::Local(_) => Ok(None),
    }
}

/// Tried first: pins via the collaboration backend's server-side operation.
pub struct ProxyPinBackend {
    proxy: ProxyClient,
    reader: Arc<PinataClient>,
    retry: RetryPolicy,
}

impl ProxyPinBackend {
    pub fn new(proxy: ProxyClient, reader: Arc<PinataClient>, retry: RetryPolicy) -> Self {
        Self {
            proxy,
            reader,
            retry,
        }
    }
}

#[async_trait]
impl ContentStore for ProxyPinBackend {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::RemoteProxy
    }

    async fn put(
        &self,
        request: &UploadRequest,
        _on_progress: Option<ProgressCallback>,
    ) -> Result<UploadOutcome, UploadError> {
        let pin = self
            .retry
            .run("pin-proxy", || self.proxy.upload(request))
            .await?;
        Ok(remote_outcome(pin, BackendKind::RemoteProxy, request.size_bytes))
    }

    async fn get(&self, id: &ContentId) -> Result<Option<Vec<u8>>, UploadError> {
        gateway_get(&self.reader, id).await
    }
}

/// The full-fidelity direct path: rich metadata envelope, pin options, and
/// byte-level progress.
pub struct DirectPinBackend {
    client: Arc<PinataClient>,
    retry: RetryPolicy,
}

impl DirectPinBackend {
    pub fn new(client: Arc<PinataClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }
}

#[async_trait]
impl ContentStore for DirectPinBackend {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::RemoteDirect
    }

    fn supports_progress(&self) -> bool {
        true
    }

    async fn put(
        &self,
        request: &UploadRequest,
        on_progress: Option<ProgressCallback>,
    ) -> Result<UploadOutcome, UploadError> {
        let pin = self
            .retry
            .run("pin-direct", || {
                self.client.put_direct(request, on_progress.clone())
            })
            .await?;
        Ok(remote_outcome(pin, BackendKind::RemoteDirect, request.size_bytes))
    }

    async fn get(&self, id: &ContentId) -> Result<Option<Vec<u8>>, UploadError> {
        gateway_get(&self.client, id).await
    }
}

/// Minimal-request fallback for when the direct variant's optional fields are
/// rejected.
pub struct SimplePinBackend {
    client: Arc<PinataClient>,
    retry: RetryPolicy,
}

impl SimplePinBackend {
    pub fn new(client: Arc<PinataClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }
}

#[async_trait]
impl ContentStore for SimplePinBackend {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::RemoteSimple
    }

    async fn put(
        &self,
        request: &UploadRequest,
        _on_progress: Option<ProgressCallback>,
    ) -> Result<UploadOutcome, UploadError> {
        let pin = self
            .retry
            .run("pin-simple", || self.client.put_simple(request))
            .await?;
        Ok(remote_outcome(pin, BackendKind::RemoteSimple, request.size_bytes))
    }

    async fn get(&self, id: &ContentId) -> Result<Option<Vec<u8>>, UploadError> {
        gateway_get(&self.client, id).await
    }
}
