//! Upload orchestration.
//!
//! Drives one upload through validation, metadata extraction, the
//! priority-ordered backend chain, and post-upload verification. Every
//! collaborator is injected, so tests can swap any stage for a double.

use std::sync::Arc;

use trackpin_core::models::{BackendKind, ContentId, UploadOutcome, UploadRequest};
use trackpin_core::{AttemptFailure, UploadError};
use trackpin_store::{ContentStore, ProgressCallback, RemoteVerifier};

use crate::probe::AudioProbe;
use crate::validator::AudioValidator;

/// Lifecycle notifications emitted as an upload moves through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPhase {
    Validating,
    ExtractingMetadata,
    AttemptingBackend { index: usize, backend: BackendKind },
    Verifying,
    Succeeded,
    Failed,
}

pub type PhaseObserver = Arc<dyn Fn(&UploadPhase) + Send + Sync>;

/// Per-upload observer hooks. Both are optional and default to silent.
#[derive(Default, Clone)]
pub struct UploadContext {
    pub on_progress: Option<ProgressCallback>,
    pub on_phase: Option<PhaseObserver>,
}

impl UploadContext {
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn with_phase_observer(mut self, observer: PhaseObserver) -> Self {
        self.on_phase = Some(observer);
        self
    }

    fn phase(&self, phase: UploadPhase) {
        if let Some(observer) = &self.on_phase {
            observer(&phase);
        }
    }
}

pub struct UploadOrchestrator {
    validator: AudioValidator,
    probe: Arc<dyn AudioProbe>,
    backends: Vec<Arc<dyn ContentStore>>,
    verifier: Option<Arc<dyn RemoteVerifier>>,
}

impl UploadOrchestrator {
    pub fn new(
        validator: AudioValidator,
        probe: Arc<dyn AudioProbe>,
        backends: Vec<Arc<dyn ContentStore>>,
        verifier: Option<Arc<dyn RemoteVerifier>>,
    ) -> Self {
        Self {
            validator,
            probe,
            backends,
            verifier,
        }
    }

    /// Run the full pipeline. Returns the first successful backend's outcome,
    /// or `AllBackendsFailed` carrying every attempt's failure.
    pub async fn upload(
        &self,
        request: UploadRequest,
        context: UploadContext,
    ) -> Result<UploadOutcome, UploadError> {
        let result = self.run(request, &context).await;
        match &result {
            Ok(_) => context.phase(UploadPhase::Succeeded),
            Err(_) => context.phase(UploadPhase::Failed),
        }
        result
    }

    async fn run(
        &self,
        mut request: UploadRequest,
        context: &UploadContext,
    ) -> Result<UploadOutcome, UploadError> {
        context.phase(UploadPhase::Validating);
        self.validator.validate(&request)?;

        context.phase(UploadPhase::ExtractingMetadata);
        let properties = self.probe.probe(&request.bytes, &request.content_type).await;
        for (key, value) in properties.to_metadata_entries() {
            // Caller-supplied metadata wins over probed values.
            request.custom_metadata.entry(key).or_insert(value);
        }

        let mut attempts: Vec<AttemptFailure> = Vec::new();
        for (index, backend) in self.backends.iter().enumerate() {
            let kind = backend.backend_kind();
            context.phase(UploadPhase::AttemptingBackend {
                index,
                backend: kind,
            });
            tracing::info!(
                backend = %kind,
                file_name = %request.file_name,
                size_bytes = request.size_bytes,
                "attempting upload backend"
            );

            match backend.put(&request, context.on_progress.clone()).await {
                Ok(mut outcome) => {
                    if outcome.backend.is_remote() {
                        self.verify_remote(&outcome.content_id, context).await;
                    }
                    // Progress-capable backends may stop short of 100 when
                    // the transport buffers the tail; pin the terminal value.
                    if backend.supports_progress() {
                        if let Some(progress) = &context.on_progress {
                            progress(100);
                        }
                    }
                    tracing::info!(
                        backend = %outcome.backend,
                        content_id = %outcome.content_id,
                        deduplicated = outcome.deduplicated,
                        prior_failures = attempts.len(),
                        "upload complete"
                    );
                    outcome.prior_failures = attempts;
                    return Ok(outcome);
                }
                Err(err) => {
                    tracing::warn!(backend = %kind, error = %err, "backend failed, falling through");
                    attempts.push(AttemptFailure {
                        backend: kind,
                        retryable: err.is_retryable(),
                        error: err.to_string(),
                    });
                }
            }
        }

        Err(UploadError::AllBackendsFailed { attempts })
    }

    async fn verify_remote(&self, id: &ContentId, context: &UploadContext) {
        let (Some(verifier), ContentId::Remote(hash)) = (&self.verifier, id) else {
            return;
        };
        context.phase(UploadPhase::Verifying);
        if !verifier.verify(hash).await {
            // Inconclusive: gateways can lag freshly pinned content.
            tracing::warn!(hash = %hash, "uploaded content not yet visible on gateway");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use trackpin_core::models::AudioProperties;
    use trackpin_store::LocalBlobStore;

    use crate::probe::{FixedProbe, WavProbe};

    fn wav_request(bytes: Vec<u8>) -> UploadRequest {
        UploadRequest::new(bytes, "take-one.wav", "audio/wav", "alice")
    }

    fn orchestrator(
        backends: Vec<Arc<dyn ContentStore>>,
        verifier: Option<Arc<dyn RemoteVerifier>>,
    ) -> UploadOrchestrator {
        UploadOrchestrator::new(
            AudioValidator::default(),
            Arc::new(FixedProbe(AudioProperties::default())),
            backends,
            verifier,
        )
    }

    /// Backend that always fails with a fixed error and counts its calls.
    struct FailingStore {
        kind: BackendKind,
        error: fn() -> UploadError,
        calls: AtomicUsize,
    }

    impl FailingStore {
        fn new(kind: BackendKind, error: fn() -> UploadError) -> Arc<Self> {
            Arc::new(Self {
                kind,
                error,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ContentStore for FailingStore {
        fn backend_kind(&self) -> BackendKind {
            self.kind
        }

        async fn put(
            &self,
            _request: &UploadRequest,
            _on_progress: Option<ProgressCallback>,
        ) -> Result<UploadOutcome, UploadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err((self.error)())
        }

        async fn get(&self, _id: &ContentId) -> Result<Option<Vec<u8>>, UploadError> {
            Ok(None)
        }
    }

    /// Remote backend double that derives the hash from the payload bytes,
    /// so identical payloads pin to the identical id.
    struct HashingStore {
        kind: BackendKind,
        seen: Mutex<HashSet<String>>,
    }

    impl HashingStore {
        fn new(kind: BackendKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                seen: Mutex::new(HashSet::new()),
            })
        }

        fn digest(bytes: &[u8]) -> String {
            let mut hash: u64 = 0xcbf29ce484222325;
            for b in bytes {
                hash ^= u64::from(*b);
                hash = hash.wrapping_mul(0x100000001b3);
            }
            format!("Qm{:016x}", hash)
        }
    }

    #[async_trait]
    impl ContentStore for HashingStore {
        fn backend_kind(&self) -> BackendKind {
            self.kind
        }

        async fn put(
            &self,
            request: &UploadRequest,
            _on_progress: Option<ProgressCallback>,
        ) -> Result<UploadOutcome, UploadError> {
            let hash = Self::digest(&request.bytes);
            let deduplicated = !self.seen.lock().unwrap().insert(hash.clone());
            Ok(UploadOutcome {
                content_id: ContentId::Remote(hash),
                size_bytes: request.size_bytes,
                completed_at: Utc::now(),
                backend: self.kind,
                deduplicated,
                prior_failures: Vec::new(),
            })
        }

        async fn get(&self, _id: &ContentId) -> Result<Option<Vec<u8>>, UploadError> {
            Ok(None)
        }
    }

    struct StubVerifier {
        answer: bool,
        called: AtomicBool,
    }

    #[async_trait]
    impl RemoteVerifier for StubVerifier {
        async fn verify(&self, _hash: &str) -> bool {
            self.called.store(true, Ordering::SeqCst);
            self.answer
        }
    }

    #[tokio::test]
    async fn invalid_file_touches_no_backend() {
        let backend = FailingStore::new(BackendKind::RemoteDirect, || {
            UploadError::Transient("unreachable".into())
        });
        let orch = orchestrator(vec![backend.clone()], None);

        let request = UploadRequest::new(vec![], "silence.wav", "audio/wav", "alice");
        let err = orch.upload(request, UploadContext::default()).await;

        assert!(matches!(err, Err(UploadError::InvalidFile(_))));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn falls_through_remotes_to_local() {
        let proxy = FailingStore::new(BackendKind::RemoteProxy, || {
            UploadError::ProxyUnavailable("connect refused".into())
        });
        let direct = FailingStore::new(BackendKind::RemoteDirect, || {
            UploadError::Transient("timeout".into())
        });
        let simple = FailingStore::new(BackendKind::RemoteSimple, || {
            UploadError::InvalidCredentials
        });
        let dir = tempfile::tempdir().unwrap();
        let local: Arc<dyn ContentStore> =
            Arc::new(LocalBlobStore::new(dir.path(), 10 * 1024 * 1024).await.unwrap());

        let orch = orchestrator(
            vec![proxy.clone(), direct.clone(), simple.clone(), local],
            None,
        );

        let outcome = orch
            .upload(wav_request(vec![7u8; 128]), UploadContext::default())
            .await
            .unwrap();

        assert_eq!(outcome.backend, BackendKind::Local);
        assert!(outcome.content_id.is_local());
        assert_eq!(proxy.calls.load(Ordering::SeqCst), 1);
        assert_eq!(direct.calls.load(Ordering::SeqCst), 1);
        assert_eq!(simple.calls.load(Ordering::SeqCst), 1);

        // The winning outcome carries the full failure history, in order.
        assert_eq!(outcome.prior_failures.len(), 3);
        assert_eq!(outcome.prior_failures[0].backend, BackendKind::RemoteProxy);
        assert!(outcome.prior_failures[0].error.contains("connect refused"));
        assert_eq!(outcome.prior_failures[1].backend, BackendKind::RemoteDirect);
        assert!(outcome.prior_failures[1].retryable);
        assert_eq!(outcome.prior_failures[2].backend, BackendKind::RemoteSimple);
        assert!(!outcome.prior_failures[2].retryable);
    }

    #[tokio::test]
    async fn first_backend_win_has_empty_failure_history() {
        let backend = HashingStore::new(BackendKind::RemoteDirect);
        let orch = orchestrator(vec![backend], None);

        let outcome = orch
            .upload(wav_request(vec![1u8; 16]), UploadContext::default())
            .await
            .unwrap();
        assert!(outcome.prior_failures.is_empty());
    }

    #[tokio::test]
    async fn same_bytes_pin_to_same_remote_id() {
        let backend = HashingStore::new(BackendKind::RemoteDirect);
        let orch = orchestrator(vec![backend], None);

        let first = orch
            .upload(wav_request(vec![1, 2, 3, 4]), UploadContext::default())
            .await
            .unwrap();
        let second = orch
            .upload(wav_request(vec![1, 2, 3, 4]), UploadContext::default())
            .await
            .unwrap();

        assert_eq!(first.content_id, second.content_id);
        assert!(!first.deduplicated);
        assert!(second.deduplicated);
    }

    #[tokio::test]
    async fn local_fallback_mints_distinct_ids_for_same_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let local: Arc<dyn ContentStore> =
            Arc::new(LocalBlobStore::new(dir.path(), 10 * 1024 * 1024).await.unwrap());
        let orch = orchestrator(vec![local], None);

        let first = orch
            .upload(wav_request(vec![9u8; 64]), UploadContext::default())
            .await
            .unwrap();
        let second = orch
            .upload(wav_request(vec![9u8; 64]), UploadContext::default())
            .await
            .unwrap();

        assert!(first.content_id.is_local());
        assert_ne!(first.content_id, second.content_id);
    }

    #[tokio::test]
    async fn terminal_error_reports_every_backend_failure() {
        let proxy = FailingStore::new(BackendKind::RemoteProxy, || {
            UploadError::ProxyUnavailable("connect refused".into())
        });
        let direct = FailingStore::new(BackendKind::RemoteDirect, || {
            UploadError::InvalidCredentials
        });
        let dir = tempfile::tempdir().unwrap();
        // Quota of one byte, so the local fallback fails too.
        let local: Arc<dyn ContentStore> = Arc::new(LocalBlobStore::new(dir.path(), 1).await.unwrap());

        let orch = orchestrator(vec![proxy, direct, local], None);
        let err = orch
            .upload(wav_request(vec![0u8; 256]), UploadContext::default())
            .await
            .unwrap_err();

        let UploadError::AllBackendsFailed { attempts } = &err else {
            panic!("expected AllBackendsFailed, got {err:?}");
        };
        assert_eq!(attempts.len(), 3);
        assert_eq!(attempts[0].backend, BackendKind::RemoteProxy);
        assert_eq!(attempts[1].backend, BackendKind::RemoteDirect);
        assert_eq!(attempts[2].backend, BackendKind::Local);

        let message = err.to_string();
        assert!(message.contains("connect refused"));
        assert!(message.contains("quota"));
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_ends_at_hundred() {
        let dir = tempfile::tempdir().unwrap();
        let local: Arc<dyn ContentStore> =
            Arc::new(LocalBlobStore::new(dir.path(), 10 * 1024 * 1024).await.unwrap());
        let orch = orchestrator(vec![local], None);

        let reports: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();
        let context = UploadContext::default()
            .with_progress(Arc::new(move |pct| sink.lock().unwrap().push(pct)));

        orch.upload(wav_request(vec![3u8; 512]), context)
            .await
            .unwrap();

        let reports = reports.lock().unwrap();
        assert!(!reports.is_empty());
        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*reports.last().unwrap(), 100);
    }

    /// Streams partial progress but never reaches 100 on its own.
    struct PartialProgressStore;

    #[async_trait]
    impl ContentStore for PartialProgressStore {
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
            if let Some(progress) = &on_progress {
                progress(40);
                progress(80);
            }
            Ok(UploadOutcome {
                content_id: ContentId::Remote("QmPartial".to_string()),
                size_bytes: request.size_bytes,
                completed_at: Utc::now(),
                backend: BackendKind::RemoteDirect,
                deduplicated: false,
                prior_failures: Vec::new(),
            })
        }

        async fn get(&self, _id: &ContentId) -> Result<Option<Vec<u8>>, UploadError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn progress_capable_winner_is_pinned_to_hundred() {
        let orch = orchestrator(vec![Arc::new(PartialProgressStore)], None);

        let reports: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();
        let context = UploadContext::default()
            .with_progress(Arc::new(move |pct| sink.lock().unwrap().push(pct)));

        orch.upload(wav_request(vec![1u8; 64]), context)
            .await
            .unwrap();

        let reports = reports.lock().unwrap();
        assert_eq!(*reports, vec![40, 80, 100]);
    }

    #[tokio::test]
    async fn non_progress_backend_gets_no_synthetic_reports() {
        let backend = HashingStore::new(BackendKind::RemoteSimple);
        let orch = orchestrator(vec![backend], None);

        let reports: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();
        let context = UploadContext::default()
            .with_progress(Arc::new(move |pct| sink.lock().unwrap().push(pct)));

        orch.upload(wav_request(vec![1u8; 64]), context)
            .await
            .unwrap();

        assert!(reports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn remote_success_is_verified() {
        let backend = HashingStore::new(BackendKind::RemoteSimple);
        let verifier = Arc::new(StubVerifier {
            answer: true,
            called: AtomicBool::new(false),
        });
        let orch = orchestrator(vec![backend], Some(verifier.clone()));

        orch.upload(wav_request(vec![5u8; 32]), UploadContext::default())
            .await
            .unwrap();

        assert!(verifier.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn failed_verification_does_not_fail_the_upload() {
        let backend = HashingStore::new(BackendKind::RemoteDirect);
        let verifier = Arc::new(StubVerifier {
            answer: false,
            called: AtomicBool::new(false),
        });
        let orch = orchestrator(vec![backend], Some(verifier));

        let outcome = orch
            .upload(wav_request(vec![5u8; 32]), UploadContext::default())
            .await;
        assert!(outcome.is_ok());
    }

    #[tokio::test]
    async fn local_success_skips_verification() {
        let dir = tempfile::tempdir().unwrap();
        let local: Arc<dyn ContentStore> =
            Arc::new(LocalBlobStore::new(dir.path(), 10 * 1024 * 1024).await.unwrap());
        let verifier = Arc::new(StubVerifier {
            answer: true,
            called: AtomicBool::new(false),
        });
        let orch = orchestrator(vec![local], Some(verifier.clone()));

        orch.upload(wav_request(vec![1u8; 16]), UploadContext::default())
            .await
            .unwrap();

        assert!(!verifier.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn phases_are_emitted_in_pipeline_order() {
        let backend = HashingStore::new(BackendKind::RemoteDirect);
        let orch = orchestrator(vec![backend], None);

        let phases: Arc<Mutex<Vec<UploadPhase>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = phases.clone();
        let context = UploadContext::default()
            .with_phase_observer(Arc::new(move |p| sink.lock().unwrap().push(p.clone())));

        orch.upload(wav_request(vec![2u8; 16]), context)
            .await
            .unwrap();

        let phases = phases.lock().unwrap();
        assert_eq!(
            *phases,
            vec![
                UploadPhase::Validating,
                UploadPhase::ExtractingMetadata,
                UploadPhase::AttemptingBackend {
                    index: 0,
                    backend: BackendKind::RemoteDirect
                },
                UploadPhase::Succeeded,
            ]
        );
    }

    #[tokio::test]
    async fn probed_properties_do_not_override_caller_metadata() {
        let backend = HashingStore::new(BackendKind::RemoteDirect);
        let seen: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

        struct CapturingStore {
            inner: Arc<HashingStore>,
            seen: Arc<Mutex<Option<String>>>,
        }

        #[async_trait]
        impl ContentStore for CapturingStore {
            fn backend_kind(&self) -> BackendKind {
                self.inner.backend_kind()
            }

            async fn put(
                &self,
                request: &UploadRequest,
                on_progress: Option<ProgressCallback>,
            ) -> Result<UploadOutcome, UploadError> {
                *self.seen.lock().unwrap() =
                    request.custom_metadata.get("duration").cloned();
                self.inner.put(request, on_progress).await
            }

            async fn get(&self, id: &ContentId) -> Result<Option<Vec<u8>>, UploadError> {
                self.inner.get(id).await
            }
        }

        let orch = UploadOrchestrator::new(
            AudioValidator::default(),
            Arc::new(FixedProbe(AudioProperties {
                duration_seconds: Some(30.0),
                sample_rate: None,
                channels: None,
            })),
            vec![Arc::new(CapturingStore {
                inner: backend,
                seen: seen.clone(),
            })],
            None,
        );

        let request = wav_request(vec![1u8; 16]).with_metadata("duration", "12.000");
        orch.upload(request, UploadContext::default()).await.unwrap();

        assert_eq!(seen.lock().unwrap().as_deref(), Some("12.000"));
    }

    #[tokio::test]
    async fn full_fallback_scenario_with_real_probe() {
        // Proxy and direct lose to network failures; the simple path pins.
        let proxy = FailingStore::new(BackendKind::RemoteProxy, || {
            UploadError::ProxyUnavailable("connect refused".into())
        });
        let direct = FailingStore::new(BackendKind::RemoteDirect, || {
            UploadError::Transient("connection reset".into())
        });
        let simple = HashingStore::new(BackendKind::RemoteSimple);

        let scratch = tempfile::tempdir().unwrap();
        let orch = UploadOrchestrator::new(
            AudioValidator::default(),
            Arc::new(WavProbe::new(
                scratch.path(),
                std::time::Duration::from_secs(5),
            )),
            vec![proxy.clone(), direct.clone(), simple],
            None,
        );

        let bytes = crate::probe::wav_fixture(44_100, 2);
        let request = UploadRequest::new(bytes, "take-one.wav", "audio/wav", "alice")
            .with_project_id("42");

        let phases: Arc<Mutex<Vec<UploadPhase>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = phases.clone();
        let context = UploadContext::default()
            .with_phase_observer(Arc::new(move |p| sink.lock().unwrap().push(p.clone())));

        let outcome = orch.upload(request, context).await.unwrap();

        assert_eq!(outcome.backend, BackendKind::RemoteSimple);
        assert!(matches!(outcome.content_id, ContentId::Remote(_)));
        assert_eq!(proxy.calls.load(Ordering::SeqCst), 1);
        assert_eq!(direct.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.prior_failures.len(), 2);
        assert_eq!(outcome.prior_failures[0].backend, BackendKind::RemoteProxy);
        assert_eq!(outcome.prior_failures[1].backend, BackendKind::RemoteDirect);
        assert!(outcome.prior_failures[1].error.contains("connection reset"));

        let phases = phases.lock().unwrap();
        let attempted: Vec<_> = phases
            .iter()
            .filter_map(|p| match p {
                UploadPhase::AttemptingBackend { backend, .. } => Some(*backend),
                _ => None,
            })
            .collect();
        assert_eq!(
            attempted,
            vec![
                BackendKind::RemoteProxy,
                BackendKind::RemoteDirect,
                BackendKind::RemoteSimple
            ]
        );
        // Scratch file from the probe is gone once the upload settles.
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}
