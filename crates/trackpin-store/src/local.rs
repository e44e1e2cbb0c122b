//! Local durable blob store.
//!
//! The last-resort backend: when every remote pinning path fails, bytes are
//! written to a local keyed store so the user's track is not lost. Ids are
//! freshly generated per put; the local store is not content-addressed, so
//! uploading identical bytes twice yields two records. Records are removed
//! only by explicit user action; there is no automated eviction.

use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use trackpin_core::{
    BackendKind, ContentId, LocalBlobRecord, UploadError, UploadOutcome, UploadRequest,
};

use crate::traits::{ContentStore, ProgressCallback};

#[derive(Clone)]
pub struct LocalBlobStore {
    base_path: PathBuf,
    quota_bytes: u64,
    /// Serializes the quota check with the write that follows it, so
    /// concurrent puts cannot jointly overshoot the quota.
    put_lock: Arc<Mutex<()>>,
}

impl LocalBlobStore {
    /// Create a store rooted at `base_path`, holding at most `quota_bytes`
    /// of payload data.
    pub async fn new(base_path: impl Into<PathBuf>, quota_bytes: u64) -> Result<Self, UploadError> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            UploadError::Transient(format!(
                "Failed to create local store directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(Self {
            base_path,
            quota_bytes,
            put_lock: Arc::new(Mutex::new(())),
        })
    }

    fn payload_path(&self, id: &Uuid) -> PathBuf {
        self.base_path.join(format!("{}.bin", id))
    }

    fn record_path(&self, id: &Uuid) -> PathBuf {
        self.base_path.join(format!("{}.json", id))
    }

    /// Sum of stored payload sizes. Sidecar records are not counted against
    /// the quota.
    pub async fn usage_bytes(&self) -> Result<u64, UploadError> {
        let mut total = 0u64;
        let mut entries = fs::read_dir(&self.base_path)
            .await
            .map_err(|e| UploadError::Transient(format!("Failed to read local store: {}", e)))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| UploadError::Transient(format!("Failed to read local store: {}", e)))?
        {
            if entry.path().extension().is_some_and(|ext| ext == "bin") {
                if let Ok(meta) = entry.metadata().await {
                    total += meta.len();
                }
            }
        }
        Ok(total)
    }

    /// Read the sidecar record for a local id, if present.
    pub async fn record(&self, id: &ContentId) -> Result<Option<LocalBlobRecord>, UploadError> {
        let ContentId::Local(uuid) = id else {
            return Ok(None);
        };
        let path = self.record_path(uuid);
        match fs::read(&path).await {
            Ok(data) => {
                let record = serde_json::from_slice(&data).map_err(|e| {
                    UploadError::Transient(format!(
                        "Corrupt record {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(Some(record))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(UploadError::Transient(format!(
                "Failed to read record {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Delete a stored blob and its record. Explicit user action only.
    /// Deleting an id that is absent (or remote) is not an error.
    pub async fn delete(&self, id: &ContentId) -> Result<(), UploadError> {
        let ContentId::Local(uuid) = id else {
            return Ok(());
        };
        for path in [self.payload_path(uuid), self.record_path(uuid)] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(UploadError::Transient(format!(
                        "Failed to delete {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }
        tracing::info!(id = %id, "Local blob deleted");
        Ok(())
    }

    async fn write_payload(&self, path: &Path, bytes: &[u8]) -> Result<(), UploadError> {
        let mut file = fs::File::create(path)
            .await
            .map_err(|e| map_write_error(path, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| map_write_error(path, e))?;
        file.sync_all()
            .await
            .map_err(|e| map_write_error(path, e))?;
        Ok(())
    }
}

fn map_write_error(path: &Path, e: std::io::Error) -> UploadError {
    if e.kind() == ErrorKind::StorageFull {
        UploadError::QuotaExceeded(format!("Filesystem full writing {}: {}", path.display(), e))
    } else {
        UploadError::Transient(format!("Failed to write {}: {}", path.display(), e))
    }
}

#[async_trait]
impl ContentStore for LocalBlobStore {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn put(
        &self,
        request: &UploadRequest,
        on_progress: Option<ProgressCallback>,
    ) -> Result<UploadOutcome, UploadError> {
        let size = request.bytes.len() as u64;

        let _guard = self.put_lock.lock().await;

        // Quota is checked before any byte lands on disk.
        let usage = self.usage_bytes().await?;
        if usage + size > self.quota_bytes {
            return Err(UploadError::QuotaExceeded(format!(
                "Store holds {} bytes, adding {} would exceed the {} byte quota",
                usage, size, self.quota_bytes
            )));
        }

        let uuid = Uuid::new_v4();
        let id = ContentId::Local(uuid);

        let start = std::time::Instant::now();

        self.write_payload(&self.payload_path(&uuid), &request.bytes)
            .await?;

        let record = LocalBlobRecord {
            id: id.clone(),
            name: request.file_name.clone(),
            size_bytes: size,
            content_type: request.content_type.clone(),
            metadata: request.custom_metadata.clone(),
            stored_at: Utc::now(),
        };
        let record_json = serde_json::to_vec(&record)
            .map_err(|e| UploadError::Transient(format!("Failed to encode record: {}", e)))?;
        self.write_payload(&self.record_path(&uuid), &record_json)
            .await?;

        if let Some(progress) = &on_progress {
            progress(100);
        }

        tracing::info!(
            id = %id,
            name = %request.file_name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local store put successful"
        );

        Ok(UploadOutcome {
            content_id: id,
            size_bytes: size,
            completed_at: record.stored_at,
            backend: BackendKind::Local,
            deduplicated: false,
            prior_failures: Vec::new(),
        })
    }

    async fn get(&self, id: &ContentId) -> Result<Option<Vec<u8>>, UploadError> {
        let ContentId::Local(uuid) = id else {
            // Remote bytes are fetched from a gateway, never from here.
            return Ok(None);
        };
        let path = self.payload_path(uuid);
        match fs::read(&path).await {
            Ok(data) => {
                tracing::debug!(id = %id, size_bytes = data.len(), "Local store get successful");
                Ok(Some(data))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(UploadError::Transient(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
