//! Pinata API client.
//!
//! One reqwest client shared by the direct and simple upload variants and the
//! read-side helpers (verification probe, gateway fetch, pin metadata, unpin,
//! usage stats). Auth is two static headers on every API request.

use bytes::Bytes;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use trackpin_core::{Config, UploadError, UploadRequest};
use trackpin_store::ProgressCallback;

use crate::classify::{classify_status, classify_transport};
use crate::gateway::gateway_url;

const PIN_FILE_PATH: &str = "/pinning/pinFileToIPFS";

/// Chunk size for the progress-reporting body stream.
const PROGRESS_CHUNK_BYTES: usize = 64 * 1024;

/// Successful pin response from the Pinata API.
#[derive(Debug, Clone, Deserialize)]
pub struct PinResponse {
    #[serde(rename = "IpfsHash")]
    pub ipfs_hash: String,
    #[serde(rename = "PinSize")]
    pub pin_size: u64,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: String,
    #[serde(rename = "isDuplicate", default)]
    pub is_duplicate: bool,
}

#[derive(Clone)]
pub struct PinataClient {
    client: reqwest::Client,
    api_url: String,
    gateway_base: String,
    api_key: String,
    secret_api_key: String,
    probe_timeout: Duration,
}

impl PinataClient {
    pub fn new(config: &Config) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(config.upload_timeout)
            .build()
            .map_err(|e| UploadError::Transient(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.pinata_api_url.trim_end_matches('/').to_string(),
            gateway_base: config.gateway_url.clone(),
            api_key: config.pinata_api_key.clone(),
            secret_api_key: config.pinata_secret_api_key.clone(),
            probe_timeout: config.probe_timeout,
        })
    }

    pub fn gateway_base(&self) -> &str {
        &self.gateway_base
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("pinata_api_key", self.api_key.as_str())
            .header("pinata_secret_api_key", self.secret_api_key.as_str())
    }

    /// Direct upload: full metadata envelope, pin options, progress stream.
    pub async fn put_direct(
        &self,
        request: &UploadRequest,
        on_progress: Option<ProgressCallback>,
    ) -> Result<PinResponse, UploadError> {
        let form = Form::new()
            .part("file", file_part(request, on_progress.clone())?)
            .text("pinataMetadata", direct_metadata(request).to_string())
            .text("pinataOptions", pin_options().to_string());

        let pin = self.pin_file(form).await?;

        // The counting stream stops short of 100 when the transport buffers
        // the tail; the success path always lands on exactly 100.
        if let Some(progress) = &on_progress {
            progress(100);
        }

        tracing::info!(
            ipfs_hash = %pin.ipfs_hash,
            pin_size = pin.pin_size,
            is_duplicate = pin.is_duplicate,
            "Direct pin successful"
        );
        Ok(pin)
    }

    /// Simple upload: minimal metadata, no options, no progress reporting.
    /// Lower-fidelity fallback for when the richer request is rejected.
    pub async fn put_simple(&self, request: &UploadRequest) -> Result<PinResponse, UploadError> {
        let form = Form::new()
            .part("file", file_part(request, None)?)
            .text("pinataMetadata", simple_metadata(request).to_string());

        let pin = self.pin_file(form).await?;
        tracing::info!(
            ipfs_hash = %pin.ipfs_hash,
            pin_size = pin.pin_size,
            "Simple pin successful"
        );
        Ok(pin)
    }

    async fn pin_file(&self, form: Form) -> Result<PinResponse, UploadError> {
        let url = format!("{}{}", self.api_url, PIN_FILE_PATH);
        let response = self
            .authed(self.client.post(&url))
            .multipart(form)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| UploadError::Transient(format!("Invalid pin response: {}", e)))
    }

    /// Existence check against the canonical gateway URL. A `false` result is
    /// inconclusive (propagation delay); callers log it, never fail on it.
    /// One immediate check, no retry.
    pub async fn verify(&self, hash: &str) -> bool {
        let url = gateway_url(&self.gateway_base, hash);
        match self
            .client
            .head(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(hash = %hash, error = %e, "Verification probe failed");
                false
            }
        }
    }

    /// Fetch pinned bytes through the gateway (playback path).
    pub async fn fetch(&self, hash: &str) -> Result<Option<Vec<u8>>, UploadError> {
        let url = gateway_url(&self.gateway_base, hash);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(classify_transport)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }
        let bytes = response.bytes().await.map_err(classify_transport)?;
        Ok(Some(bytes.to_vec()))
    }

    /// Check the configured credentials against the API.
    pub async fn test_authentication(&self) -> Result<(), UploadError> {
        let url = format!("{}/data/testAuthentication", self.api_url);
        let response = self
            .authed(self.client.get(&url))
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }
        Ok(())
    }

    /// Pin record for a hash, if the account has one.
    pub async fn pin_metadata(
        &self,
        hash: &str,
    ) -> Result<Option<serde_json::Value>, UploadError> {
        let url = format!("{}/data/pinList", self.api_url);
        let response = self
            .authed(self.client.get(&url))
            .query(&[("hashContains", hash)])
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| UploadError::Transient(format!("Invalid pinList response: {}", e)))?;
        Ok(body
            .get("rows")
            .and_then(|rows| rows.as_array())
            .and_then(|rows| rows.first())
            .cloned())
    }

    /// Unpin a hash (delete on the pinning service).
    pub async fn unpin(&self, hash: &str) -> Result<(), UploadError> {
        let url = format!("{}/pinning/unpin/{}", self.api_url, hash);
        let response = self
            .authed(self.client.delete(&url))
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(UploadError::NotFound(hash.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }
        tracing::info!(hash = %hash, "Unpinned");
        Ok(())
    }

    /// Account usage statistics (pinned data totals).
    pub async fn usage_stats(&self) -> Result<serde_json::Value, UploadError> {
        let url = format!("{}/data/userPinnedDataTotal", self.api_url);
        let response = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }
        response
            .json()
            .await
            .map_err(|e| UploadError::Transient(format!("Invalid usage response: {}", e)))
    }
}

#[async_trait::async_trait]
impl trackpin_store::RemoteVerifier for PinataClient {
    async fn verify(&self, hash: &str) -> bool {
        PinataClient::verify(self, hash).await
    }
}

/// Build the multipart file part, wrapping the bytes in a counting stream
/// when a progress callback is supplied.
fn file_part(
    request: &UploadRequest,
    on_progress: Option<ProgressCallback>,
) -> Result<Part, UploadError> {
    let total = request.bytes.len() as u64;
    let part = match on_progress {
        Some(progress) => {
            let divisor = total.max(1);
            let chunks: Vec<Bytes> = request
                .bytes
                .chunks(PROGRESS_CHUNK_BYTES)
                .map(Bytes::copy_from_slice)
                .collect();
            let mut sent = 0u64;
            let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
                sent += chunk.len() as u64;
                let pct = ((sent * 100) / divisor).min(100) as u8;
                progress(pct);
                Ok::<Bytes, std::io::Error>(chunk)
            }));
            Part::stream_with_length(reqwest::Body::wrap_stream(stream), total)
        }
        None => Part::bytes(request.bytes.clone()),
    };

    part.file_name(request.file_name.clone())
        .mime_str(&request.content_type)
        .map_err(|e| UploadError::Transient(format!("Invalid content type: {}", e)))
}

/// Full metadata envelope for the direct variant: attribution, project
/// association, original name, size, ISO timestamp, plus custom entries.
fn direct_metadata(request: &UploadRequest) -> serde_json::Value {
    let mut keyvalues = serde_json::Map::new();
    keyvalues.insert("type".to_string(), json!("audio"));
    keyvalues.insert("uploadedBy".to_string(), json!(request.attribution));
    keyvalues.insert(
        "projectId".to_string(),
        json!(request.project_id.clone().unwrap_or_default()),
    );
    keyvalues.insert("originalName".to_string(), json!(request.file_name));
    keyvalues.insert("size".to_string(), json!(request.size_bytes.to_string()));
    keyvalues.insert("uploadTimestamp".to_string(), json!(Utc::now().to_rfc3339()));
    for (key, value) in &request.custom_metadata {
        keyvalues.insert(key.clone(), json!(value));
    }
    json!({
        "name": request.display_name,
        "keyvalues": keyvalues,
    })
}

/// Minimal envelope for the simple fallback variant.
fn simple_metadata(request: &UploadRequest) -> serde_json::Value {
    json!({
        "name": request.display_name,
        "keyvalues": {
            "type": "audio",
            "originalName": request.file_name,
            "uploadTimestamp": Utc::now().to_rfc3339(),
        },
    })
}

/// Pin options for the direct variant: CID v1 and two-region replication.
fn pin_options() -> serde_json::Value {
    json!({
        "cidVersion": 1,
        "customPinPolicy": {
            "regions": [
                { "id": "FRA1", "desiredReplicationCount": 1 },
                { "id": "NYC1", "desiredReplicationCount": 1 },
            ],
        },
    })
}
