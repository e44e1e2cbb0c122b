//! Proxied pinning through the collaboration backend.
//!
//! Instead of calling the pinning API from the client, the raw bytes and API
//! credentials are forwarded to the backend's `upload_to_pinata` operation,
//! which performs the pin server-side. This sidesteps client-side
//! cross-origin and content-security restrictions, so it is tried first.

use base64::Engine;
use serde::{Deserialize, Serialize};

use trackpin_core::{Config, UploadError, UploadRequest};

use crate::classify::classify_status;
use crate::client::PinResponse;

#[derive(Debug, Serialize)]
struct ProxyUploadRequest<'a> {
    file_data: String,
    file_name: &'a str,
    content_type: &'a str,
    api_key: &'a str,
    secret_key: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProxyUploadResponse {
    success: bool,
    #[serde(default)]
    ipfs_hash: Option<String>,
    #[serde(default)]
    pin_size: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
    backend_url: String,
    api_key: String,
    secret_api_key: String,
}

impl ProxyClient {
    /// Returns `None` when no collaboration backend is configured; the proxy
    /// backend is then left out of the priority list entirely.
    pub fn from_config(config: &Config) -> Result<Option<Self>, UploadError> {
        let Some(backend_url) = &config.collab_backend_url else {
            return Ok(None);
        };
        let client = reqwest::Client::builder()
            .timeout(config.upload_timeout)
            .build()
            .map_err(|e| UploadError::Transient(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Some(Self {
            client,
            backend_url: backend_url.trim_end_matches('/').to_string(),
            api_key: config.pinata_api_key.clone(),
            secret_api_key: config.pinata_secret_api_key.clone(),
        }))
    }

    pub async fn upload(&self, request: &UploadRequest) -> Result<PinResponse, UploadError> {
        let body = ProxyUploadRequest {
            file_data: base64::engine::general_purpose::STANDARD.encode(&request.bytes),
            file_name: &request.file_name,
            content_type: &request.content_type,
            api_key: &self.api_key,
            secret_key: &self.secret_api_key,
        };

        let url = format!("{}/upload_to_pinata", self.backend_url);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                // The backend actor itself cannot be reached.
                if e.is_connect() || e.is_timeout() {
                    UploadError::ProxyUnavailable(e.to_string())
                } else {
                    UploadError::Transient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }

        let proxied: ProxyUploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Transient(format!("Invalid proxy response: {}", e)))?;

        if !proxied.success {
            return Err(UploadError::Transient(
                proxied
                    .error
                    .unwrap_or_else(|| "proxy pin failed without detail".to_string()),
            ));
        }

        let ipfs_hash = proxied.ipfs_hash.filter(|h| !h.is_empty()).ok_or_else(|| {
            UploadError::Transient("proxy reported success without a hash".to_string())
        })?;

        tracing::info!(ipfs_hash = %ipfs_hash, "Proxy pin successful");

        Ok(PinResponse {
            ipfs_hash,
            pin_size: proxied.pin_size.unwrap_or(request.size_bytes),
            timestamp: String::new(),
            is_duplicate: false,
        })
    }
}
