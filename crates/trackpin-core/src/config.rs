//! Configuration module
//!
//! Configuration is read from environment variables (with a `.env` file via
//! dotenvy in binaries). All knobs have defaults except the Pinata
//! credentials, which must be real values: placeholder keys shipped in sample
//! configs are rejected by [`Config::validate`].

use std::env;
use std::time::Duration;

use crate::constants::{DEFAULT_GATEWAY_URL, DEFAULT_PINATA_API_URL, MAX_AUDIO_SIZE_BYTES};
use crate::retry::RetryPolicy;

const DEFAULT_LOCAL_STORE_QUOTA_MB: u64 = 500;
const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 60;
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_MAX_UPLOAD_RETRIES: u32 = 2;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;

/// Placeholder credential values from sample configs.
const PLACEHOLDER_KEYS: &[&str] = &["", "your_pinata_api_key", "your_pinata_secret_key"];

#[derive(Clone, Debug)]
pub struct Config {
    pub pinata_api_key: String,
    pub pinata_secret_api_key: String,
    pub pinata_api_url: String,
    pub gateway_url: String,
    /// Base URL of the collaboration backend used for proxied pinning.
    /// When unset, the proxy backend is skipped.
    pub collab_backend_url: Option<String>,
    pub local_store_path: String,
    pub local_store_quota_bytes: u64,
    pub max_audio_size_bytes: usize,
    pub upload_timeout: Duration,
    /// Timeout for verification and connectivity probes, kept short so a
    /// slow gateway cannot stall fallthrough.
    pub probe_timeout: Duration,
    pub max_upload_retries: u32,
    pub retry_base_delay: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let pinata_api_key = env::var("PINATA_API_KEY").unwrap_or_default();
        let pinata_secret_api_key = env::var("PINATA_SECRET_API_KEY").unwrap_or_default();

        let local_store_quota_mb = env::var("LOCAL_STORE_QUOTA_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LOCAL_STORE_QUOTA_MB);

        let max_audio_size_bytes = env::var("MAX_AUDIO_SIZE_MB")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|mb| mb * 1024 * 1024)
            .unwrap_or(MAX_AUDIO_SIZE_BYTES);

        Ok(Self {
            pinata_api_key,
            pinata_secret_api_key,
            pinata_api_url: env::var("PINATA_API_URL")
                .unwrap_or_else(|_| DEFAULT_PINATA_API_URL.to_string()),
            gateway_url: env::var("PINATA_GATEWAY_URL")
                .unwrap_or_else(|_| DEFAULT_GATEWAY_URL.to_string()),
            collab_backend_url: env::var("COLLAB_BACKEND_URL").ok(),
            local_store_path: env::var("LOCAL_STORE_PATH")
                .unwrap_or_else(|_| "data/blobs".to_string()),
            local_store_quota_bytes: local_store_quota_mb * 1024 * 1024,
            max_audio_size_bytes,
            upload_timeout: Duration::from_secs(
                env::var("UPLOAD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_UPLOAD_TIMEOUT_SECS),
            ),
            probe_timeout: Duration::from_secs(
                env::var("PROBE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS),
            ),
            max_upload_retries: env::var("MAX_UPLOAD_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_RETRIES),
            retry_base_delay: Duration::from_millis(
                env::var("RETRY_BASE_DELAY_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS),
            ),
        })
    }

    /// Reject missing or placeholder Pinata credentials. Remote uploads with
    /// placeholder keys fail late with confusing 401s; fail early instead.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if PLACEHOLDER_KEYS.contains(&self.pinata_api_key.as_str()) {
            anyhow::bail!("PINATA_API_KEY is missing or a placeholder value");
        }
        if PLACEHOLDER_KEYS.contains(&self.pinata_secret_api_key.as_str()) {
            anyhow::bail!("PINATA_SECRET_API_KEY is missing or a placeholder value");
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_upload_retries, self.retry_base_delay)
    }

    /// Whether the proxy backend is configured at all.
    pub fn proxy_enabled(&self) -> bool {
        self.collab_backend_url.is_some()
    }
}
