//! Upload outcome and backend identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ContentId;
use crate::error::AttemptFailure;

/// Which content-store strategy produced an outcome.
///
/// The variants are ordered by upload priority: proxy first (avoids
/// browser-style cross-origin restrictions on the direct path), then the two
/// direct request styles, then the local fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    RemoteProxy,
    RemoteDirect,
    RemoteSimple,
    Local,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::RemoteProxy => "remote-proxy",
            BackendKind::RemoteDirect => "remote-direct",
            BackendKind::RemoteSimple => "remote-simple",
            BackendKind::Local => "local",
        }
    }

    pub fn is_remote(&self) -> bool {
        !matches!(self, BackendKind::Local)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one completed upload attempt.
///
/// Once produced, the content id is treated as durable: callers may link or
/// display it immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub content_id: ContentId,
    pub size_bytes: u64,
    pub completed_at: DateTime<Utc>,
    pub backend: BackendKind,
    /// Set when the pinning service reports the bytes were already pinned.
    pub deduplicated: bool,
    /// Backends tried and failed before this one succeeded, in attempt
    /// order. Empty when the first backend won. Filled in by the
    /// orchestrator; individual backends leave it empty.
    #[serde(default)]
    pub prior_failures: Vec<AttemptFailure>,
}
