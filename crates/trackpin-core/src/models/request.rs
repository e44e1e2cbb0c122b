//! Upload request and local store record models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ContentId;

/// Immutable description of one upload attempt.
///
/// Created when the user selects a file and requests an upload; not mutated
/// afterwards. The byte payload is owned exclusively by the request until it
/// is handed to a backend call.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub display_name: String,
    pub attribution: String,
    pub project_id: Option<String>,
    /// Advisory metadata (duration, sample rate, channels); best-effort.
    pub custom_metadata: BTreeMap<String, String>,
}

impl UploadRequest {
    pub fn new(
        bytes: Vec<u8>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        attribution: impl Into<String>,
    ) -> Self {
        let file_name = file_name.into();
        let size_bytes = bytes.len() as u64;
        let display_name = display_name_from(&file_name);
        Self {
            bytes,
            file_name,
            content_type: content_type.into(),
            size_bytes,
            display_name,
            attribution: attribution.into(),
            project_id: None,
            custom_metadata: BTreeMap::new(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_metadata.insert(key.into(), value.into());
        self
    }
}

/// File name minus its extension, or the whole name when there is none.
fn display_name_from(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file_name.to_string(),
    }
}

/// Persisted record in the local blob store. Never mutated after creation;
/// deleted only by explicit user action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalBlobRecord {
    pub id: ContentId,
    pub name: String,
    pub size_bytes: u64,
    pub content_type: String,
    pub metadata: BTreeMap<String, String>,
    pub stored_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_strips_extension() {
        let req = UploadRequest::new(vec![1, 2, 3], "my track.wav", "audio/wav", "alice");
        assert_eq!(req.display_name, "my track");
        assert_eq!(req.size_bytes, 3);
    }

    #[test]
    fn display_name_keeps_extensionless_names() {
        let req = UploadRequest::new(vec![], "demo", "audio/wav", "alice");
        assert_eq!(req.display_name, "demo");
    }

    #[test]
    fn display_name_handles_leading_dot() {
        let req = UploadRequest::new(vec![], ".hidden", "audio/wav", "alice");
        assert_eq!(req.display_name, ".hidden");
    }

    #[test]
    fn builder_methods() {
        let req = UploadRequest::new(vec![0u8; 8], "a.mp3", "audio/mpeg", "bob")
            .with_display_name("A Song")
            .with_project_id("42")
            .with_metadata("duration", "180.5");
        assert_eq!(req.display_name, "A Song");
        assert_eq!(req.project_id.as_deref(), Some("42"));
        assert_eq!(
            req.custom_metadata.get("duration").map(String::as_str),
            Some("180.5")
        );
    }
}
