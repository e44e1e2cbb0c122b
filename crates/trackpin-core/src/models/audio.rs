//! Audio properties extracted before upload.

use serde::{Deserialize, Serialize};

/// Best-effort audio properties. All fields are advisory; extraction failure
/// never blocks an upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioProperties {
    pub duration_seconds: Option<f64>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
}

impl AudioProperties {
    /// Flatten known properties into string key-values for metadata envelopes.
    pub fn to_metadata_entries(&self) -> Vec<(String, String)> {
        let mut entries = Vec::new();
        if let Some(d) = self.duration_seconds {
            entries.push(("duration".to_string(), format!("{:.3}", d)));
        }
        if let Some(r) = self.sample_rate {
            entries.push(("sampleRate".to_string(), r.to_string()));
        }
        if let Some(c) = self.channels {
            entries.push(("channels".to_string(), c.to_string()));
        }
        entries
    }
}
