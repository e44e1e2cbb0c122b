//! Audio metadata extraction.
//!
//! Probing is strictly best-effort: any parse failure, oversized chunk, or
//! timeout yields empty `AudioProperties` and the upload proceeds without
//! them. The probe stages bytes through a scratch file which is removed on
//! every exit path, success or failure.

use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use trackpin_core::models::AudioProperties;

const WAV_CONTENT_TYPES: &[&str] = &["audio/wav", "audio/x-wav", "audio/wave"];

#[async_trait]
pub trait AudioProbe: Send + Sync {
    /// Extract whatever properties can be read from the payload. Never fails;
    /// unknown formats and broken files produce empty properties.
    async fn probe(&self, bytes: &[u8], content_type: &str) -> AudioProperties;
}

/// Probe that understands canonical RIFF/WAVE files.
///
/// Payloads are staged into a scratch file and parsed off the async runtime
/// with a hard deadline, so a pathological file cannot stall an upload.
pub struct WavProbe {
    scratch_dir: PathBuf,
    timeout: Duration,
}

impl WavProbe {
    pub fn new(scratch_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            timeout,
        }
    }
}

impl Default for WavProbe {
    fn default() -> Self {
        Self::new(std::env::temp_dir(), Duration::from_secs(5))
    }
}

#[async_trait]
impl AudioProbe for WavProbe {
    async fn probe(&self, bytes: &[u8], content_type: &str) -> AudioProperties {
        let normalized = content_type.to_lowercase();
        if !WAV_CONTENT_TYPES.contains(&normalized.as_str()) {
            return AudioProperties::default();
        }

        // NamedTempFile unlinks the scratch file when dropped, which covers
        // every return below including the timeout branch.
        let mut scratch = match tempfile::NamedTempFile::new_in(&self.scratch_dir) {
            Ok(file) => file,
            Err(err) => {
                tracing::debug!(error = %err, "failed to create probe scratch file");
                return AudioProperties::default();
            }
        };
        if let Err(err) = scratch.write_all(bytes).and_then(|_| scratch.flush()) {
            tracing::debug!(error = %err, "failed to stage probe scratch file");
            return AudioProperties::default();
        }

        let path = scratch.path().to_path_buf();
        let task = tokio::task::spawn_blocking(move || {
            std::fs::read(&path).ok().and_then(|data| parse_wav(&data))
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Some(props))) => props,
            Ok(Ok(None)) => AudioProperties::default(),
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "probe task failed");
                AudioProperties::default()
            }
            Err(_) => {
                tracing::debug!(timeout_secs = self.timeout.as_secs(), "probe timed out");
                AudioProperties::default()
            }
        }
    }
}

/// Fixed-answer probe for tests and callers that precompute properties.
pub struct FixedProbe(pub AudioProperties);

#[async_trait]
impl AudioProbe for FixedProbe {
    async fn probe(&self, _bytes: &[u8], _content_type: &str) -> AudioProperties {
        self.0.clone()
    }
}

/// Walk the RIFF chunk list for `fmt ` and `data`. Returns `None` for
/// anything that is not a well-formed PCM WAVE container.
fn parse_wav(data: &[u8]) -> Option<AudioProperties> {
    if data.len() < 12 || &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return None;
    }

    let mut sample_rate = None;
    let mut channels = None;
    let mut byte_rate: Option<u32> = None;
    let mut data_size: Option<u32> = None;

    let mut offset = 12usize;
    while offset + 8 <= data.len() {
        let id = &data[offset..offset + 4];
        let size = u32::from_le_bytes([
            data[offset + 4],
            data[offset + 5],
            data[offset + 6],
            data[offset + 7],
        ]) as usize;
        let body = offset + 8;

        if id == b"fmt " {
            if body + 16 > data.len() {
                return None;
            }
            channels = Some(u16::from_le_bytes([data[body + 2], data[body + 3]]));
            sample_rate = Some(u32::from_le_bytes([
                data[body + 4],
                data[body + 5],
                data[body + 6],
                data[body + 7],
            ]));
            byte_rate = Some(u32::from_le_bytes([
                data[body + 8],
                data[body + 9],
                data[body + 10],
                data[body + 11],
            ]));
        } else if id == b"data" {
            data_size = Some(size as u32);
        }

        // Chunks are word-aligned; odd sizes carry a pad byte.
        offset = body + size + (size & 1);
    }

    sample_rate?;

    let duration_seconds = match (data_size, byte_rate) {
        (Some(bytes), Some(rate)) if rate > 0 => Some(f64::from(bytes) / f64::from(rate)),
        _ => None,
    };

    Some(AudioProperties {
        duration_seconds,
        sample_rate,
        channels,
    })
}

/// Minimal silent 16-bit mono PCM file for tests elsewhere in the crate.
#[cfg(test)]
pub(crate) fn wav_fixture(sample_rate: u32, seconds: u32) -> Vec<u8> {
    let channels: u16 = 1;
    let bits: u16 = 16;
    let byte_rate = sample_rate * u32::from(channels) * u32::from(bits / 8);
    let data_size = byte_rate * seconds;

    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&(channels * (bits / 8)).to_le_bytes()); // block align
    out.extend_from_slice(&bits.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    out.resize(out.len() + data_size as usize, 0);
    out
}
