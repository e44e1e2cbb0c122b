//! Audio file validation.
//!
//! Pure guard with no side effects: runs before any network or storage call,
//! so an invalid file never generates traffic.

use trackpin_core::constants::{MAX_AUDIO_SIZE_BYTES, MAX_FILE_NAME_LEN, SUPPORTED_AUDIO_TYPES};
use trackpin_core::{UploadRequest, ValidationError};

pub struct AudioValidator {
    max_size_bytes: usize,
    allowed_content_types: Vec<String>,
    max_name_len: usize,
}

impl Default for AudioValidator {
    fn default() -> Self {
        Self {
            max_size_bytes: MAX_AUDIO_SIZE_BYTES,
            allowed_content_types: SUPPORTED_AUDIO_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_name_len: MAX_FILE_NAME_LEN,
        }
    }
}

impl AudioValidator {
    pub fn new(max_size_bytes: usize, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_size_bytes,
            allowed_content_types,
            max_name_len: MAX_FILE_NAME_LEN,
        }
    }

    pub fn validate(&self, request: &UploadRequest) -> Result<(), ValidationError> {
        if request.bytes.is_empty() {
            return Err(ValidationError::MissingFile);
        }

        let size = request.bytes.len();
        if size > self.max_size_bytes {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_size_bytes,
            });
        }

        let normalized = request.content_type.to_lowercase();
        if !self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Err(ValidationError::UnsupportedContentType {
                content_type: request.content_type.clone(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        let name_len = request.file_name.chars().count();
        if name_len > self.max_name_len {
            return Err(ValidationError::FileNameTooLong {
                len: name_len,
                max: self.max_name_len,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(bytes: Vec<u8>, name: &str, content_type: &str) -> UploadRequest {
        UploadRequest::new(bytes, name, content_type, "alice")
    }

    #[test]
    fn accepts_supported_audio() {
        let validator = AudioValidator::default();
        for ct in SUPPORTED_AUDIO_TYPES {
            assert!(validator.validate(&request(vec![0u8; 16], "t.bin", ct)).is_ok());
        }
    }

    #[test]
    fn rejects_empty_payload() {
        let validator = AudioValidator::default();
        assert!(matches!(
            validator.validate(&request(vec![], "t.wav", "audio/wav")),
            Err(ValidationError::MissingFile)
        ));
    }

    #[test]
    fn rejects_oversized_file() {
        let validator = AudioValidator::new(8, vec!["audio/wav".to_string()]);
        assert!(matches!(
            validator.validate(&request(vec![0u8; 9], "t.wav", "audio/wav")),
            Err(ValidationError::FileTooLarge { size: 9, max: 8 })
        ));
    }

    #[test]
    fn accepts_file_at_exact_ceiling() {
        let validator = AudioValidator::new(8, vec!["audio/wav".to_string()]);
        assert!(validator
            .validate(&request(vec![0u8; 8], "t.wav", "audio/wav"))
            .is_ok());
    }

    #[test]
    fn rejects_unsupported_content_type() {
        let validator = AudioValidator::default();
        assert!(matches!(
            validator.validate(&request(vec![0u8; 16], "t.txt", "text/plain")),
            Err(ValidationError::UnsupportedContentType { .. })
        ));
    }

    #[test]
    fn content_type_check_is_case_insensitive() {
        let validator = AudioValidator::default();
        assert!(validator
            .validate(&request(vec![0u8; 16], "t.wav", "AUDIO/WAV"))
            .is_ok());
    }

    #[test]
    fn rejects_overlong_file_name() {
        let validator = AudioValidator::default();
        let long_name = "x".repeat(256);
        assert!(matches!(
            validator.validate(&request(vec![0u8; 16], &long_name, "audio/wav")),
            Err(ValidationError::FileNameTooLong { len: 256, max: 255 })
        ));
    }
}
