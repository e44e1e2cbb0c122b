//! Shared constants for the upload pipeline.

/// Hard ceiling on audio payload size (50 MiB). Files above this are rejected
/// before any network or storage activity.
pub const MAX_AUDIO_SIZE_BYTES: usize = 50 * 1024 * 1024;

/// Maximum accepted file name length in characters.
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Content types accepted by the audio validator.
pub const SUPPORTED_AUDIO_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/wav",
    "audio/mp4",
    "audio/x-m4a",
    "audio/flac",
    "audio/ogg",
    "audio/webm",
];

/// Default Pinata API base URL.
pub const DEFAULT_PINATA_API_URL: &str = "https://api.pinata.cloud";

/// Default IPFS gateway used for playback and verification.
pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.pinata.cloud";

/// Interchangeable public gateways, in preference order after the configured one.
pub const FALLBACK_GATEWAY_URLS: &[&str] = &[
    "https://ipfs.io",
    "https://cloudflare-ipfs.com",
    "https://dweb.link",
];
