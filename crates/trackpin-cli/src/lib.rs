/// Map a file extension to the audio content type used for validation and
/// pinning metadata. Unknown extensions fall back to `audio/mpeg` so the
/// validator, not the extension table, has the final say.
pub fn content_type_for(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/x-m4a",
        "mp4" => "audio/mp4",
        "flac" => "audio/flac",
        "ogg" | "oga" => "audio/ogg",
        "webm" => "audio/webm",
        _ => "audio/mpeg",
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn known_extensions() {
        assert_eq!(content_type_for(Path::new("take.wav")), "audio/wav");
        assert_eq!(content_type_for(Path::new("take.MP3")), "audio/mpeg");
        assert_eq!(content_type_for(Path::new("take.flac")), "audio/flac");
        assert_eq!(content_type_for(Path::new("take.oga")), "audio/ogg");
    }

    #[test]
    fn unknown_extension_defaults() {
        assert_eq!(content_type_for(Path::new("take.xyz")), "audio/mpeg");
        assert_eq!(content_type_for(Path::new("take")), "audio/mpeg");
    }
}
