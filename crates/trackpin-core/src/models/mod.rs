pub mod audio;
pub mod content_id;
pub mod outcome;
pub mod request;

pub use audio::AudioProperties;
pub use content_id::ContentId;
pub use outcome::{BackendKind, UploadOutcome};
pub use request::{LocalBlobRecord, UploadRequest};
