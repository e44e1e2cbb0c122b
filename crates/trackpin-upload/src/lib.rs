//! Trackpin Upload Library
//!
//! The upload pipeline proper: validate → probe metadata → attempt backends
//! in priority order → verify. The orchestrator receives its validator,
//! probe, and backend list as explicit dependencies; nothing here reaches
//! into ambient globals.

pub mod orchestrator;
pub mod probe;
pub mod validator;

// Re-export commonly used types
pub use orchestrator::{PhaseObserver, UploadContext, UploadOrchestrator, UploadPhase};
pub use probe::{AudioProbe, FixedProbe, WavProbe};
pub use validator::AudioValidator;
