//! Trackpin Store Library
//!
//! This crate provides the content-store abstraction and the local fallback
//! implementation. A content store is one concrete strategy for persisting
//! bytes and producing a content identifier; the remote pinning backends live
//! in `trackpin-pinata` and implement the same trait.
//!
//! # Local store layout
//!
//! The local store keeps one `{uuid}.bin` payload plus a `{uuid}.json`
//! sidecar record per blob under a single base directory. Records are
//! append-only by fresh key, so concurrent fallback writes never collide.

pub mod local;
pub mod traits;

// Re-export commonly used types
pub use local::LocalBlobStore;
pub use traits::{ContentStore, ProgressCallback, RemoteVerifier};
