//! Trackpin Pinata Library
//!
//! Remote pinning client for the Pinata IPFS API, plus the three remote
//! [`ContentStore`](trackpin_store::ContentStore) backends built on it:
//!
//! - **proxy**: routes bytes through the collaboration backend's
//!   `upload_to_pinata` operation, avoiding browser-style cross-origin
//!   restrictions on the direct path;
//! - **direct**: multipart upload with the full metadata envelope, pin
//!   options, and byte-level progress reporting;
//! - **simple**: minimal multipart fallback used when the richer request is
//!   rejected for reasons unrelated to credentials.
//!
//! Failures are classified once, at the HTTP boundary, into the shared
//! [`UploadError`](trackpin_core::UploadError) taxonomy.

pub mod backends;
pub mod classify;
pub mod client;
pub mod gateway;
pub mod proxy;

// Re-export commonly used types
pub use backends::{DirectPinBackend, ProxyPinBackend, SimplePinBackend};
pub use client::{PinResponse, PinataClient};
pub use gateway::{gateway_url, gateway_urls};
