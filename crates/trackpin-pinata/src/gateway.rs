//! IPFS gateway URL construction.
//!
//! Gateways are interchangeable: any public gateway can serve a pinned hash.
//! The configured gateway is canonical (verification, playback); the fallback
//! list exists for redundancy when the canonical host is unreachable.

use trackpin_core::constants::FALLBACK_GATEWAY_URLS;

/// URL for a hash on the given gateway host.
pub fn gateway_url(base: &str, hash: &str) -> String {
    format!("{}/ipfs/{}", base.trim_end_matches('/'), hash)
}

/// Canonical URL first, then the public fallbacks (deduplicated).
pub fn gateway_urls(base: &str, hash: &str) -> Vec<String> {
    let canonical = gateway_url(base, hash);
    let mut urls = vec![canonical];
    for fallback in FALLBACK_GATEWAY_URLS {
        let url = gateway_url(fallback, hash);
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}
