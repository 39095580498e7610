//! API key generation and hashing.
//!
//! Keys are never stored in plaintext — only their SHA-256 hex digest is
//! persisted, and only the digest is ever looked up. The raw key is shown to
//! the caller exactly once, at creation time.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Prefix every generated key carries, also used to cheaply reject
/// non-key-shaped credentials before paying for a hash + store lookup.
pub const API_KEY_PREFIX: &str = "oc_";

pub const MAX_KEYS_PER_USER: usize = 10;
pub const DEFAULT_EXPIRY_DAYS: i64 = 90;
pub const MIN_EXPIRY_DAYS: i64 = 1;
pub const MAX_EXPIRY_DAYS: i64 = 365;

/// In-process cache TTL for a validated key's lookup result.
pub const VALIDATION_CACHE_TTL_SECS: u64 = 300;

/// SHA-256 hex digest of an API key.
#[must_use]
pub fn hash_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex_encode(&digest)
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// Generate a new raw API key: `oc_` followed by 32 bytes of randomness,
/// base64url-encoded without padding (43 characters).
#[must_use]
pub fn generate_key() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    format!("{API_KEY_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes))
}

/// `true` if the given credential is shaped like one of our API keys, i.e.
/// worth hashing and looking up at all.
#[must_use]
pub fn looks_like_api_key(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.starts_with(API_KEY_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_has_prefix_and_length() {
        let key = generate_key();
        assert!(key.starts_with(API_KEY_PREFIX));
        // 32 random bytes base64url-encoded without padding is 43 chars.
        assert_eq!(key.len(), API_KEY_PREFIX.len() + 43);
    }

    #[test]
    fn generated_keys_are_unique() {
        assert_ne!(generate_key(), generate_key());
    }

    #[test]
    fn hash_is_deterministic_and_hex() {
        let h1 = hash_key("oc_abc123");
        let h2 = hash_key("oc_abc123");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_keys_hash_differently() {
        assert_ne!(hash_key("oc_a"), hash_key("oc_b"));
    }

    #[test]
    fn looks_like_api_key_checks_prefix() {
        assert!(looks_like_api_key("oc_abcdef"));
        assert!(!looks_like_api_key(""));
        assert!(!looks_like_api_key("sk-abcdef"));
        // The bare prefix still counts as "shaped like a key" — the store
        // lookup is what ultimately rejects it, not this cheap pre-check.
        assert!(looks_like_api_key("oc_"));
    }
}
