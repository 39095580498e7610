//! The two in-process caches the middleware pipeline reads on every request:
//! resolved API-key identities, and the current minimum client version.
//!
//! Both are process-wide, constructor-injected objects rather than
//! package-level singletons, per the shared-resource design notes — this
//! keeps them swappable in tests instead of baked into global state.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use oc_core::version::ClientVersion;
use parking_lot::Mutex;

/// How long a resolved API-key identity is trusted before the validation
/// cache re-consults the store.
pub const VALIDATION_TTL: Duration = Duration::from_secs(oc_auth::api_key::VALIDATION_CACHE_TTL_SECS);

/// How long a fetched version-policy minimum is trusted before a refresh is
/// attempted.
const VERSION_POLICY_TTL: Duration = Duration::from_secs(300);

#[derive(Clone)]
struct CachedIdentity {
    user_sub: String,
    user_email: String,
    expires_at: Instant,
}

/// `key_hash` → resolved identity, TTL 5 minutes. Invalidated explicitly on
/// revoke so that within one process a revocation is visible immediately;
/// across processes it is bounded by the TTL (see design notes).
pub struct ValidationCache {
    entries: Mutex<HashMap<String, CachedIdentity>>,
}

impl ValidationCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn get(&self, key_hash: &str) -> Option<(String, String)> {
        let mut guard = self.entries.lock();
        match guard.get(key_hash) {
            Some(cached) if Instant::now() < cached.expires_at => {
                Some((cached.user_sub.clone(), cached.user_email.clone()))
            }
            Some(_) => {
                let _ = guard.remove(key_hash);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key_hash: String, user_sub: String, user_email: String) {
        self.entries.lock().insert(
            key_hash,
            CachedIdentity {
                user_sub,
                user_email,
                expires_at: Instant::now() + VALIDATION_TTL,
            },
        );
    }

    pub fn invalidate(&self, key_hash: &str) {
        let _ = self.entries.lock().remove(key_hash);
    }
}

impl Default for ValidationCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the minimum supported client version, refreshed from a remote
/// manifest on read when stale. A fetch failure keeps the last known value
/// (soft-fail per the policy-cache contract in the Error Handling Design).
pub struct VersionPolicyCache {
    client: reqwest::Client,
    manifest_url: Option<String>,
    configured_minimum: Option<ClientVersion>,
    state: Mutex<Option<(ClientVersion, Instant)>>,
}

impl VersionPolicyCache {
    #[must_use]
    pub fn new(client: reqwest::Client, manifest_url: Option<String>, configured_minimum: Option<&str>) -> Self {
        let configured_minimum = configured_minimum.and_then(|raw| ClientVersion::parse(raw).ok());
        Self {
            client,
            manifest_url,
            configured_minimum,
            state: Mutex::new(None),
        }
    }

    /// Current minimum version, or `None` if the policy is unknown — the
    /// version gate bypasses (fails open) when this returns `None`.
    pub async fn minimum(&self) -> Option<ClientVersion> {
        let Some(manifest_url) = &self.manifest_url else {
            return self.configured_minimum;
        };

        let cached = { *self.state.lock() };
        if let Some((version, fetched_at)) = cached {
            if fetched_at.elapsed() < VERSION_POLICY_TTL {
                return Some(version);
            }
        }

        match self.fetch(manifest_url).await {
            Some(version) => {
                *self.state.lock() = Some((version, Instant::now()));
                Some(version)
            }
            None => cached.map(|(version, _)| version).or(self.configured_minimum),
        }
    }

    async fn fetch(&self, manifest_url: &str) -> Option<ClientVersion> {
        let resp = self.client.get(manifest_url).send().await.ok()?;
        let body: serde_json::Value = resp.json().await.ok()?;
        let raw = body.get("minimum_version")?.as_str()?;
        ClientVersion::parse(raw).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_cache_misses_until_inserted() {
        let cache = ValidationCache::new();
        assert!(cache.get("hash-1").is_none());
        cache.insert("hash-1".to_string(), "user-1".to_string(), "a@example.test".to_string());
        assert_eq!(cache.get("hash-1"), Some(("user-1".to_string(), "a@example.test".to_string())));
    }

    #[test]
    fn validation_cache_invalidate_evicts() {
        let cache = ValidationCache::new();
        cache.insert("hash-1".to_string(), "user-1".to_string(), String::new());
        cache.invalidate("hash-1");
        assert!(cache.get("hash-1").is_none());
    }

    #[tokio::test]
    async fn version_policy_without_manifest_uses_configured_minimum() {
        let cache = VersionPolicyCache::new(reqwest::Client::new(), None, Some("1.4.0"));
        assert_eq!(cache.minimum().await, Some(ClientVersion::parse("1.4.0").unwrap()));
    }

    #[tokio::test]
    async fn version_policy_with_nothing_configured_is_unknown() {
        let cache = VersionPolicyCache::new(reqwest::Client::new(), None, None);
        assert_eq!(cache.minimum().await, None);
    }

    #[tokio::test]
    async fn version_policy_fetch_failure_falls_back_to_configured_minimum() {
        let cache = VersionPolicyCache::new(
            reqwest::Client::new(),
            Some("http://127.0.0.1:1/manifest.json".to_string()),
            Some("2.0.0"),
        );
        assert_eq!(cache.minimum().await, Some(ClientVersion::parse("2.0.0").unwrap()));
    }
}
