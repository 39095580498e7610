//! # oc-tokens
//!
//! Caches the short-lived bearer token the native backend presents to the
//! upstream Converse-style API. Acquisition is lazy (nothing happens at
//! startup) and refreshes are single-flighted: the cache is protected by a
//! `tokio::sync::Mutex` held for the whole fetch, so a concurrent caller
//! blocks on the in-flight refresh rather than kicking off its own.

#![deny(unsafe_code)]

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

/// One hour, matching the upstream platform's token lifetime.
pub const TOKEN_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token acquisition failed: {0}")]
    Source(String),
}

/// Something that can mint a fresh bearer token on demand. The production
/// implementation wraps the upstream platform's SigV4-signed token
/// generator; tests supply a closure or counter instead.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch(&self) -> Result<String, TokenError>;
}

#[async_trait]
impl<F, Fut> TokenSource for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<String, TokenError>> + Send,
{
    async fn fetch(&self) -> Result<String, TokenError> {
        self().await
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Lazily-populated, single-flighted cache over a [`TokenSource`].
pub struct TokenCache<S: TokenSource> {
    source: S,
    ttl: Duration,
    state: Mutex<Option<CachedToken>>,
}

impl<S: TokenSource> TokenCache<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_ttl(source, TOKEN_TTL)
    }

    #[must_use]
    pub fn with_ttl(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            state: Mutex::new(None),
        }
    }

    /// Return a valid token, refreshing it first if absent or expired.
    pub async fn get(&self) -> Result<String, TokenError> {
        let mut guard = self.state.lock().await;
        let needs_refresh = match guard.as_ref() {
            Some(cached) => Instant::now() >= cached.expires_at,
            None => true,
        };
        if needs_refresh {
            let value = self.source.fetch().await?;
            tracing::info!(ttl_seconds = self.ttl.as_secs(), "refreshed upstream platform token");
            *guard = Some(CachedToken {
                value: value.clone(),
                expires_at: Instant::now() + self.ttl,
            });
            return Ok(value);
        }
        Ok(guard.as_ref().expect("checked above").value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        async fn fetch(&self) -> Result<String, TokenError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("token-{n}"))
        }
    }

    #[tokio::test]
    async fn fetches_lazily_on_first_use() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = TokenCache::new(CountingSource {
            calls: calls.clone(),
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let _ = cache.get().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reuses_cached_token_before_expiry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = TokenCache::with_ttl(
            CountingSource {
                calls: calls.clone(),
            },
            Duration::from_secs(3600),
        );
        let first = cache.get().await.unwrap();
        let second = cache.get().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refreshes_after_ttl_elapses() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = TokenCache::with_ttl(
            CountingSource {
                calls: calls.clone(),
            },
            Duration::from_millis(10),
        );
        let first = cache.get().await.unwrap();
        tokio::time::sleep(Duration::from_millis(25)).await;
        let second = cache.get().await.unwrap();
        assert_ne!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_callers_single_flight_the_refresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(TokenCache::new(CountingSource {
            calls: calls.clone(),
        }));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get().await.unwrap() }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn propagates_source_errors() {
        struct FailingSource;
        #[async_trait]
        impl TokenSource for FailingSource {
            async fn fetch(&self) -> Result<String, TokenError> {
                Err(TokenError::Source("no credentials".to_string()))
            }
        }
        let cache = TokenCache::new(FailingSource);
        let err = cache.get().await.unwrap_err();
        assert!(matches!(err, TokenError::Source(_)));
    }
}
