//! The storage seam between the HTTP layer and however API keys are kept.

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::record::ApiKeyRecord;

#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    async fn get(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, StoreError>;

    async fn query_by_user(&self, user_sub: &str) -> Result<Vec<ApiKeyRecord>, StoreError>;

    async fn put(&self, record: ApiKeyRecord) -> Result<(), StoreError>;

    /// Revoke the given key, but only if it's owned by `user_sub`.
    /// Returns [`StoreError::ConditionFailed`] if the key is missing or
    /// owned by someone else — callers must not be able to revoke another
    /// user's key by guessing its hash.
    async fn conditional_revoke(
        &self,
        key_hash: &str,
        user_sub: &str,
    ) -> Result<ApiKeyRecord, StoreError>;

    /// Best-effort bookkeeping update. Implementations should log and
    /// swallow failures here rather than fail the request the lookup is
    /// serving — this mirrors the original's fire-and-forget last-used
    /// update.
    async fn touch_last_used(&self, key_hash: &str) -> Result<(), StoreError>;
}
