//! The persisted shape of an API key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyStatus {
    Active,
    Revoked,
}

/// One issued API key. Keyed by `key_hash` — the raw key is never
/// persisted, only shown to the caller once at creation time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub key_hash: String,
    /// First 10 characters of the raw key (`oc_` + 7 chars of randomness),
    /// shown back in list responses so a user can tell their keys apart
    /// without the full secret ever leaving the creation response.
    pub key_prefix: String,
    pub user_sub: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub description: String,
    pub status: ApiKeyStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
    /// Epoch seconds the backing table should auto-delete this record at:
    /// `expires_at + 30 days`. Carried on the record itself since the file
    /// store has no table-level TTL attribute to hang it off of, but a
    /// cloud-managed-table backend would wire this straight to its own TTL
    /// column.
    pub ttl: i64,
}

impl ApiKeyRecord {
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.status, ApiKeyStatus::Active)
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Seconds a revoked or expired record is retained before the store's TTL
/// sweep would delete it, per the API-key record invariant.
pub const RECORD_RETENTION_AFTER_EXPIRY_SECS: i64 = 30 * 86_400;
