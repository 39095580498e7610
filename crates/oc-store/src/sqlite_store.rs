//! A `rusqlite`-backed [`ApiKeyStore`].
//!
//! Mirrors the DynamoDB table the original service keeps its key records
//! in: `key_hash` primary key, an index on `user_sub` standing in for the
//! secondary index, and a `ttl` column a periodic sweep uses for the same
//! auto-expiry DynamoDB gives for free. `rusqlite` is blocking, so every
//! operation hops onto [`tokio::task::spawn_blocking`] — this is the
//! worker-pool offload the concurrency model describes for store calls.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::StoreError;
use crate::record::{ApiKeyRecord, ApiKeyStatus};
use crate::traits::ApiKeyStore;

pub struct SqliteApiKeyStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteApiKeyStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS api_keys (
                key_hash     TEXT PRIMARY KEY,
                key_prefix   TEXT NOT NULL,
                user_sub     TEXT NOT NULL,
                user_email   TEXT NOT NULL,
                description  TEXT NOT NULL,
                status       TEXT NOT NULL,
                created_at   TEXT NOT NULL,
                expires_at   TEXT NOT NULL,
                revoked_at   TEXT,
                last_used_at TEXT,
                ttl          INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_api_keys_user_sub ON api_keys(user_sub);",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    #[must_use]
    pub fn open_in_memory() -> Self {
        let conn = Connection::open_in_memory().expect("in-memory sqlite connection");
        conn.execute_batch(
            "CREATE TABLE api_keys (
                key_hash     TEXT PRIMARY KEY,
                key_prefix   TEXT NOT NULL,
                user_sub     TEXT NOT NULL,
                user_email   TEXT NOT NULL,
                description  TEXT NOT NULL,
                status       TEXT NOT NULL,
                created_at   TEXT NOT NULL,
                expires_at   TEXT NOT NULL,
                revoked_at   TEXT,
                last_used_at TEXT,
                ttl          INTEGER NOT NULL
            );
            CREATE INDEX idx_api_keys_user_sub ON api_keys(user_sub);",
        )
        .expect("create api_keys table");
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Delete every record whose `ttl` has passed, mirroring the managed
    /// table's background TTL sweep. Not invoked by request handlers;
    /// intended for a periodic maintenance task.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let conn = self.conn.lock().expect("sqlite connection poisoned");
        let deleted = conn.execute(
            "DELETE FROM api_keys WHERE ttl < ?1",
            params![now.timestamp()],
        )?;
        Ok(deleted)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ApiKeyRecord> {
    let status: String = row.get("status")?;
    Ok(ApiKeyRecord {
        key_hash: row.get("key_hash")?,
        key_prefix: row.get("key_prefix")?,
        user_sub: row.get("user_sub")?,
        user_email: row.get("user_email")?,
        description: row.get("description")?,
        status: if status == "revoked" {
            ApiKeyStatus::Revoked
        } else {
            ApiKeyStatus::Active
        },
        created_at: row.get("created_at")?,
        expires_at: row.get("expires_at")?,
        revoked_at: row.get("revoked_at")?,
        last_used_at: row.get("last_used_at")?,
        ttl: row.get("ttl")?,
    })
}

fn status_str(status: ApiKeyStatus) -> &'static str {
    match status {
        ApiKeyStatus::Active => "active",
        ApiKeyStatus::Revoked => "revoked",
    }
}

#[async_trait::async_trait]
impl ApiKeyStore for SqliteApiKeyStore {
    async fn get(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, StoreError> {
        let key_hash = key_hash.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT * FROM api_keys WHERE key_hash = ?1",
                params![key_hash],
                row_to_record,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn query_by_user(&self, user_sub: &str) -> Result<Vec<ApiKeyRecord>, StoreError> {
        let user_sub = user_sub.to_string();
        self.with_conn(move |conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM api_keys WHERE user_sub = ?1 ORDER BY created_at")?;
            let rows = stmt
                .query_map(params![user_sub], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }

    async fn put(&self, record: ApiKeyRecord) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO api_keys
                    (key_hash, key_prefix, user_sub, user_email, description, status,
                     created_at, expires_at, revoked_at, last_used_at, ttl)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(key_hash) DO UPDATE SET
                    key_prefix = excluded.key_prefix,
                    user_sub = excluded.user_sub,
                    user_email = excluded.user_email,
                    description = excluded.description,
                    status = excluded.status,
                    created_at = excluded.created_at,
                    expires_at = excluded.expires_at,
                    revoked_at = excluded.revoked_at,
                    last_used_at = excluded.last_used_at,
                    ttl = excluded.ttl",
                params![
                    record.key_hash,
                    record.key_prefix,
                    record.user_sub,
                    record.user_email,
                    record.description,
                    status_str(record.status),
                    record.created_at,
                    record.expires_at,
                    record.revoked_at,
                    record.last_used_at,
                    record.ttl,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn conditional_revoke(
        &self,
        key_hash: &str,
        user_sub: &str,
    ) -> Result<ApiKeyRecord, StoreError> {
        let key_hash = key_hash.to_string();
        let user_sub = user_sub.to_string();
        self.with_conn(move |conn| {
            let now = Utc::now();
            let updated = conn.execute(
                "UPDATE api_keys SET status = 'revoked', revoked_at = ?1
                 WHERE key_hash = ?2 AND user_sub = ?3",
                params![now, key_hash, user_sub],
            )?;
            if updated == 0 {
                return Err(StoreError::ConditionFailed);
            }
            conn.query_row(
                "SELECT * FROM api_keys WHERE key_hash = ?1",
                params![key_hash],
                row_to_record,
            )
            .map_err(StoreError::from)
        })
        .await
    }

    async fn touch_last_used(&self, key_hash: &str) -> Result<(), StoreError> {
        let key_hash = key_hash.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE api_keys SET last_used_at = ?1 WHERE key_hash = ?2",
                params![Utc::now(), key_hash],
            )?;
            Ok(())
        })
        .await
    }
}

impl SqliteApiKeyStore {
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        // The connection is blocking C code, so hop onto the blocking-task
        // pool rather than holding the mutex across an `.await` point.
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().expect("sqlite connection poisoned");
            f(&conn)
        })
        .await
        .expect("sqlite blocking task panicked")
    }
}
