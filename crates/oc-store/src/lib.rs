//! # oc-store
//!
//! Persistence for issued API keys. [`traits::ApiKeyStore`] is the seam;
//! [`sqlite_store::SqliteApiKeyStore`] is the concrete backend — a local
//! SQLite file standing in for the managed key-value table (DynamoDB) the
//! original service points at. See `DESIGN.md` for why.

#![deny(unsafe_code)]

pub mod errors;
pub mod record;
pub mod sqlite_store;
pub mod traits;

pub use errors::StoreError;
pub use record::{ApiKeyRecord, ApiKeyStatus};
pub use sqlite_store::SqliteApiKeyStore;
pub use traits::ApiKeyStore;
