//! Shared state accessible from every Axum handler and middleware stage.

use std::sync::Arc;
use std::time::Instant;

use oc_dispatch::{AliasMap, BearerSource, Dispatcher};
use oc_store::ApiKeyStore;

use crate::caches::{ValidationCache, VersionPolicyCache};
use crate::config::AppConfig;
use crate::shutdown::ShutdownCoordinator;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub aliases: Arc<AliasMap>,
    pub dispatcher: Arc<Dispatcher>,
    pub store: Arc<dyn ApiKeyStore>,
    pub tokens: Arc<dyn BearerSource>,
    pub validation_cache: Arc<ValidationCache>,
    pub version_policy: Arc<VersionPolicyCache>,
    pub shutdown: Arc<ShutdownCoordinator>,
    pub start_time: Instant,
}
