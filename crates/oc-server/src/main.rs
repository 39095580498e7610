//! Process entry point: load config, build the shared state, start serving,
//! and wait for a shutdown signal.

use std::sync::Arc;
use std::time::Instant;

use oc_dispatch::{AliasMap, BearerSource, ConverseClient, Dispatcher, HttpConverseClient, OpenAiHttpClient};
use oc_server::caches::{ValidationCache, VersionPolicyCache};
use oc_server::shutdown::ShutdownCoordinator;
use oc_server::token_source::UpstreamTokenSource;
use oc_server::{listen, AppConfig, AppState};
use oc_store::{ApiKeyStore, SqliteApiKeyStore};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    oc_server::logging::init(&config.log_level);

    let db_path = std::env::var("API_KEYS_DB_PATH").unwrap_or_else(|_| "oc-router-keys.db".to_string());
    let store: Arc<dyn ApiKeyStore> = Arc::new(SqliteApiKeyStore::open(&db_path)?);

    let http_client = reqwest::Client::builder().build()?;

    let token_source = UpstreamTokenSource::new(http_client.clone(), config.upstream_url.clone(), config.region.clone());
    let tokens: Arc<dyn BearerSource> = Arc::new(oc_tokens::TokenCache::new(token_source));

    let openai = Arc::new(OpenAiHttpClient::new(http_client.clone(), config.upstream_url.clone(), tokens.clone()));
    let converse: Arc<dyn ConverseClient> =
        Arc::new(HttpConverseClient::new(http_client.clone(), config.upstream_url.clone(), tokens.clone()));

    let aliases = AliasMap::with_overrides(config.model_alias_map.as_ref());
    let dispatcher = Arc::new(Dispatcher::new(aliases.clone(), converse, openai));

    let version_policy = Arc::new(VersionPolicyCache::new(
        http_client,
        config.version_manifest_url.clone(),
        config.min_client_version.as_deref(),
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        aliases: Arc::new(aliases),
        dispatcher,
        store,
        tokens,
        validation_cache: Arc::new(ValidationCache::new()),
        version_policy,
        shutdown: Arc::new(ShutdownCoordinator::new()),
        start_time: Instant::now(),
    };

    let shutdown = state.shutdown.clone();
    let (addr, handle) = listen(state, config.port).await?;
    info!(%addr, "oc-router listening");

    wait_for_shutdown_signal().await;
    info!("shutdown signal received, draining in-flight requests");
    shutdown.shutdown();

    if let Err(err) = handle.await {
        error!(error = %err, "server task panicked");
    }

    Ok(())
}

/// Waits for SIGTERM or SIGINT (Ctrl-C). Per the graceful-shutdown
/// contract, the worker pool used for blocking store/SDK calls is not
/// drained here — in-flight requests are given a chance to finish via the
/// Axum listener's graceful shutdown, but the process does not wait on
/// detached blocking tasks.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        let mut interrupt = signal(SignalKind::interrupt()).expect("install SIGINT handler");
        tokio::select! {
            _ = terminate.recv() => {}
            _ = interrupt.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
