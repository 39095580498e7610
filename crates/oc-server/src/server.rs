//! Router assembly and the TCP listen loop.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::info;

use crate::middleware::{authenticator, logger, version_gate};
use crate::routes::{api_keys, chat, health, models, update};
use crate::state::AppState;

/// Generates UUIDv7 request ids for requests that arrive without one.
#[derive(Clone)]
struct UuidV7RequestId;

impl MakeRequestId for UuidV7RequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::now_v7().to_string();
        axum::http::HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build the full Axum router: routes, then the fixed middleware ordering
/// version gate → authenticator → logger, with request-id assignment
/// outermost so every stage (and the response) can rely on it being set.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/models", get(models::list_models))
        .route("/v1/chat/completions", post(chat::chat_completions))
        .route("/v1/api-keys", post(api_keys::create_key).get(api_keys::list_keys))
        .route("/v1/api-keys/{key_prefix}", delete(api_keys::revoke_key))
        .route("/v1/update/download-url", get(update::download_url))
        .route("/v1/update/config", get(update::update_config))
        .with_state(state.clone())
        .layer(CatchPanicLayer::new())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024))
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(600)))
        .layer(axum::middleware::from_fn_with_state(state.clone(), logger))
        .layer(axum::middleware::from_fn_with_state(state.clone(), authenticator))
        .layer(axum::middleware::from_fn_with_state(state, version_gate))
        .layer(SetRequestIdLayer::x_request_id(UuidV7RequestId))
        .layer(PropagateRequestIdLayer::x_request_id())
}

/// Bind to `0.0.0.0:{port}` and serve until the shutdown token fires.
pub async fn listen(state: AppState, port: u16) -> Result<(SocketAddr, tokio::task::JoinHandle<()>), std::io::Error> {
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    let bound_addr = listener.local_addr()?;

    let shutdown_token = state.shutdown.token();
    let router = build_router(state);

    info!(addr = %bound_addr, "server started");

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_token.cancelled().await;
                info!("server shutdown initiated");
            })
            .await;
        info!("server shutdown complete");
    });

    Ok((bound_addr, handle))
}
