//! Liveness and readiness. Unconditional 200 on `/health` — it never touches
//! the dispatcher or store, and per the Logger bypass it is never logged.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "oc-router",
        "version": state.config.service_version,
        "timestamp": Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    }))
}

pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.tokens.token().await {
        Ok(_) => (StatusCode::OK, Json(json!({ "token_status": "valid" }))),
        Err(err) => {
            tracing::warn!(error = %err, "readiness token fetch failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "not_ready" })))
        }
    }
}
