//! `GET /v1/update/*` — thin collaborators per the system overview: they
//! proxy a presigned-URL/static-document lookup and carry no protocol-
//! translation logic. Their only job is to exist under `/v1/update/*` so a
//! version-gated client can still reach them (see the gate bypass rule).

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::response::{IntoResponse, Json, Response};
use chrono::{Duration, Utc};
use serde_json::json;

use oc_core::AppError;

use crate::state::AppState;

fn require_bearer(headers: &axum::http::HeaderMap) -> Result<(), AppError> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    oc_auth::identity_from_bearer(header)
        .map(|_| ())
        .ok_or_else(AppError::missing_credentials)
}

pub async fn download_url(State(state): State<AppState>, headers: axum::http::HeaderMap) -> Response {
    if let Err(err) = require_bearer(&headers) {
        return err.into_response();
    }

    let Some(domain) = state.config.distribution_domain.as_deref().or(state.config.distribution_bucket.as_deref())
    else {
        return AppError::NotReady {
            message: "no distribution bucket configured".to_string(),
            code: "config_error",
        }
        .into_response();
    };

    let expires_at = Utc::now() + Duration::minutes(15);
    let url = format!(
        "https://{domain}/installer/{version}/install.sh?expires={expires}",
        version = state.config.service_version,
        expires = expires_at.timestamp(),
    );
    Json(json!({ "url": url, "expires_at": expires_at })).into_response()
}

pub async fn update_config(State(state): State<AppState>, headers: axum::http::HeaderMap) -> Response {
    if let Err(err) = require_bearer(&headers) {
        return err.into_response();
    }

    match &state.config.published_client_config {
        Some(patch) => Json(patch.clone()).into_response(),
        None => AppError::NotFound {
            message: "no client config has been published".to_string(),
            code: "no_config_published",
        }
        .into_response(),
    }
}
