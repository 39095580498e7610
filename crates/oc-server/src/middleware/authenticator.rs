//! Dual-mode authenticator: bearer JWT (signature pre-validated upstream) or
//! a long-lived `oc_`-prefixed API key. Exactly one of the two is consulted
//! per request, picked by which credential is present.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use oc_auth::api_key::{hash_key, looks_like_api_key};
use oc_core::AppError;

use crate::identity::{AuthSource, Identity};
use crate::paths::{is_api_keys_path, is_health_path, is_update_path};
use crate::state::AppState;

static API_KEY_HEADER: &str = "x-api-key";

pub async fn authenticator(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if is_health_path(path) || is_update_path(path) || is_api_keys_path(path) {
        return next.run(req).await;
    }

    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with("Bearer "));

    if let Some(header) = bearer {
        // The signature was already validated upstream; a token that fails
        // to decode here still passes through with no identity attached
        // rather than being rejected.
        if let Some(identity) = oc_auth::identity_from_bearer(Some(header)) {
            req.extensions_mut().insert(Identity {
                user_sub: identity.user_sub,
                user_email: identity.user_email,
                auth_source: AuthSource::Jwt,
            });
        }
        return next.run(req).await;
    }

    let Some(api_key) = req.headers().get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) else {
        return AppError::missing_credentials().into_response();
    };
    if !looks_like_api_key(api_key) {
        return AppError::missing_credentials().into_response();
    }

    let key_hash = hash_key(api_key);

    if let Some((user_sub, user_email)) = state.validation_cache.get(&key_hash) {
        req.extensions_mut().insert(Identity {
            user_sub,
            user_email,
            auth_source: AuthSource::ApiKey,
        });
        return next.run(req).await;
    }

    let record = match state.store.get(&key_hash).await {
        Ok(Some(record)) => record,
        Ok(None) => return AppError::invalid_api_key().into_response(),
        Err(err) => return oc_core::AppError::from(err).into_response(),
    };
    if !record.is_active() {
        return AppError::revoked_api_key().into_response();
    }
    if record.is_expired(Utc::now()) {
        return AppError::expired_api_key().into_response();
    }

    state
        .validation_cache
        .insert(key_hash.clone(), record.user_sub.clone(), record.user_email.clone());
    req.extensions_mut().insert(Identity {
        user_sub: record.user_sub.clone(),
        user_email: record.user_email.clone(),
        auth_source: AuthSource::ApiKey,
    });

    let store = state.store.clone();
    let touch_hash = key_hash.clone();
    tokio::spawn(async move {
        if let Err(err) = store.touch_last_used(&touch_hash).await {
            tracing::warn!(error = %err, "failed to record API key last_used_at");
        }
    });

    next.run(req).await
}
