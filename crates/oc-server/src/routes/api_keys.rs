//! Key-lifecycle endpoints: create, list, revoke. All three require a
//! bearer identity directly — these paths bypass the generic authenticator
//! (see the middleware path-bypass rules) since API keys can't be used to
//! manage API keys.

use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use oc_auth::api_key::{generate_key, hash_key, DEFAULT_EXPIRY_DAYS, MAX_EXPIRY_DAYS, MAX_KEYS_PER_USER, MIN_EXPIRY_DAYS};
use oc_auth::JwtIdentity;
use oc_core::AppError;
use oc_store::record::RECORD_RETENTION_AFTER_EXPIRY_SECS;
use oc_store::{ApiKeyRecord, ApiKeyStatus};

use crate::state::AppState;

fn bearer_identity(headers: &axum::http::HeaderMap) -> Result<JwtIdentity, AppError> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    oc_auth::identity_from_bearer(header).ok_or_else(AppError::missing_credentials)
}

#[derive(Deserialize, Default)]
pub struct CreateKeyRequest {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    expires_in_days: Option<i64>,
}

#[derive(Serialize)]
struct CreateKeyResponse {
    api_key: String,
    key_prefix: String,
    description: String,
    status: ApiKeyStatus,
    created_at: chrono::DateTime<Utc>,
    expires_at: chrono::DateTime<Utc>,
}

pub async fn create_key(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    body: Option<Json<CreateKeyRequest>>,
) -> Response {
    let identity = match bearer_identity(&headers) {
        Ok(identity) => identity,
        Err(err) => return err.into_response(),
    };
    let Json(request) = body.unwrap_or_default();

    let expires_in_days = request.expires_in_days.unwrap_or(DEFAULT_EXPIRY_DAYS);
    if !(MIN_EXPIRY_DAYS..=MAX_EXPIRY_DAYS).contains(&expires_in_days) {
        return AppError::Validation {
            message: format!("expires_in_days must be between {MIN_EXPIRY_DAYS} and {MAX_EXPIRY_DAYS}"),
            code: "invalid_expiry",
        }
        .into_response();
    }

    let existing = match state.store.query_by_user(&identity.user_sub).await {
        Ok(records) => records,
        Err(err) => return AppError::from(err).into_response(),
    };
    let active_count = existing.iter().filter(|r| r.is_active()).count();
    if active_count >= MAX_KEYS_PER_USER {
        return AppError::Conflict {
            message: format!("Maximum of {MAX_KEYS_PER_USER} active API keys per user"),
            code: "key_limit_exceeded",
        }
        .into_response();
    }

    let raw_key = generate_key();
    let key_hash = hash_key(&raw_key);
    let key_prefix: String = raw_key.chars().take(10).collect();
    let description = request.description.unwrap_or_default();
    let created_at = Utc::now();
    let expires_at = created_at + Duration::days(expires_in_days);

    let record = ApiKeyRecord {
        key_hash,
        key_prefix: key_prefix.clone(),
        user_sub: identity.user_sub,
        user_email: identity.user_email,
        description: description.clone(),
        status: ApiKeyStatus::Active,
        created_at,
        expires_at,
        revoked_at: None,
        last_used_at: None,
        ttl: expires_at.timestamp() + RECORD_RETENTION_AFTER_EXPIRY_SECS,
    };

    if let Err(err) = state.store.put(record).await {
        return AppError::from(err).into_response();
    }

    (
        StatusCode::CREATED,
        Json(CreateKeyResponse {
            api_key: raw_key,
            key_prefix,
            description,
            status: ApiKeyStatus::Active,
            created_at,
            expires_at,
        }),
    )
        .into_response()
}

pub async fn list_keys(State(state): State<AppState>, headers: axum::http::HeaderMap) -> Response {
    let identity = match bearer_identity(&headers) {
        Ok(identity) => identity,
        Err(err) => return err.into_response(),
    };
    let records = match state.store.query_by_user(&identity.user_sub).await {
        Ok(records) => records,
        Err(err) => return AppError::from(err).into_response(),
    };

    let data: Vec<Value> = records
        .into_iter()
        .map(|r| {
            json!({
                "key_prefix": r.key_prefix,
                "description": r.description,
                "status": r.status,
                "created_at": r.created_at,
                "expires_at": r.expires_at,
                "last_used_at": r.last_used_at,
            })
        })
        .collect();
    Json(json!({ "data": data })).into_response()
}

pub async fn revoke_key(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Path(key_prefix): Path<String>,
) -> Response {
    let identity = match bearer_identity(&headers) {
        Ok(identity) => identity,
        Err(err) => return err.into_response(),
    };

    let records = match state.store.query_by_user(&identity.user_sub).await {
        Ok(records) => records,
        Err(err) => return AppError::from(err).into_response(),
    };
    let Some(record) = records.into_iter().find(|r| r.key_prefix == key_prefix) else {
        return AppError::NotFound {
            message: "API key not found".to_string(),
            code: "key_not_found",
        }
        .into_response();
    };
    if !record.is_active() {
        return AppError::Conflict {
            message: "API key has already been revoked".to_string(),
            code: "already_revoked",
        }
        .into_response();
    }

    match state.store.conditional_revoke(&record.key_hash, &identity.user_sub).await {
        Ok(_) => {
            state.validation_cache.invalidate(&record.key_hash);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => AppError::from(err).into_response(),
    }
}
