//! The uniform error envelope.
//!
//! Every error surfaced to a client is one of these kinds. Each kind maps to
//! exactly one HTTP status code (per the table in the spec's Error Handling
//! Design section) and serializes to `{"error": {"message", "type", "code",
//! ...extras}}`. Internal detail (upstream exception text, stack traces)
//! never reaches this type — callers log it and construct a generic
//! [`AppError`] instead.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, code: &'static str },

    #[error("{message}")]
    AuthMissing { message: String, code: &'static str },

    #[error("{message}")]
    NotFound { message: String, code: &'static str },

    #[error("{message}")]
    Conflict { message: String, code: &'static str },

    #[error("client version below minimum")]
    VersionRequired {
        minimum_version: String,
        your_version: String,
        update_command: String,
    },

    #[error("{message}")]
    ServerInternal { message: String, code: &'static str },

    #[error("{message}")]
    BadGateway { message: String, code: &'static str },

    #[error("{message}")]
    NotReady { message: String, code: &'static str },
}

impl AppError {
    #[must_use]
    pub fn missing_credentials() -> Self {
        Self::AuthMissing {
            message: "Authentication required".to_string(),
            code: "missing_credentials",
        }
    }

    #[must_use]
    pub fn invalid_api_key() -> Self {
        Self::AuthMissing {
            message: "Invalid API key".to_string(),
            code: "invalid_api_key",
        }
    }

    #[must_use]
    pub fn revoked_api_key() -> Self {
        Self::AuthMissing {
            message: "API key has been revoked".to_string(),
            code: "revoked_api_key",
        }
    }

    #[must_use]
    pub fn expired_api_key() -> Self {
        Self::AuthMissing {
            message: "API key has expired".to_string(),
            code: "expired_api_key",
        }
    }

    #[must_use]
    pub fn invalid_json() -> Self {
        Self::Validation {
            message: "Invalid JSON in request body".to_string(),
            code: "invalid_json",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::AuthMissing { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::VersionRequired { .. } => StatusCode::from_u16(426).unwrap(),
            Self::ServerInternal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            Self::NotReady { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Build the `{error: {...}}` JSON body without attaching it to a response.
    /// Used both by the axum `IntoResponse` impl and by the streaming path,
    /// which embeds the same shape in an in-band SSE error chunk.
    #[must_use]
    pub fn body(&self) -> Value {
        match self {
            Self::Validation { message, code } => json!({
                "error": { "message": message, "type": "invalid_request_error", "code": code }
            }),
            Self::AuthMissing { message, code } => json!({
                "error": { "message": message, "type": "auth_error", "code": code }
            }),
            Self::NotFound { message, code } => json!({
                "error": { "message": message, "type": "not_found_error", "code": code }
            }),
            Self::Conflict { message, code } => json!({
                "error": { "message": message, "type": "conflict_error", "code": code }
            }),
            Self::VersionRequired {
                minimum_version,
                your_version,
                update_command,
            } => json!({
                "error": {
                    "message": format!(
                        "Client version {your_version} is below the minimum supported version {minimum_version}"
                    ),
                    "type": "version_error",
                    "code": "client_outdated",
                    "minimum_version": minimum_version,
                    "your_version": your_version,
                    "update_command": update_command,
                }
            }),
            Self::ServerInternal { message, code } => json!({
                "error": { "message": message, "type": "server_error", "code": code }
            }),
            Self::BadGateway { message, code } => json!({
                "error": { "message": message, "type": "server_error", "code": code }
            }),
            Self::NotReady { message, code } => json!({
                "error": { "message": message, "type": "not_ready_error", "code": code }
            }),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_is_401() {
        let err = AppError::missing_credentials();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.body()["error"]["code"], "missing_credentials");
    }

    #[test]
    fn version_required_is_426_with_extras() {
        let err = AppError::VersionRequired {
            minimum_version: "1.0.0".to_string(),
            your_version: "0.1.0".to_string(),
            update_command: "curl -fsSL https://example.test/install | sh".to_string(),
        };
        assert_eq!(err.status().as_u16(), 426);
        let body = err.body();
        assert_eq!(body["error"]["code"], "client_outdated");
        assert_eq!(body["error"]["minimum_version"], "1.0.0");
        assert_eq!(body["error"]["your_version"], "0.1.0");
    }

    #[test]
    fn conflict_is_409() {
        let err = AppError::Conflict {
            message: "Maximum of 10 active API keys per user".to_string(),
            code: "key_limit_exceeded",
        };
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert!(err.body()["error"]["message"].as_str().unwrap().contains("10 active API keys"));
    }

    #[test]
    fn bad_gateway_is_502() {
        let err = AppError::BadGateway {
            message: "upstream call failed".to_string(),
            code: "upstream_error",
        };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn not_ready_is_503() {
        let err = AppError::NotReady {
            message: "token generation failed".to_string(),
            code: "token_unavailable",
        };
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn envelope_shape_is_uniform() {
        let err = AppError::invalid_json();
        let body = err.body();
        assert!(body["error"]["message"].is_string());
        assert!(body["error"]["type"].is_string());
        assert!(body["error"]["code"].is_string());
    }
}
