//! Auth error types.

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authentication required")]
    MissingCredentials,

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("API key has been revoked")]
    RevokedApiKey,

    #[error("API key has expired")]
    ExpiredApiKey,

    #[error("internal authentication error: {0}")]
    Internal(String),
}

impl From<AuthError> for oc_core::AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => oc_core::AppError::missing_credentials(),
            AuthError::InvalidApiKey => oc_core::AppError::invalid_api_key(),
            AuthError::RevokedApiKey => oc_core::AppError::revoked_api_key(),
            AuthError::ExpiredApiKey => oc_core::AppError::expired_api_key(),
            AuthError::Internal(message) => oc_core::AppError::AuthMissing {
                message,
                code: "internal_error",
            },
        }
    }
}
