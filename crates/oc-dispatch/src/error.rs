//! Dispatcher error types and their mapping onto the uniform HTTP envelope.

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid request body: {message}")]
    InvalidBody { message: String },

    #[error("failed to acquire upstream token: {0}")]
    Token(#[from] oc_tokens::TokenError),

    #[error("upstream request failed: {message}")]
    Upstream { message: String },

    #[error("converse backend error: {message}")]
    ConverseApi { message: String },
}

impl From<DispatchError> for oc_core::AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::InvalidBody { message } => oc_core::AppError::Validation {
                message,
                code: "invalid_request_body",
            },
            DispatchError::Token(_) => oc_core::AppError::ServerInternal {
                message: "failed to acquire upstream credentials".to_string(),
                code: "token_unavailable",
            },
            DispatchError::Upstream { .. } | DispatchError::ConverseApi { .. } => {
                oc_core::AppError::BadGateway {
                    message: "upstream call failed".to_string(),
                    code: "upstream_error",
                }
            }
        }
    }
}
