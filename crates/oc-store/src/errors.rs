//! Store error types.

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A conditional write (revoke-by-owner) found the record already gone
    /// or owned by a different user.
    #[error("record not found or not owned by the expected user")]
    ConditionFailed,
}

impl From<StoreError> for oc_core::AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConditionFailed => oc_core::AppError::NotFound {
                message: "API key not found".to_string(),
                code: "key_not_found",
            },
            StoreError::Io(_) | StoreError::Json(_) => oc_core::AppError::ServerInternal {
                message: "API key store error".to_string(),
                code: "store_unavailable",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_failed_maps_to_not_found() {
        let err: oc_core::AppError = StoreError::ConditionFailed.into();
        assert_eq!(err.body()["error"]["code"], "key_not_found");
    }
}
