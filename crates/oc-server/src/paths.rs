//! Path-prefix bypass rules shared by the version gate, authenticator, and
//! logger middleware stages.

#[must_use]
pub fn is_health_path(path: &str) -> bool {
    path == "/health" || path == "/ready" || path.starts_with("/health/")
}

#[must_use]
pub fn is_update_path(path: &str) -> bool {
    path.starts_with("/v1/update/")
}

#[must_use]
pub fn is_api_keys_path(path: &str) -> bool {
    path.starts_with("/v1/api-keys")
}
