//! The per-request identity the authenticator attaches to a request's
//! extensions, and the request-scoped bag the logger and dispatcher read.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthSource {
    Jwt,
    ApiKey,
}

impl AuthSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jwt => "jwt",
            Self::ApiKey => "api_key",
        }
    }
}

/// Caller identity resolved by the authenticator, attached to the request
/// extensions for downstream handlers and the logger to read.
#[derive(Clone, Debug)]
pub struct Identity {
    pub user_sub: String,
    pub user_email: String,
    pub auth_source: AuthSource,
}
