//! Version gate: rejects requests from clients below the configured
//! minimum semver. Every bypass listed in the component design is a
//! fail-open path — an unreachable manifest, an absent header, or a
//! malformed version must never block a request.

use axum::extract::{Request, State};
use axum::http::header::HeaderName;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use oc_core::version::ClientVersion;
use oc_core::AppError;

use crate::paths::{is_health_path, is_update_path};
use crate::state::AppState;

static CLIENT_VERSION_HEADER: HeaderName = HeaderName::from_static("x-client-version");

pub async fn version_gate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if is_health_path(path) || is_update_path(path) {
        return next.run(req).await;
    }

    let Some(header_value) = req.headers().get(&CLIENT_VERSION_HEADER).and_then(|v| v.to_str().ok()) else {
        return next.run(req).await;
    };
    if header_value == "dev" {
        return next.run(req).await;
    }

    let Some(minimum) = state.version_policy.minimum().await else {
        return next.run(req).await;
    };
    let Ok(client_version) = ClientVersion::parse(header_value) else {
        return next.run(req).await;
    };

    if client_version.satisfies_minimum(&minimum) {
        return next.run(req).await;
    }

    AppError::VersionRequired {
        minimum_version: minimum.to_string(),
        your_version: client_version.to_string(),
        update_command: update_command(state.config.distribution_domain.as_deref()),
    }
    .into_response()
}

fn update_command(distribution_domain: Option<&str>) -> String {
    match distribution_domain {
        Some(domain) => format!("curl -fsSL https://{domain}/install | sh"),
        None => "contact your administrator for an update".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_command_embeds_configured_domain() {
        assert_eq!(
            update_command(Some("dl.example.test")),
            "curl -fsSL https://dl.example.test/install | sh"
        );
    }

    #[test]
    fn update_command_falls_back_without_domain() {
        assert_eq!(update_command(None), "contact your administrator for an update");
    }
}
