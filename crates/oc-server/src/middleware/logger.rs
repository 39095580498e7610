//! Request-scoped structured logging. Health-path requests are never
//! logged, matching the Logger bypass in the middleware pipeline.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tower_http::request_id::RequestId;

use crate::paths::is_health_path;

pub async fn logger(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    if is_health_path(&path) {
        return next.run(req).await;
    }

    let method = req.method().clone();
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let start = Instant::now();
    tracing::info!(request_id = %request_id, %method, %path, "request started");

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis();
    if status >= 500 {
        tracing::error!(request_id = %request_id, status, duration_ms, "request failed");
    } else {
        tracing::info!(request_id = %request_id, status, duration_ms, "request completed");
    }

    response
}
