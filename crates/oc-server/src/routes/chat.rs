//! `POST /v1/chat/completions` — the dual-backend dispatch endpoint.

use axum::body::Body;
use axum::extract::{Extension, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use futures::StreamExt;
use serde_json::Value;
use tower_http::request_id::RequestId;

use oc_core::AppError;
use oc_dispatch::DispatchOutcome;

use crate::state::AppState;

pub async fn chat_completions(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<Value>,
) -> Response {
    let request_id = request_id.header_value().to_str().unwrap_or("unknown").to_string();
    let created = Utc::now().timestamp();

    match state.dispatcher.dispatch(&body, &request_id, created).await {
        Ok(DispatchOutcome::Json(value)) => (StatusCode::OK, Json(value)).into_response(),
        Ok(DispatchOutcome::Stream { status, content_type, body }) => {
            let stream = body.map(|r| r.map_err(std::io::Error::other));
            let mut response = Response::new(Body::from_stream(stream));
            *response.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            let headers = response.headers_mut();
            let _ = headers.insert(header::CONTENT_TYPE, content_type.parse().expect("static content type"));
            if content_type == "text/event-stream" {
                let _ = headers.insert(header::CACHE_CONTROL, "no-cache".parse().expect("static header value"));
            }
            response
        }
        Err(err) => AppError::from(err).into_response(),
    }
}
