//! The OpenAI-compatible pass-through backend.
//!
//! Non-Anthropic models are forwarded to the upstream OpenAI-compatible HTTP
//! endpoint byte-for-byte: the dispatcher rewrites only the `model` field to
//! the resolved canonical id and otherwise leaves the request body alone,
//! and the response (including its content-type and, for streaming
//! responses, its SSE framing) passes straight back to the caller.

use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};

use crate::converse_client::BearerSource;
use crate::error::DispatchError;

/// An upstream response forwarded verbatim to the caller.
pub struct PassthroughResponse {
    pub status: u16,
    pub content_type: String,
    pub body: BoxStream<'static, Result<Bytes, DispatchError>>,
}

pub struct OpenAiHttpClient {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn BearerSource>,
}

impl OpenAiHttpClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, tokens: Arc<dyn BearerSource>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            tokens,
        }
    }

    /// Forward a chat-completions request body (with `model` already
    /// rewritten to its canonical id) to the upstream endpoint, returning
    /// the response unmodified except for transport-level decoding. Any
    /// upstream HTTP status — including 4xx/5xx — is carried through on
    /// [`PassthroughResponse::status`] rather than treated as an error;
    /// only a transport failure (connection refused, timeout, …) is an
    /// `Err`.
    pub async fn forward(&self, body: &serde_json::Value, request_id: &str) -> Result<PassthroughResponse, DispatchError> {
        let token = self.tokens.token().await?;
        let url = format!("{}/v1/chat/completions", self.base_url);
        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .header("x-request-id", request_id)
            .json(body)
            .send()
            .await
            .map_err(|e| DispatchError::Upstream { message: e.to_string() })?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();
        let stream = resp
            .bytes_stream()
            .map(|r| r.map_err(|e| DispatchError::Upstream { message: e.to_string() }));

        Ok(PassthroughResponse {
            status,
            content_type,
            body: Box::pin(stream),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedSource;

    #[async_trait]
    impl BearerSource for FixedSource {
        async fn token(&self) -> Result<String, DispatchError> {
            Ok("token-xyz".to_string())
        }
    }

    #[tokio::test]
    async fn forwards_request_and_preserves_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string("{\"id\":\"chatcmpl-1\"}"),
            )
            .mount(&server)
            .await;

        let client = OpenAiHttpClient::new(reqwest::Client::new(), server.uri(), Arc::new(FixedSource));
        let body = serde_json::json!({"model": "deepseek.v3.2", "messages": []});
        let resp = client.forward(&body, "req-abc").await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type, "application/json");
        let bytes: Vec<_> = resp.body.collect().await;
        let joined: Vec<u8> = bytes.into_iter().flat_map(|b| b.unwrap().to_vec()).collect();
        assert_eq!(String::from_utf8(joined).unwrap(), "{\"id\":\"chatcmpl-1\"}");
    }

    #[tokio::test]
    async fn sends_request_id_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(wiremock::matchers::header("x-request-id", "req-xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let client = OpenAiHttpClient::new(reqwest::Client::new(), server.uri(), Arc::new(FixedSource));
        let body = serde_json::json!({"model": "deepseek.v3.2"});
        let resp = client.forward(&body, "req-xyz").await.unwrap();
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn non_2xx_upstream_status_passes_through_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("content-type", "application/json")
                    .set_body_string("{\"error\":{\"message\":\"rate limited\"}}"),
            )
            .mount(&server)
            .await;

        let client = OpenAiHttpClient::new(reqwest::Client::new(), server.uri(), Arc::new(FixedSource));
        let body = serde_json::json!({"model": "deepseek.v3.2"});
        let resp = client.forward(&body, "req-429").await.unwrap();
        assert_eq!(resp.status, 429);
        let bytes: Vec<_> = resp.body.collect().await;
        let joined: Vec<u8> = bytes.into_iter().flat_map(|b| b.unwrap().to_vec()).collect();
        assert_eq!(String::from_utf8(joined).unwrap(), "{\"error\":{\"message\":\"rate limited\"}}");
    }

    #[tokio::test]
    async fn surfaces_transport_failure_as_upstream_error() {
        let client = OpenAiHttpClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1".to_string(),
            Arc::new(FixedSource),
        );
        let body = serde_json::json!({"model": "x"});
        let err = client.forward(&body, "req-1").await.unwrap_err();
        assert!(matches!(err, DispatchError::Upstream { .. }));
    }
}
