//! The native Converse backend client.
//!
//! The upstream platform exposes Converse over plain HTTP/2 (`POST
//! .../converse` and `.../converse-stream`), so — per the REDESIGN FLAGS
//! design note — there is no blocking SDK call to offload onto a worker
//! pool here: `reqwest` already drives both the unary call and the event
//! stream on the async runtime, so the per-event worker hop the original
//! blocking-iterator design needed simply doesn't apply.

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};

use oc_translate::converse_types::{ConverseRequest, ConverseResponse, ConverseStreamEvent};

use crate::error::DispatchError;
use crate::sse::parse_sse_lines;

/// Something that can hand back a valid bearer token on demand. Implemented
/// for [`oc_tokens::TokenCache`] so the same process-wide cache backs both
/// this client and the `OpenAI`-HTTP backend, per the shared-resource model.
#[async_trait]
pub trait BearerSource: Send + Sync {
    async fn token(&self) -> Result<String, DispatchError>;
}

#[async_trait]
impl<S: oc_tokens::TokenSource> BearerSource for oc_tokens::TokenCache<S> {
    async fn token(&self) -> Result<String, DispatchError> {
        Ok(self.get().await?)
    }
}

#[async_trait]
pub trait ConverseClient: Send + Sync {
    async fn invoke(&self, request: &ConverseRequest) -> Result<ConverseResponse, DispatchError>;

    async fn invoke_stream(
        &self,
        request: &ConverseRequest,
    ) -> Result<BoxStream<'static, Result<ConverseStreamEvent, DispatchError>>, DispatchError>;
}

pub struct HttpConverseClient {
    client: reqwest::Client,
    base_url: String,
    tokens: std::sync::Arc<dyn BearerSource>,
}

impl HttpConverseClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, tokens: std::sync::Arc<dyn BearerSource>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            tokens,
        }
    }

    async fn auth_headers(&self) -> Result<reqwest::header::HeaderMap, DispatchError> {
        let token = self.tokens.token().await?;
        let mut headers = reqwest::header::HeaderMap::new();
        let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
            DispatchError::ConverseApi {
                message: format!("invalid token header: {e}"),
            }
        })?;
        let _ = headers.insert(reqwest::header::AUTHORIZATION, value);
        Ok(headers)
    }
}

#[async_trait]
impl ConverseClient for HttpConverseClient {
    async fn invoke(&self, request: &ConverseRequest) -> Result<ConverseResponse, DispatchError> {
        let headers = self.auth_headers().await?;
        let url = format!("{}/model/{}/converse", self.base_url, request.model_id);
        let resp = self
            .client
            .post(url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| DispatchError::ConverseApi { message: e.to_string() })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DispatchError::ConverseApi {
                message: format!("HTTP {status}: {body}"),
            });
        }

        resp.json::<ConverseResponse>()
            .await
            .map_err(|e| DispatchError::ConverseApi { message: e.to_string() })
    }

    async fn invoke_stream(
        &self,
        request: &ConverseRequest,
    ) -> Result<BoxStream<'static, Result<ConverseStreamEvent, DispatchError>>, DispatchError> {
        let headers = self.auth_headers().await?;
        let url = format!("{}/model/{}/converse-stream", self.base_url, request.model_id);
        let resp = self
            .client
            .post(url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| DispatchError::ConverseApi { message: e.to_string() })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DispatchError::ConverseApi {
                message: format!("HTTP {status}: {body}"),
            });
        }

        let byte_stream = resp
            .bytes_stream()
            .map(|r| r.map_err(|e| DispatchError::ConverseApi { message: e.to_string() }));
        let lines = parse_sse_lines(Box::pin(byte_stream));
        let events = lines.map(|line| {
            let line = line?;
            serde_json::from_str::<ConverseStreamEvent>(&line).map_err(|e| DispatchError::ConverseApi {
                message: format!("malformed stream event: {e}"),
            })
        });
        Ok(Box::pin(events))
    }
}
