//! The dual-backend dispatcher: the single entry point `/v1/chat/completions`
//! calls into, after authentication has already run.
//!
//! Resolves the requested model to its canonical id, picks a backend by
//! prefix, and either runs the request through the Converse translator or
//! forwards it untouched to the OpenAI-HTTP backend.

use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use serde_json::Value;

use oc_translate::{translate_request, translate_response, ChatCompletionRequest, StreamTranslator};

use crate::alias::{is_anthropic_family, AliasMap};
use crate::converse_client::ConverseClient;
use crate::error::DispatchError;
use crate::openai_client::OpenAiHttpClient;

/// The result of dispatching one `/v1/chat/completions` call.
pub enum DispatchOutcome {
    /// A complete unary JSON response, already translated where needed.
    Json(Value),
    /// A raw byte stream to hand back to the caller as-is (SSE framing for
    /// the Converse path, or whatever status/content-type the upstream used
    /// for the `OpenAI`-HTTP pass-through path — including non-2xx statuses,
    /// which must reach the caller verbatim rather than being collapsed to
    /// a gateway error).
    Stream {
        status: u16,
        content_type: &'static str,
        body: BoxStream<'static, Result<Bytes, DispatchError>>,
    },
}

pub struct Dispatcher {
    aliases: AliasMap,
    converse: Arc<dyn ConverseClient>,
    openai: Arc<OpenAiHttpClient>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(aliases: AliasMap, converse: Arc<dyn ConverseClient>, openai: Arc<OpenAiHttpClient>) -> Self {
        Self {
            aliases,
            converse,
            openai,
        }
    }

    /// Dispatch one request. `request_id` and `created` are supplied by the
    /// caller so every chunk of a streamed response shares the identifiers
    /// of the response it belongs to.
    pub async fn dispatch(
        &self,
        body: &Value,
        request_id: &str,
        created: i64,
    ) -> Result<DispatchOutcome, DispatchError> {
        let requested_model = body
            .get("model")
            .and_then(Value::as_str)
            .ok_or_else(|| DispatchError::InvalidBody {
                message: "missing \"model\" field".to_string(),
            })?;
        let canonical_model_id = self.aliases.resolve(requested_model);

        if is_anthropic_family(&canonical_model_id) {
            let mut parsed: ChatCompletionRequest =
                serde_json::from_value(body.clone()).map_err(|e| DispatchError::InvalidBody {
                    message: format!("malformed chat completion request: {e}"),
                })?;
            parsed.model = canonical_model_id.clone();
            self.dispatch_converse(&parsed, &canonical_model_id, request_id, created).await
        } else {
            let mut rewritten = body.clone();
            if let Some(map) = rewritten.as_object_mut() {
                let _ = map.insert("model".to_string(), Value::String(canonical_model_id));
            }
            self.dispatch_openai(&rewritten, request_id).await
        }
    }

    async fn dispatch_converse(
        &self,
        request: &ChatCompletionRequest,
        canonical_model_id: &str,
        request_id: &str,
        created: i64,
    ) -> Result<DispatchOutcome, DispatchError> {
        let converse_request = translate_request(request, canonical_model_id, true);

        if !request.stream {
            let response = self.converse.invoke(&converse_request).await?;
            let translated = translate_response(&response, request_id, canonical_model_id, created);
            return Ok(DispatchOutcome::Json(serde_json::to_value(translated).map_err(
                |e| DispatchError::Upstream {
                    message: format!("failed to encode response: {e}"),
                },
            )?));
        }

        let events = self.converse.invoke_stream(&converse_request).await?;
        let body = translate_converse_stream(events, request_id.to_string(), canonical_model_id.to_string(), created);
        Ok(DispatchOutcome::Stream {
            status: 200,
            content_type: "text/event-stream",
            body,
        })
    }

    /// Forward to the `OpenAI`-HTTP backend and pass the upstream's status
    /// through unchanged — a 4xx/429/5xx *response* from upstream is not a
    /// transport failure and must reach the caller verbatim; only a
    /// transport-level error (`DispatchError::Upstream` from `forward`
    /// itself) is a 502.
    async fn dispatch_openai(&self, body: &Value, request_id: &str) -> Result<DispatchOutcome, DispatchError> {
        let response = self.openai.forward(body, request_id).await?;
        Ok(DispatchOutcome::Stream {
            status: response.status,
            content_type: if response.content_type.contains("event-stream") {
                "text/event-stream"
            } else {
                "application/json"
            },
            body: response.body,
        })
    }
}

/// Drive a [`StreamTranslator`] over a Converse event stream, framing each
/// resulting chunk as an SSE `data:` line and always terminating with
/// `data: [DONE]`. A mid-stream error from the upstream becomes one error
/// chunk followed by the same terminator, so the client's parser always
/// sees a clean end of stream.
fn translate_converse_stream(
    events: BoxStream<'static, Result<oc_translate::converse_types::ConverseStreamEvent, DispatchError>>,
    request_id: String,
    model: String,
    created: i64,
) -> BoxStream<'static, Result<Bytes, DispatchError>> {
    let translator = StreamTranslator::new(request_id, model, created);
    let state = (events, translator, false);

    let stream = futures::stream::unfold(state, move |(mut events, mut translator, done)| async move {
        if done {
            return None;
        }
        match events.next().await {
            Some(Ok(event)) => {
                let chunks = translator.translate_event(&event);
                let framed = frame_chunks(&chunks);
                Some((Ok(framed), (events, translator, false)))
            }
            Some(Err(err)) => {
                let error_frame = frame_error(&err);
                Some((Ok(error_frame), (events, translator, true)))
            }
            None => Some((Ok(Bytes::from_static(b"data: [DONE]\n\n")), (events, translator, true))),
        }
    });

    Box::pin(stream)
}

fn frame_chunks(chunks: &[oc_translate::ChatCompletionChunk]) -> Bytes {
    let mut out = String::new();
    for chunk in chunks {
        let json = serde_json::to_string(chunk).unwrap_or_default();
        out.push_str("data: ");
        out.push_str(&json);
        out.push_str("\n\n");
    }
    Bytes::from(out.into_bytes())
}

fn frame_error(err: &DispatchError) -> Bytes {
    let payload = serde_json::json!({
        "error": { "message": err.to_string(), "type": "upstream_error" }
    });
    let mut out = String::new();
    out.push_str("data: ");
    out.push_str(&payload.to_string());
    out.push_str("\n\ndata: [DONE]\n\n");
    Bytes::from(out.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use oc_translate::converse_types::{ConverseRequest, ConverseResponse};

    struct StubConverse;

    #[async_trait]
    impl ConverseClient for StubConverse {
        async fn invoke(&self, _request: &ConverseRequest) -> Result<ConverseResponse, DispatchError> {
            let value = serde_json::json!({
                "output": {"message": {"content": [{"type": "text", "text": "hi"}]}},
                "stopReason": "end_turn",
                "usage": {"inputTokens": 1, "outputTokens": 1},
            });
            serde_json::from_value(value).map_err(|e| DispatchError::ConverseApi { message: e.to_string() })
        }

        async fn invoke_stream(
            &self,
            _request: &ConverseRequest,
        ) -> Result<BoxStream<'static, Result<oc_translate::converse_types::ConverseStreamEvent, DispatchError>>, DispatchError>
        {
            Ok(Box::pin(futures::stream::empty()))
        }
    }

    fn dispatcher() -> Dispatcher {
        let openai = OpenAiHttpClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1".to_string(),
            Arc::new(NeverCalled),
        );
        Dispatcher::new(AliasMap::defaults(), Arc::new(StubConverse), Arc::new(openai))
    }

    struct NeverCalled;

    #[async_trait]
    impl crate::converse_client::BearerSource for NeverCalled {
        async fn token(&self) -> Result<String, DispatchError> {
            Ok("unused".to_string())
        }
    }

    #[tokio::test]
    async fn anthropic_unary_request_routes_to_converse_backend() {
        let dispatcher = dispatcher();
        let body = serde_json::json!({
            "model": "claude-opus",
            "messages": [{"role": "user", "content": "hi"}],
        });
        let outcome = dispatcher.dispatch(&body, "req-1", 1_700_000_000).await.unwrap();
        let DispatchOutcome::Json(value) = outcome else {
            panic!("expected json outcome");
        };
        assert_eq!(value["choices"][0]["message"]["content"], "hi");
        assert_eq!(value["choices"][0]["finish_reason"], "stop");
    }

    #[tokio::test]
    async fn missing_model_field_is_invalid_body() {
        let dispatcher = dispatcher();
        let body = serde_json::json!({"messages": []});
        let err = dispatcher.dispatch(&body, "req-1", 0).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidBody { .. }));
    }

    #[tokio::test]
    async fn empty_converse_stream_still_terminates_with_done() {
        let dispatcher = dispatcher();
        let body = serde_json::json!({
            "model": "claude-opus",
            "stream": true,
            "messages": [{"role": "user", "content": "hi"}],
        });
        let outcome = dispatcher.dispatch(&body, "req-1", 0).await.unwrap();
        let DispatchOutcome::Stream { status, body, .. } = outcome else {
            panic!("expected stream outcome");
        };
        assert_eq!(status, 200);
        let frames: Vec<_> = body.collect().await;
        let joined: Vec<u8> = frames.into_iter().flat_map(|b| b.unwrap().to_vec()).collect();
        assert_eq!(String::from_utf8(joined).unwrap(), "data: [DONE]\n\n");
    }
}
