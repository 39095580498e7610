//! Wire types for the Converse-style invocation API: the parameters the
//! translator builds for a call, and the unary/streaming response shapes it
//! consumes.

use oc_core::message::{ContentBlock, Message, SystemBlock, ToolChoice, ToolListEntry};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Default, Serialize)]
pub struct InferenceConfig {
    #[serde(rename = "maxTokens", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(rename = "topP", skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(rename = "stopSequences", skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

impl InferenceConfig {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max_tokens.is_none()
            && self.temperature.is_none()
            && self.top_p.is_none()
            && self.stop_sequences.is_none()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ToolConfig {
    pub tools: Vec<ToolListEntry>,
    #[serde(rename = "toolChoice", skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

/// One invocation of the native backend, built by the request translator
/// and handed to [`crate::ConverseClient`].
#[derive(Clone, Debug, Serialize)]
pub struct ConverseRequest {
    #[serde(rename = "modelId")]
    pub model_id: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub system: Vec<SystemBlock>,
    #[serde(rename = "inferenceConfig", skip_serializing_if = "InferenceConfig::is_empty")]
    pub inference_config: InferenceConfig,
    #[serde(rename = "toolConfig", skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
    #[serde(
        rename = "additionalModelRequestFields",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_model_request_fields: Option<Value>,
}

// ── Unary response ──────────────────────────────────────────────────────

#[derive(Clone, Debug, Deserialize)]
pub struct ConverseResponse {
    pub output: ConverseOutput,
    #[serde(rename = "stopReason")]
    pub stop_reason: String,
    pub usage: ConverseUsage,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ConverseOutput {
    pub message: ConverseMessage,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ConverseMessage {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConverseUsage {
    #[serde(rename = "inputTokens", default)]
    pub input_tokens: u64,
    #[serde(rename = "outputTokens", default)]
    pub output_tokens: u64,
    #[serde(rename = "cacheReadInputTokens", default)]
    pub cache_read_input_tokens: u64,
    #[serde(rename = "cacheWriteInputTokens", default)]
    pub cache_write_input_tokens: u64,
}

// ── Streaming events ─────────────────────────────────────────────────────

/// One event off the Converse event stream. Tagged on `type` purely for
/// this crate's own wire format — the concrete SDK/HTTP transport that
/// produces these lives in `oc-dispatch`, which is responsible for
/// deserializing whatever the real event stream encoding is into this
/// shape before handing events to the stream translator.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConverseStreamEvent {
    MessageStart {
        #[allow(dead_code)]
        role: String,
    },
    ContentBlockStart {
        #[serde(rename = "contentBlockIndex")]
        content_block_index: u32,
        start: ContentBlockStart,
    },
    ContentBlockDelta {
        #[serde(rename = "contentBlockIndex")]
        content_block_index: u32,
        delta: ContentBlockDelta,
    },
    ContentBlockStop {
        #[serde(rename = "contentBlockIndex")]
        #[allow(dead_code)]
        content_block_index: u32,
    },
    MessageStop {
        #[serde(rename = "stopReason")]
        stop_reason: String,
    },
    Metadata {
        usage: ConverseUsage,
    },
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentBlockStart {
    ToolUse { #[serde(rename = "toolUseId")] tool_use_id: String, name: String },
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentBlockDelta {
    Text { text: String },
    ReasoningContent { text: String },
    ToolUse { input: String },
}

/// Fixed Converse `stopReason` → OpenAI `finish_reason` mapping (§4.5).
#[must_use]
pub fn map_stop_reason(stop_reason: &str) -> &'static str {
    match stop_reason {
        "end_turn" | "stop_sequence" => "stop",
        "tool_use" => "tool_calls",
        "max_tokens" => "length",
        "content_filtered" => "content_filter",
        _ => "stop",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_reason_table_matches_spec() {
        assert_eq!(map_stop_reason("end_turn"), "stop");
        assert_eq!(map_stop_reason("stop_sequence"), "stop");
        assert_eq!(map_stop_reason("tool_use"), "tool_calls");
        assert_eq!(map_stop_reason("max_tokens"), "length");
        assert_eq!(map_stop_reason("content_filtered"), "content_filter");
        assert_eq!(map_stop_reason("anything_else"), "stop");
    }

    #[test]
    fn inference_config_empty_check() {
        assert!(InferenceConfig::default().is_empty());
        let cfg = InferenceConfig {
            max_tokens: Some(100),
            ..Default::default()
        };
        assert!(!cfg.is_empty());
    }
}
