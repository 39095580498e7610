//! OpenAI chat-completion request → Converse invocation parameters.

use std::collections::BTreeSet;

use oc_core::message::{
    CachePointMarker, ContentBlock, ImageFormat, ImageSource, Message, Role, SystemBlock,
    ToolInputSchema, ToolListEntry, ToolResultContent, ToolResultStatus, ToolSpec,
};
use serde_json::Value;

use crate::converse_types::{ConverseRequest, InferenceConfig, ToolConfig};
use crate::openai_types::{ChatCompletionRequest, ChatMessage, ContentPart};

/// Default budget when a thinking request carries no explicit
/// `budget_tokens` (§4.5 Extended thinking).
pub const DEFAULT_THINKING_BUDGET_TOKENS: u32 = 10_000;

/// Translate one OpenAI-shaped request body into a [`ConverseRequest`].
///
/// `canonical_model_id` is the already-resolved upstream model id (the
/// dispatcher owns alias resolution); `enable_cache` is `true` for the
/// Anthropic-family backend and `false` otherwise.
#[must_use]
pub fn translate_request(req: &ChatCompletionRequest, canonical_model_id: &str, enable_cache: bool) -> ConverseRequest {
    let mut system = Vec::new();
    let mut messages: Vec<Message> = Vec::new();

    for msg in &req.messages {
        match msg.role.as_str() {
            "system" | "developer" => {
                for text in extract_text_parts(msg.content.as_ref()) {
                    system.push(SystemBlock::Text { text });
                }
            }
            "tool" => {
                let block = ContentBlock::ToolResult {
                    tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
                    content: vec![ToolResultContent::Text {
                        text: content_as_plain_text(msg.content.as_ref()),
                    }],
                    status: Some(ToolResultStatus::Success),
                };
                push_tool_result(&mut messages, block);
            }
            "user" => {
                let blocks = translate_user_content(msg.content.as_ref());
                if !blocks.is_empty() {
                    messages.push(Message::user(blocks));
                }
            }
            "assistant" => {
                let mut blocks = translate_user_content(msg.content.as_ref());
                if let Some(tool_calls) = &msg.tool_calls {
                    if !tool_calls.is_empty() {
                        // Converse rejects an empty text block alongside toolUse.
                        blocks.retain(|b| !matches!(b, ContentBlock::Text { text } if text.is_empty()));
                        for call in tool_calls {
                            let input = serde_json::from_str::<Value>(&call.function.arguments)
                                .unwrap_or_else(|_| {
                                    serde_json::json!({ "raw": call.function.arguments })
                                });
                            blocks.push(ContentBlock::ToolUse {
                                tool_use_id: call.id.clone(),
                                name: call.function.name.clone(),
                                input,
                            });
                        }
                    }
                }
                if !blocks.is_empty() {
                    messages.push(Message::assistant(blocks));
                }
            }
            _ => {}
        }
    }

    if enable_cache && !system.is_empty() {
        system.push(SystemBlock::CachePoint {
            cache_type: "default".to_string(),
        });
    }

    let tool_config = build_tool_config(req, &messages, enable_cache);

    let inference_config = InferenceConfig {
        max_tokens: req.max_tokens,
        temperature: req.temperature,
        top_p: req.top_p,
        stop_sequences: req.stop.as_ref().and_then(value_to_stop_sequences),
    };

    let additional_model_request_fields = thinking_fields(req);

    ConverseRequest {
        model_id: canonical_model_id.to_string(),
        messages,
        system,
        inference_config,
        tool_config,
        additional_model_request_fields,
    }
}

/// Role-merge rule (§4.5): a `tool` message's result joins the preceding
/// user message if one is open, otherwise starts a fresh user message —
/// this is what keeps the canonical sequence strictly alternating.
fn push_tool_result(messages: &mut Vec<Message>, block: ContentBlock) {
    match messages.last_mut() {
        Some(last) if last.role == Role::User => last.content.push(block),
        _ => messages.push(Message::user(vec![block])),
    }
}

fn extract_text_parts(content: Option<&Value>) -> Vec<String> {
    match content {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str).map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn content_as_plain_text(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn translate_user_content(content: Option<&Value>) -> Vec<ContentBlock> {
    match content {
        // An empty string still yields a text block, not nothing — dropping
        // the turn here would perturb the strict-alternation/merge
        // bookkeeping a following `tool` message relies on.
        Some(Value::String(s)) => vec![ContentBlock::Text { text: s.clone() }],
        Some(Value::Array(raw_parts)) => {
            let mut blocks = Vec::new();
            for raw in raw_parts {
                let Ok(part) = serde_json::from_value::<ContentPart>(raw.clone()) else {
                    continue;
                };
                match part {
                    ContentPart::Text { text, cache_control } => {
                        blocks.push(ContentBlock::Text { text });
                        if cache_control.is_some() {
                            blocks.push(ContentBlock::CachePoint {
                                cache_type: "default".to_string(),
                            });
                        }
                    }
                    ContentPart::ImageUrl { image_url } => {
                        blocks.push(translate_image_url(&image_url.url));
                    }
                }
            }
            blocks
        }
        _ => Vec::new(),
    }
}

/// Decode a `data:<mime>;base64,<body>` URL into an image block, or fall
/// back to a text placeholder for any remote URL (fetching is out of
/// scope, §4.5).
fn translate_image_url(url: &str) -> ContentBlock {
    if let Some(rest) = url.strip_prefix("data:") {
        if let Some((header, body)) = rest.split_once(";base64,") {
            if let Some(format) = mime_to_image_format(header) {
                return ContentBlock::Image {
                    source: ImageSource {
                        format,
                        bytes: body.to_string(),
                    },
                };
            }
        }
    }
    ContentBlock::Text {
        text: format!("[Image URL: {url}]"),
    }
}

fn mime_to_image_format(mime: &str) -> Option<ImageFormat> {
    let subtype = mime.split('/').nth(1)?;
    match subtype {
        "png" => Some(ImageFormat::Png),
        "jpeg" | "jpg" => Some(ImageFormat::Jpeg),
        "gif" => Some(ImageFormat::Gif),
        "webp" => Some(ImageFormat::Webp),
        _ => None,
    }
}

fn value_to_stop_sequences(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        _ => None,
    }
}

fn thinking_fields(req: &ChatCompletionRequest) -> Option<Value> {
    if req.reasoning_effort.is_none() && req.thinking.is_none() {
        return None;
    }
    let budget = req
        .thinking
        .as_ref()
        .and_then(|t| t.budget_tokens)
        .unwrap_or(DEFAULT_THINKING_BUDGET_TOKENS);
    Some(serde_json::json!({
        "thinking": { "type": "enabled", "budget_tokens": budget }
    }))
}

/// Does this canonical message list contain any `toolUse`/`toolResult`
/// block? Converse requires a `toolConfig` whenever it does (§4.5).
fn history_references_tools(messages: &[Message]) -> bool {
    messages.iter().any(|m| {
        m.content.iter().any(|b| {
            matches!(b, ContentBlock::ToolUse { .. } | ContentBlock::ToolResult { .. })
        })
    })
}

fn distinct_tool_use_names(messages: &[Message]) -> BTreeSet<String> {
    messages
        .iter()
        .flat_map(|m| m.content.iter())
        .filter_map(|b| match b {
            ContentBlock::ToolUse { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

fn build_tool_config(req: &ChatCompletionRequest, messages: &[Message], enable_cache: bool) -> Option<ToolConfig> {
    if let Some(tools) = &req.tools {
        if !tools.is_empty() {
            let mut entries: Vec<ToolListEntry> = tools
                .iter()
                .map(|t| ToolListEntry::Tool {
                    tool_spec: ToolSpec {
                        name: t.function.name.clone(),
                        description: t.function.description.clone(),
                        input_schema: ToolInputSchema {
                            json: t
                                .function
                                .parameters
                                .clone()
                                .unwrap_or_else(|| serde_json::json!({"type": "object"})),
                        },
                    },
                })
                .collect();
            if enable_cache {
                entries.push(ToolListEntry::CachePoint {
                    cache_point: CachePointMarker {
                        cache_type: "default".to_string(),
                    },
                });
            }
            return Some(ToolConfig {
                tools: entries,
                tool_choice: None,
            });
        }
    }

    if !history_references_tools(messages) {
        return None;
    }

    // Synthesize a minimal toolConfig so Converse accepts a history that
    // already carries tool calls/results but no `tools` declaration.
    let names = distinct_tool_use_names(messages);
    let entries: Vec<ToolListEntry> = names
        .into_iter()
        .map(|name| ToolListEntry::Tool {
            tool_spec: ToolSpec {
                name,
                description: Some("Tool from conversation history".to_string()),
                input_schema: ToolInputSchema {
                    json: serde_json::json!({"type": "object"}),
                },
            },
        })
        .collect();
    if entries.is_empty() {
        return None;
    }
    Some(ToolConfig {
        tools: entries,
        tool_choice: None,
    })
}
