//! Converse stream events → OpenAI chat-completion streaming chunks.
//!
//! Mirrors the shape of a stateful SSE stream handler (accumulate across
//! events, emit zero-or-more chunks per event) without needing to
//! accumulate any content itself — unlike the unary path, each OpenAI
//! delta chunk only ever needs the single event that produced it, plus a
//! running tool-call index.

use crate::converse_types::{ContentBlockDelta, ContentBlockStart, ConverseStreamEvent, map_stop_reason};
use crate::openai_types::{ChatCompletionChunk, ChunkChoice, Delta, ToolCallDelta, ToolCallDeltaFunction};
use crate::response_translator::build_usage;

/// Per-stream state: identifiers shared by every chunk, plus the running
/// tool-call index and whether any tool call has been seen (to drive the
/// same `stop` → `tool_calls` upgrade the unary path applies).
pub struct StreamTranslator {
    request_id: String,
    model: String,
    created: i64,
    next_tool_index: u32,
    current_tool_index: Option<u32>,
    saw_tool_call: bool,
}

impl StreamTranslator {
    #[must_use]
    pub fn new(request_id: impl Into<String>, model: impl Into<String>, created: i64) -> Self {
        Self {
            request_id: request_id.into(),
            model: model.into(),
            created,
            next_tool_index: 0,
            current_tool_index: None,
            saw_tool_call: false,
        }
    }

    fn base_chunk(&self) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: self.request_id.clone(),
            object: "chat.completion.chunk",
            created: self.created,
            model: self.model.clone(),
            choices: Vec::new(),
            usage: None,
        }
    }

    fn delta_chunk(&self, delta: Delta, finish_reason: Option<String>) -> ChatCompletionChunk {
        let mut chunk = self.base_chunk();
        chunk.choices.push(ChunkChoice {
            index: 0,
            delta,
            finish_reason,
        });
        chunk
    }

    /// Translate one Converse stream event into zero or more OpenAI chunks.
    pub fn translate_event(&mut self, event: &ConverseStreamEvent) -> Vec<ChatCompletionChunk> {
        match event {
            ConverseStreamEvent::MessageStart { .. } => vec![self.delta_chunk(
                Delta {
                    role: Some("assistant"),
                    content: Some(String::new()),
                    ..Default::default()
                },
                None,
            )],

            ConverseStreamEvent::ContentBlockStart { start, .. } => match start {
                ContentBlockStart::ToolUse { tool_use_id, name } => {
                    let index = self.next_tool_index;
                    self.next_tool_index += 1;
                    self.current_tool_index = Some(index);
                    self.saw_tool_call = true;
                    vec![self.delta_chunk(
                        Delta {
                            tool_calls: Some(vec![ToolCallDelta {
                                index,
                                id: Some(tool_use_id.clone()),
                                call_type: Some("function"),
                                function: ToolCallDeltaFunction {
                                    name: Some(name.clone()),
                                    arguments: Some(String::new()),
                                },
                            }]),
                            ..Default::default()
                        },
                        None,
                    )]
                }
            },

            ConverseStreamEvent::ContentBlockDelta { delta, .. } => match delta {
                ContentBlockDelta::Text { text } => vec![self.delta_chunk(
                    Delta {
                        content: Some(text.clone()),
                        ..Default::default()
                    },
                    None,
                )],
                ContentBlockDelta::ReasoningContent { text } => {
                    if text.is_empty() {
                        vec![]
                    } else {
                        vec![self.delta_chunk(
                            Delta {
                                reasoning_content: Some(text.clone()),
                                ..Default::default()
                            },
                            None,
                        )]
                    }
                }
                ContentBlockDelta::ToolUse { input } => {
                    if input.is_empty() {
                        return vec![];
                    }
                    let Some(index) = self.current_tool_index else {
                        return vec![];
                    };
                    vec![self.delta_chunk(
                        Delta {
                            tool_calls: Some(vec![ToolCallDelta {
                                index,
                                id: None,
                                call_type: None,
                                function: ToolCallDeltaFunction {
                                    name: None,
                                    arguments: Some(input.clone()),
                                },
                            }]),
                            ..Default::default()
                        },
                        None,
                    )]
                }
            },

            ConverseStreamEvent::ContentBlockStop { .. } => vec![],

            ConverseStreamEvent::MessageStop { stop_reason } => {
                let mut reason = map_stop_reason(stop_reason).to_string();
                if self.saw_tool_call && reason == "stop" {
                    reason = "tool_calls".to_string();
                }
                vec![self.delta_chunk(Delta::default(), Some(reason))]
            }

            ConverseStreamEvent::Metadata { usage } => {
                let mut chunk = self.base_chunk();
                chunk.usage = Some(build_usage(usage));
                vec![chunk]
            }
        }
    }
}
