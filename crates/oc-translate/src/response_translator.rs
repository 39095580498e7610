//! Converse unary response → OpenAI chat-completion response.

use oc_core::message::ContentBlock;

use crate::converse_types::{ConverseResponse, ConverseUsage, map_stop_reason};
use crate::openai_types::{
    ChatCompletionResponse, Choice, PromptTokensDetails, ResponseMessage, ResponseToolCall,
    ResponseToolCallFunction, Usage,
};

/// Build the OpenAI-shaped usage object from a Converse usage block,
/// applying the §4.5 rule that cache fields are entirely omitted when both
/// counters are zero.
#[must_use]
pub fn build_usage(usage: &ConverseUsage) -> Usage {
    let prompt_tokens = usage.input_tokens;
    let completion_tokens = usage.output_tokens;
    let mut out = Usage {
        prompt_tokens,
        completion_tokens,
        total_tokens: prompt_tokens + completion_tokens,
        prompt_tokens_details: None,
        cache_read_input_tokens: None,
        cache_creation_input_tokens: None,
    };
    if usage.cache_read_input_tokens != 0 || usage.cache_write_input_tokens != 0 {
        out.prompt_tokens_details = Some(PromptTokensDetails {
            cached_tokens: usage.cache_read_input_tokens,
        });
        out.cache_read_input_tokens = Some(usage.cache_read_input_tokens);
        out.cache_creation_input_tokens = Some(usage.cache_write_input_tokens);
    }
    out
}

/// Translate a complete Converse response into an OpenAI chat-completion
/// response body.
#[must_use]
pub fn translate_response(
    response: &ConverseResponse,
    request_id: &str,
    model: &str,
    created: i64,
) -> ChatCompletionResponse {
    let mut text_parts = Vec::new();
    let mut reasoning_parts = Vec::new();
    let mut tool_calls = Vec::new();

    for block in &response.output.message.content {
        match block {
            ContentBlock::Text { text } => text_parts.push(text.as_str()),
            ContentBlock::ReasoningContent { text, .. } => reasoning_parts.push(text.as_str()),
            ContentBlock::ToolUse {
                tool_use_id,
                name,
                input,
            } => {
                tool_calls.push(ResponseToolCall {
                    index: u32::try_from(tool_calls.len()).unwrap_or(u32::MAX),
                    id: tool_use_id.clone(),
                    call_type: "function",
                    function: ResponseToolCallFunction {
                        name: name.clone(),
                        arguments: serde_json::to_string(input).unwrap_or_default(),
                    },
                });
            }
            _ => {}
        }
    }

    let mut finish_reason = map_stop_reason(&response.stop_reason).to_string();
    if !tool_calls.is_empty() && finish_reason == "stop" {
        finish_reason = "tool_calls".to_string();
    }

    ChatCompletionResponse {
        id: request_id.to_string(),
        object: "chat.completion",
        created,
        model: model.to_string(),
        choices: vec![Choice {
            index: 0,
            message: ResponseMessage {
                role: "assistant",
                content: if text_parts.is_empty() {
                    None
                } else {
                    Some(text_parts.join("\n"))
                },
                reasoning_content: if reasoning_parts.is_empty() {
                    None
                } else {
                    Some(reasoning_parts.join("\n"))
                },
                tool_calls: if tool_calls.is_empty() {
                    None
                } else {
                    Some(tool_calls)
                },
            },
            finish_reason,
        }],
        usage: build_usage(&response.usage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converse_types::{ConverseMessage, ConverseOutput};
    use serde_json::json;

    fn response(content: Vec<ContentBlock>, stop_reason: &str, usage: ConverseUsage) -> ConverseResponse {
        ConverseResponse {
            output: ConverseOutput {
                message: ConverseMessage { content },
            },
            stop_reason: stop_reason.to_string(),
            usage,
        }
    }

    #[test]
    fn anthropic_unary_scenario_from_spec() {
        let resp = response(
            vec![ContentBlock::Text { text: "hello".to_string() }],
            "end_turn",
            ConverseUsage { input_tokens: 5, output_tokens: 3, ..Default::default() },
        );
        let out = translate_response(&resp, "req-1", "us.anthropic.claude-opus-4-6-v1", 0);
        assert_eq!(out.choices[0].message.content.as_deref(), Some("hello"));
        assert_eq!(out.choices[0].finish_reason, "stop");
        assert_eq!(out.usage.total_tokens, 8);
    }

    #[test]
    fn tool_use_upgrades_stop_finish_reason_to_tool_calls() {
        let resp = response(
            vec![ContentBlock::ToolUse {
                tool_use_id: "t1".to_string(),
                name: "get_weather".to_string(),
                input: json!({"city": "Austin"}),
            }],
            "end_turn",
            ConverseUsage::default(),
        );
        let out = translate_response(&resp, "req-1", "m", 0);
        assert_eq!(out.choices[0].finish_reason, "tool_calls");
        assert_eq!(out.choices[0].message.tool_calls.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn explicit_tool_use_stop_reason_maps_to_tool_calls() {
        let resp = response(vec![], "tool_use", ConverseUsage::default());
        let out = translate_response(&resp, "req-1", "m", 0);
        assert_eq!(out.choices[0].finish_reason, "tool_calls");
    }

    #[test]
    fn zero_cache_tokens_omit_cache_fields() {
        let usage = build_usage(&ConverseUsage { input_tokens: 10, output_tokens: 2, ..Default::default() });
        assert!(usage.prompt_tokens_details.is_none());
        assert!(usage.cache_read_input_tokens.is_none());
        assert!(usage.cache_creation_input_tokens.is_none());
    }

    #[test]
    fn nonzero_cache_tokens_populate_cache_fields() {
        let usage = build_usage(&ConverseUsage {
            input_tokens: 10,
            output_tokens: 2,
            cache_read_input_tokens: 7,
            cache_write_input_tokens: 0,
        });
        assert_eq!(usage.prompt_tokens_details.unwrap().cached_tokens, 7);
        assert_eq!(usage.cache_read_input_tokens, Some(7));
        assert_eq!(usage.cache_creation_input_tokens, Some(0));
    }

    #[test]
    fn reasoning_content_joins_with_newline() {
        let resp = response(
            vec![
                ContentBlock::ReasoningContent { text: "step one".to_string(), signature: None },
                ContentBlock::ReasoningContent { text: "step two".to_string(), signature: None },
            ],
            "end_turn",
            ConverseUsage::default(),
        );
        let out = translate_response(&resp, "req-1", "m", 0);
        assert_eq!(out.choices[0].message.reasoning_content.as_deref(), Some("step one\nstep two"));
    }

    #[test]
    fn max_tokens_maps_to_length() {
        let resp = response(vec![], "max_tokens", ConverseUsage::default());
        let out = translate_response(&resp, "req-1", "m", 0);
        assert_eq!(out.choices[0].finish_reason, "length");
    }
}
