//! The canonical message model.
//!
//! This is the Converse-shaped representation the translator produces from an
//! incoming OpenAI chat-completions request and consumes when building an
//! OpenAI-shaped response. It is intentionally closer to the Converse wire
//! format than to OpenAI's, since the native backend is the one with
//! structural richness (cache points, tool results carrying status, inline
//! thinking blocks) that the OpenAI shape has to be mapped onto, not the
//! other way around.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Conversation role. Converse (and this model) only ever alternates between
/// the two — system content travels out-of-band in a dedicated field, never
/// as a message in the list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Image media types accepted on an image content block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

/// Inline base64 image payload, Converse's `image.source.bytes` shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    pub format: ImageFormat,
    /// Raw base64, already stripped of any `data:...;base64,` prefix.
    pub bytes: String,
}

/// The result of a single tool invocation, reported back to the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolResultStatus {
    Success,
    Error,
}

/// One block of message content. Tagged on `type`, matching Converse's own
/// content block discrimination so the translator can pass blocks through
/// with minimal reshaping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        source: ImageSource,
    },
    /// A model-issued tool call.
    ToolUse {
        tool_use_id: String,
        name: String,
        input: Value,
    },
    /// The caller's answer to a prior `ToolUse` block.
    ToolResult {
        tool_use_id: String,
        content: Vec<ToolResultContent>,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<ToolResultStatus>,
    },
    /// Extended-thinking output. Carries a provider signature so a
    /// multi-turn conversation can replay it verbatim on the next request.
    ReasoningContent {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    /// A prompt-cache breakpoint. Carries no data of its own; its presence
    /// in a content list is the signal.
    CachePoint {
        #[serde(rename = "type", default = "default_cache_point_type")]
        cache_type: String,
    },
}

fn default_cache_point_type() -> String {
    "default".to_string()
}

/// Content nested inside a `ToolResult` block. Narrower than the top-level
/// union: a tool can only answer with text or an image, never another tool
/// call or cache point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ToolResultContent {
    Text { text: String },
    Image { source: ImageSource },
}

/// One turn of the conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    #[must_use]
    pub fn user(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content,
        }
    }

    #[must_use]
    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    #[must_use]
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// `true` if every block in this message is a `ToolResult` — the shape an
    /// OpenAI `tool` role message collapses into once translated.
    #[must_use]
    pub fn is_pure_tool_result(&self) -> bool {
        !self.content.is_empty()
            && self
                .content
                .iter()
                .all(|b| matches!(b, ContentBlock::ToolResult { .. }))
    }
}

/// A single piece of system content: either instruction text or a cache
/// breakpoint, mirroring Converse's `system` list shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SystemBlock {
    Text { text: String },
    CachePoint {
        #[serde(rename = "type", default = "default_cache_point_type")]
        cache_type: String,
    },
}

/// A tool definition offered to the model, Converse's `toolSpec` shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: ToolInputSchema,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolInputSchema {
    pub json: Value,
}

/// One entry of the `tools` list, each wrapping a single `ToolSpec` — or a
/// bare cache point, same as the system block list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged, rename_all = "camelCase")]
pub enum ToolListEntry {
    Tool { tool_spec: ToolSpec },
    CachePoint { cache_point: CachePointMarker },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachePointMarker {
    #[serde(rename = "type", default = "default_cache_point_type")]
    pub cache_type: String,
}

/// Controls which tools, if any, the model is allowed to call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ToolChoice {
    Auto,
    Any,
    Tool { name: String },
}
