//! Bidirectional translation between the OpenAI chat-completions wire
//! format and the Converse-style canonical invocation shape.

pub mod converse_types;
pub mod openai_types;
pub mod request_translator;
pub mod response_translator;
pub mod stream_translator;

pub use converse_types::{ConverseRequest, ConverseResponse, ConverseStreamEvent, map_stop_reason};
pub use openai_types::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse};
pub use request_translator::translate_request;
pub use response_translator::translate_response;
pub use stream_translator::StreamTranslator;
