//! Resolves a requested model to a backend and dispatches the call: the
//! native Converse backend for Anthropic-family models (translated through
//! `oc-translate`), or a byte-preserving pass-through to the upstream
//! `OpenAI`-compatible endpoint for everything else.

pub mod alias;
pub mod converse_client;
pub mod dispatcher;
pub mod error;
pub mod openai_client;
pub mod sse;

pub use alias::{is_anthropic_family, AliasMap};
pub use converse_client::{BearerSource, ConverseClient, HttpConverseClient};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::DispatchError;
pub use openai_client::{OpenAiHttpClient, PassthroughResponse};
