//! Model alias resolution.
//!
//! The router never requires callers to know a backend's canonical model
//! id. A small default table maps friendly names to canonical ids; an
//! operator-supplied `MODEL_ALIAS_MAP` JSON object replaces that table
//! wholesale rather than merging into it, so a narrow override drops every
//! default alias it doesn't re-list.

use std::collections::BTreeMap;

use serde_json::Value;

/// Built-in alias → canonical id table. Anthropic-family entries resolve to
/// an inference-profile id (`us.anthropic....`), matching the prefix the
/// dispatcher checks to pick the Converse backend; every other entry routes
/// through the OpenAI-HTTP backend untouched.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("claude-opus", "us.anthropic.claude-opus-4-6-v1"),
    ("claude-sonnet", "us.anthropic.claude-sonnet-4-5-v1"),
    ("claude-haiku", "us.anthropic.claude-haiku-4-5-v1"),
    ("deepseek-v3", "deepseek.v3.2"),
    ("llama-3.3-70b", "meta.llama3-3-70b-instruct-v1"),
];

/// Prefixes that mark a canonical model id as belonging to the native
/// Converse backend rather than the OpenAI-HTTP pass-through.
const ANTHROPIC_PREFIXES: &[&str] = &["anthropic.", "us.anthropic."];

#[derive(Clone, Debug)]
pub struct AliasMap {
    table: BTreeMap<String, String>,
}

impl AliasMap {
    /// Build the table from an optional `MODEL_ALIAS_MAP` override object,
    /// or the built-in defaults if none was supplied. A present override
    /// replaces the whole table rather than merging into it.
    #[must_use]
    pub fn with_overrides(overrides: Option<&Value>) -> Self {
        let table = match overrides {
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(alias, canonical)| {
                    canonical.as_str().map(|canonical| (alias.clone(), canonical.to_string()))
                })
                .collect(),
            _ => DEFAULT_ALIASES.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect(),
        };
        Self { table }
    }

    #[must_use]
    pub fn defaults() -> Self {
        Self::with_overrides(None)
    }

    /// Resolve a requested model name to its canonical id, or return it
    /// unchanged if it names no alias (it may already be a canonical id).
    #[must_use]
    pub fn resolve(&self, requested: &str) -> String {
        self.table
            .get(requested)
            .cloned()
            .unwrap_or_else(|| requested.to_string())
    }

    /// Every `(alias, canonical)` pair, for `/v1/models`.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.table.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// `true` if a canonical model id names an Anthropic-family model, and so
/// should be routed to the native Converse backend.
#[must_use]
pub fn is_anthropic_family(canonical_model_id: &str) -> bool {
    ANTHROPIC_PREFIXES
        .iter()
        .any(|prefix| canonical_model_id.starts_with(prefix))
}
