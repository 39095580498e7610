//! Environment-driven process configuration.
//!
//! Built once at startup into an immutable [`AppConfig`]. Typed-field parse
//! failures (a non-numeric `PORT`, say) are returned here rather than
//! discovered mid-request, so the process fails fast instead of serving with
//! a broken config.

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {name} is not valid: {message}")]
    InvalidValue { name: &'static str, message: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub log_level: String,
    pub upstream_url: String,
    pub service_version: String,
    pub model_alias_map: Option<Value>,
    pub api_keys_table_name: Option<String>,
    pub distribution_bucket: Option<String>,
    pub distribution_domain: Option<String>,
    pub region: String,
    pub min_client_version: Option<String>,
    pub version_manifest_url: Option<String>,
    /// Published client config patch served by `GET /v1/update/config`, if
    /// an operator has published one. Not part of the spec's external
    /// environment table; kept as an additional env-driven field since the
    /// endpoint needs some source of truth and a static published document
    /// matches its "thin collaborator" framing.
    pub published_client_config: Option<Value>,
}

impl AppConfig {
    /// Read every recognized variable from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|name| std::env::var(name).ok())
    }

    /// Testable variant: `reader` stands in for `std::env::var` so tests can
    /// supply a fixed map instead of mutating the real environment.
    pub fn from_reader(reader: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match reader("PORT") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
                name: "PORT",
                message: format!("{e}"),
            })?,
            None => 8080,
        };

        let model_alias_map = match reader("MODEL_ALIAS_MAP") {
            Some(raw) if !raw.trim().is_empty() => {
                Some(serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidValue {
                    name: "MODEL_ALIAS_MAP",
                    message: format!("{e}"),
                })?)
            }
            _ => None,
        };

        Ok(Self {
            port,
            log_level: reader("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            upstream_url: reader("UPSTREAM_URL").unwrap_or_default(),
            service_version: reader("SERVICE_VERSION").unwrap_or_else(|| "1.0.0".to_string()),
            model_alias_map,
            api_keys_table_name: reader("API_KEYS_TABLE_NAME"),
            distribution_bucket: reader("DISTRIBUTION_BUCKET"),
            distribution_domain: reader("DISTRIBUTION_DOMAIN"),
            region: reader("REGION").unwrap_or_else(|| "us-east-1".to_string()),
            min_client_version: reader("MIN_CLIENT_VERSION"),
            version_manifest_url: reader("VERSION_MANIFEST_URL"),
            published_client_config: match reader("CLIENT_CONFIG_PATCH") {
                Some(raw) if !raw.trim().is_empty() => {
                    Some(serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidValue {
                        name: "CLIENT_CONFIG_PATCH",
                        message: format!("{e}"),
                    })?)
                }
                _ => None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn reader(values: HashMap<&'static str, &'static str>) -> impl Fn(&str) -> Option<String> {
        move |name| values.get(name).map(|v| v.to_string())
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let config = AppConfig::from_reader(reader(HashMap::new())).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.service_version, "1.0.0");
        assert_eq!(config.region, "us-east-1");
        assert!(config.model_alias_map.is_none());
    }

    #[test]
    fn invalid_port_is_a_startup_error() {
        let mut values = HashMap::new();
        values.insert("PORT", "not-a-number");
        let err = AppConfig::from_reader(reader(values)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "PORT", .. }));
    }

    #[test]
    fn model_alias_map_parses_json_override() {
        let mut values = HashMap::new();
        values.insert("MODEL_ALIAS_MAP", r#"{"claude-opus":"us.anthropic.claude-opus-4-7-v1"}"#);
        let config = AppConfig::from_reader(reader(values)).unwrap();
        assert_eq!(
            config.model_alias_map.unwrap()["claude-opus"],
            "us.anthropic.claude-opus-4-7-v1"
        );
    }

    #[test]
    fn malformed_model_alias_map_is_a_startup_error() {
        let mut values = HashMap::new();
        values.insert("MODEL_ALIAS_MAP", "not json");
        let err = AppConfig::from_reader(reader(values)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "MODEL_ALIAS_MAP", .. }));
    }
}
