//! Mints the short-lived bearer token the Converse and OpenAI-HTTP backends
//! present to the upstream platform, parameterized by the process's own
//! region identity. Wrapped in an [`oc_tokens::TokenCache`] by the caller so
//! refreshes are lazy and single-flighted.

use async_trait::async_trait;
use oc_tokens::{TokenError, TokenSource};

pub struct UpstreamTokenSource {
    client: reqwest::Client,
    upstream_url: String,
    region: String,
}

impl UpstreamTokenSource {
    #[must_use]
    pub fn new(client: reqwest::Client, upstream_url: String, region: String) -> Self {
        Self {
            client,
            upstream_url,
            region,
        }
    }
}

#[async_trait]
impl TokenSource for UpstreamTokenSource {
    async fn fetch(&self) -> Result<String, TokenError> {
        let url = format!("{}/internal/token", self.upstream_url);
        let resp = self
            .client
            .post(url)
            .json(&serde_json::json!({ "region": self.region }))
            .send()
            .await
            .map_err(|e| TokenError::Source(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(TokenError::Source(format!("token endpoint returned HTTP {status}")));
        }

        let body: serde_json::Value = resp.json().await.map_err(|e| TokenError::Source(e.to_string()))?;
        body.get("token")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| TokenError::Source("token endpoint response missing \"token\"".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_token_from_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/internal/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "abc123" })))
            .mount(&server)
            .await;

        let source = UpstreamTokenSource::new(reqwest::Client::new(), server.uri(), "us-east-1".to_string());
        let token = source.fetch().await.unwrap();
        assert_eq!(token, "abc123");
    }

    #[tokio::test]
    async fn non_success_status_is_a_source_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/internal/token"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let source = UpstreamTokenSource::new(reqwest::Client::new(), server.uri(), "us-east-1".to_string());
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, TokenError::Source(_)));
    }
}
