// src/generator/http.rs — HTTP generation backend
//
// Speaks a plain JSON contract: POST {base_url}/v1/drafts with the prompt
// and extracted hints, expect a ProviderDraft back. Status mapping follows
// the usual split: 429/5xx retriable, other 4xx terminal.

use async_trait::async_trait;
use serde_json::json;

use super::{ProviderDraft, SpecProvider};
use crate::infra::config::ProviderEndpoint;
use crate::infra::errors::AtelierError;
use crate::prompt::PromptHints;

pub struct HttpSpecProvider {
    name: String,
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpSpecProvider {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Build from a config endpoint, resolving the API key env var if set.
    pub fn from_endpoint(endpoint: &ProviderEndpoint) -> Self {
        let mut provider = Self::new(&endpoint.name, &endpoint.base_url);
        if let Some(ref env_name) = endpoint.api_key_env {
            if let Ok(key) = std::env::var(env_name) {
                provider.api_key = Some(key);
            }
        }
        provider
    }

    fn provider_error(&self, message: String, retriable: bool) -> AtelierError {
        AtelierError::Provider {
            provider: self.name.clone(),
            message,
            retriable,
        }
    }
}

#[async_trait]
impl SpecProvider for HttpSpecProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn try_generate(
        &self,
        prompt: &str,
        hints: &PromptHints,
    ) -> Result<ProviderDraft, AtelierError> {
        let url = format!("{}/v1/drafts", self.base_url.trim_end_matches('/'));

        let mut request = self.client.post(&url).json(&json!({
            "prompt": prompt,
            "hints": hints,
        }));
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            self.provider_error(e.to_string(), e.is_timeout() || e.is_connect())
        })?;

        let status = response.status();
        if !status.is_success() {
            let retriable = status.as_u16() == 429 || status.is_server_error();
            let body = response.text().await.unwrap_or_default();
            return Err(self.provider_error(
                format!("HTTP {}: {}", status.as_u16(), body.chars().take(200).collect::<String>()),
                retriable,
            ));
        }

        response
            .json::<ProviderDraft>()
            .await
            .map_err(|e| self.provider_error(format!("Malformed draft: {e}"), false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_endpoint_without_key() {
        let provider = HttpSpecProvider::from_endpoint(&ProviderEndpoint {
            name: "studio".into(),
            base_url: "https://studio.example.com/".into(),
            api_key_env: None,
        });
        assert_eq!(provider.name(), "studio");
        assert!(provider.api_key.is_none());
    }

    #[test]
    fn test_from_endpoint_missing_env_is_none() {
        let provider = HttpSpecProvider::from_endpoint(&ProviderEndpoint {
            name: "studio".into(),
            base_url: "https://studio.example.com".into(),
            api_key_env: Some("ATELIER_TEST_KEY_THAT_DOES_NOT_EXIST".into()),
        });
        assert!(provider.api_key.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_retriable() {
        let provider = HttpSpecProvider::new("dead", "http://127.0.0.1:1");
        let err = provider
            .try_generate("a bedroom", &PromptHints::default())
            .await
            .unwrap_err();
        assert!(err.is_retriable());
    }
}
