//! OpenAI-compatible chat-completions client.

use reqwest::Client;
use serde_json::{json, Value};

use crate::core::config::LlmConfig;
use crate::core::errors::ApiError;

use super::Generator;

#[derive(Clone)]
pub struct RemoteGenerator {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl RemoteGenerator {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Generator for RemoteGenerator {
    fn name(&self) -> &str {
        "remote"
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": temperature,
            "stream": false,
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request
            .send()
            .await
            .map_err(|e| ApiError::Generation(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Generation(format!("{status}: {text}")));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ApiError::Generation(e.to_string()))?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        if content.is_empty() {
            return Err(ApiError::Generation("empty completion".into()));
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn generator_for(server: &MockServer) -> RemoteGenerator {
        RemoteGenerator::new(&LlmConfig {
            base_url: server.base_url(),
            model: "test-model".to_string(),
            api_key: None,
            answer_temperature: 0.42,
            summary_temperature: 0.5,
        })
    }

    #[tokio::test]
    async fn completion_content_is_extracted() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(serde_json::json!({
                    "choices": [{ "message": { "content": "a generated answer" } }]
                }));
            })
            .await;

        let answer = generator_for(&server)
            .complete("a prompt", 0.42)
            .await
            .unwrap();
        assert_eq!(answer, "a generated answer");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upstream_failures_become_generation_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(503).body("overloaded");
            })
            .await;

        let err = generator_for(&server)
            .complete("a prompt", 0.42)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Generation(_)));
    }
}
