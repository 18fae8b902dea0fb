use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat-completion collaborator used for both planning and plain chat.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn chat(&self, messages: &[Message]) -> Result<String>;
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Clone)]
pub struct OpenAIProvider {
    pub model: String,
    pub api_key: String,
    pub api_base: String,
    pub temperature: f32,
    pub retries: u32,
    pub client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(
        model: String,
        api_key: String,
        api_base: String,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            model,
            api_key,
            api_base,
            temperature: 0.3,
            retries: 0,
            client,
        })
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let mut provider = Self::new(
            config.model.clone(),
            config.api_key()?,
            config.api_base.clone(),
            config.model_timeout_secs,
        )?;
        provider.temperature = config.temperature;
        provider.retries = config.model_retries;
        Ok(provider)
    }

    async fn chat_once(&self, messages: &[Message]) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        });

        let res = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(AgentError::ModelApi { status, body });
        }

        let json: serde_json::Value = res.json().await?;
        extract_content(&json)
    }
}

#[async_trait]
impl ModelProvider for OpenAIProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.chat_once(messages).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable() && attempt < self.retries => {
                    attempt += 1;
                    log::warn!(
                        "Model call failed ({err}); retry {attempt}/{}",
                        self.retries
                    );
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(500 * u64::from(attempt))
}

fn extract_content(json: &serde_json::Value) -> Result<String> {
    if let Some(error) = json.get("error") {
        return Err(AgentError::ModelResponse(format!("API returned error: {error}")));
    }
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AgentError::ModelResponse("missing content in choices".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn content_is_read_from_first_choice() {
        let json = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "hello"}}]
        });
        assert_eq!(extract_content(&json).unwrap(), "hello");
    }

    #[test]
    fn error_payload_and_missing_content_are_errors() {
        let err = serde_json::json!({"error": {"message": "bad key"}});
        assert!(matches!(
            extract_content(&err),
            Err(AgentError::ModelResponse(_))
        ));
        let empty = serde_json::json!({"choices": []});
        assert!(extract_content(&empty).is_err());
    }

    #[test]
    fn only_transport_and_server_errors_retry() {
        assert!(AgentError::ModelApi {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!AgentError::ModelApi {
            status: 401,
            body: String::new()
        }
        .is_retryable());
        assert!(!AgentError::ModelResponse("x".into()).is_retryable());
    }
}
