//! Inference boundary
//!
//! The orchestrator consumes language-model inference behind a trait:
//! request in, text plus token usage out, or failure. `HttpInferenceClient`
//! is the production implementation for OpenAI-compatible endpoints.

use crate::config::InferenceConfig;
use crate::error::CouncilError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Output of one inference call
#[derive(Debug, Clone)]
pub struct InferenceOutput {
    pub text: String,
    /// Total tokens consumed (prompt + completion), as metered by the provider
    pub total_tokens: u64,
}

/// External model-inference contract
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    async fn infer(
        &self,
        system_prompt: &str,
        user_message: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<InferenceOutput, CouncilError>;
}

/// HTTP client for OpenAI-compatible chat-completions endpoints
#[derive(Clone)]
pub struct HttpInferenceClient {
    client: Arc<reqwest::Client>,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

impl HttpInferenceClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, CouncilError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| CouncilError::Configuration("inference API key not set".to_string()))?;

        Ok(Self {
            client: Arc::new(reqwest::Client::new()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }

    /// Rough token estimate for locally-built prompts (approximately 4
    /// chars per token), used only when the provider omits usage data.
    fn estimate_tokens(text: &str) -> u64 {
        (text.len() / 4) as u64
    }
}

#[async_trait]
impl InferenceProvider for HttpInferenceClient {
    async fn infer(
        &self,
        system_prompt: &str,
        user_message: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<InferenceOutput, CouncilError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_message.to_string(),
                },
            ],
            max_tokens,
            temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CouncilError::Inference(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CouncilError::Inference(format!(
                "API returned {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CouncilError::Inference(format!("invalid response body: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CouncilError::Inference("response contained no choices".to_string()))?;

        let text = choice.message.content;
        let total_tokens = parsed
            .usage
            .map(|u| u.total_tokens)
            .filter(|&t| t > 0)
            .unwrap_or_else(|| {
                Self::estimate_tokens(system_prompt)
                    + Self::estimate_tokens(user_message)
                    + Self::estimate_tokens(&text)
            });

        Ok(InferenceOutput { text, total_tokens })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InferenceConfig;

    #[test]
    fn test_client_requires_api_key() {
        let config = InferenceConfig::default();
        assert!(matches!(
            HttpInferenceClient::new(&config),
            Err(CouncilError::Configuration(_))
        ));
    }

    #[test]
    fn test_token_estimate() {
        assert_eq!(HttpInferenceClient::estimate_tokens(""), 0);
        assert_eq!(HttpInferenceClient::estimate_tokens("abcdefgh"), 2);
    }

    #[test]
    fn test_usage_parsing() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "hello"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.usage.unwrap().total_tokens, 15);
        assert_eq!(parsed.choices[0].message.content, "hello");
    }
}
