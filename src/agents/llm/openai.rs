//! OpenAI-compatible chat-completion provider (Groq, OpenAI, local proxies)

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{CompletionRequest, LlmProvider};
use crate::agents::config::LlmProviderConfig;
use crate::agents::error::{LlmError, LlmResult};

/// OpenAI-compatible LLM provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiProvider {
    /// Create a new provider from configuration
    pub fn new(config: &LlmProviderConfig) -> LlmResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LlmError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Pull the reply text out of a decoded response
    fn parse_response(response: OpenAiResponse) -> LlmResult<String> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Parse("No choices in response".to_string()))?;

        choice
            .message
            .content
            .ok_or_else(|| LlmError::Parse("Response message has no content".to_string()))
    }

    async fn check(response: reqwest::Response) -> LlmResult<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, api_key: &str, request: CompletionRequest) -> LlmResult<String> {
        if api_key.is_empty() {
            return Err(LlmError::Authentication("API key is empty".to_string()));
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let openai_response: OpenAiResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("Failed to parse response: {}", e)))?;

        Self::parse_response(openai_response)
    }

    async fn list_models(&self, api_key: &str) -> LlmResult<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(api_key)
            .send()
            .await?;

        let models: OpenAiModelList = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("Failed to parse model list: {}", e)))?;

        Ok(models.data.into_iter().map(|m| m.id).collect())
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiModelList {
    #[serde(default)]
    data: Vec<OpenAiModel>,
}

#[derive(Debug, Deserialize)]
struct OpenAiModel {
    id: String,
}
