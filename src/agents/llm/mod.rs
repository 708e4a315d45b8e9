//! Chat-completion client
//!
//! One provider ships today: any OpenAI-compatible endpoint (Groq by
//! default). The agent talks to it through [`LlmProvider`] so tests can
//! swap in a scripted model.

mod openai;

pub use openai::OpenAiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::agents::config::{AgentConfig, LlmProviderConfig};
use crate::agents::domain::Message;
use crate::agents::error::LlmResult;

/// Trait for chat-completion providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Send one non-streaming completion request and return the reply text
    async fn complete(&self, api_key: &str, request: CompletionRequest) -> LlmResult<String>;

    /// List model ids available to `api_key`
    async fn list_models(&self, api_key: &str) -> LlmResult<Vec<String>>;
}

/// Request body for a chat completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    /// Build the two-message request for one turn: the system prompt, then
    /// the user's text with the image attached when there is one.
    pub fn for_turn(
        config: &AgentConfig,
        system_prompt: &str,
        user_text: &str,
        image: Option<&[u8]>,
    ) -> Self {
        let user = match image {
            Some(bytes) => Message::user_with_image(user_text, bytes),
            None => Message::user(user_text),
        };

        Self {
            model: config.model.clone(),
            messages: vec![Message::system(system_prompt), user],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Whether the user message carries an image
    pub fn has_image(&self) -> bool {
        self.messages.iter().any(|m| m.content.has_image())
    }
}

/// Create the provider described by `config`
pub fn create_provider(config: &LlmProviderConfig) -> LlmResult<Arc<dyn LlmProvider>> {
    let provider = OpenAiProvider::new(config)?;
    Ok(Arc::new(provider))
}
