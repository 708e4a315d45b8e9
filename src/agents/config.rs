//! Configuration types for the conversation agent

use serde::{Deserialize, Serialize};

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
/// Completion length used when none is configured
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
/// Sampling temperature used when none is configured
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Groq's OpenAI-compatible API root
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Instruction used when the system prompt is left empty
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "Bạn là trợ lý nhà thông minh. Hãy trả lời ngắn gọn, thân thiện bằng ngôn ngữ của người dùng.";

/// Per-turn agent settings.
///
/// A snapshot of this struct is taken at the start of every turn and stays
/// immutable until the turn ends, so edits only affect later turns.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    /// Bearer token for the chat-completion API
    #[serde(default)]
    pub api_key: String,
    /// Model name/identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Instruction text placed at the top of the system prompt
    #[serde(default)]
    pub system_prompt: String,
    /// Entities exposed to the model; empty means "default domains"
    #[serde(default)]
    pub selected_entities: Vec<String>,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl AgentConfig {
    /// The configured instruction, or the built-in one when blank
    pub fn instruction(&self) -> &str {
        if self.system_prompt.trim().is_empty() {
            DEFAULT_SYSTEM_PROMPT
        } else {
            &self.system_prompt
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            system_prompt: String::new(),
            selected_entities: Vec::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

/// Transport settings for the chat-completion API and image fetches
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmProviderConfig {
    /// API root, without the trailing `/chat/completions`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for a chat completion, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Timeout for fetching an image URL, in seconds
    #[serde(default = "default_image_timeout")]
    pub image_timeout_secs: u64,
    /// Largest image body accepted from a URL, in bytes
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            image_timeout_secs: default_image_timeout(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_image_timeout() -> u64 {
    10
}

fn default_max_image_bytes() -> u64 {
    10 * 1024 * 1024
}
