//! Conversation facade
//!
//! [`AgentHandler`] runs one turn end to end: image resolution, prompt
//! assembly, one model call, then interpretation of the reply. It never
//! returns an error to the caller. Every failure becomes speech.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::agents::config::AgentConfig;
use crate::agents::context::build_system_prompt;
use crate::agents::domain::{SpeechResult, Utterance};
use crate::agents::error::{AgentError, AgentResult, LlmError};
use crate::agents::image::ImageResolver;
use crate::agents::interpreter::interpret;
use crate::agents::llm::{CompletionRequest, LlmProvider};
use crate::devices::DeviceRegistry;

/// Speech for a failed turn
pub fn error_speech(err: &AgentError) -> String {
    match err {
        AgentError::Llm(LlmError::Api { status, message }) => {
            format!("Lỗi Groq ({}): {}", status, message)
        }
        other => format!("Lỗi hệ thống: {}", other),
    }
}

/// Handler for conversation turns
pub struct AgentHandler {
    config: Arc<RwLock<AgentConfig>>,
    provider: Arc<dyn LlmProvider>,
    registry: Arc<dyn DeviceRegistry>,
    images: ImageResolver,
}

impl AgentHandler {
    pub fn new(
        config: AgentConfig,
        provider: Arc<dyn LlmProvider>,
        registry: Arc<dyn DeviceRegistry>,
        images: ImageResolver,
    ) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            provider,
            registry,
            images,
        }
    }

    /// Replace the configuration used by subsequent turns.
    ///
    /// Turns already in flight keep the snapshot they started with.
    pub async fn update_config(&self, config: AgentConfig) {
        *self.config.write().await = config;
        info!("Agent configuration updated");
    }

    /// Copy of the current configuration
    pub async fn config_snapshot(&self) -> AgentConfig {
        self.config.read().await.clone()
    }

    pub fn registry(&self) -> Arc<dyn DeviceRegistry> {
        self.registry.clone()
    }

    /// List models visible to `api_key`, or to the configured key when none
    /// is given
    pub async fn list_models(&self, api_key: Option<&str>) -> AgentResult<Vec<String>> {
        let key = match api_key {
            Some(key) => key.to_string(),
            None => self.config.read().await.api_key.clone(),
        };
        Ok(self.provider.list_models(&key).await?)
    }

    /// Process one utterance and return what should be spoken
    pub async fn process(&self, utterance: Utterance) -> SpeechResult {
        let config = self.config_snapshot().await;
        let language = utterance.language.clone();

        let turn = AssertUnwindSafe(self.run_turn(&config, &utterance)).catch_unwind();
        match turn.await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                error!("Conversation turn failed: {}", e);
                SpeechResult::speech(error_speech(&e), language)
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("Conversation turn panicked: {}", message);
                SpeechResult::speech(
                    error_speech(&AgentError::Internal(message)),
                    language,
                )
            }
        }
    }

    async fn run_turn(
        &self,
        config: &AgentConfig,
        utterance: &Utterance,
    ) -> AgentResult<SpeechResult> {
        debug!("Processing utterance ({}): {}", utterance.language, utterance.text);

        let image = self
            .images
            .resolve(&utterance.text, self.registry.as_ref(), &config.selected_entities)
            .await;

        let system_prompt = build_system_prompt(config, self.registry.as_ref()).await?;

        let request = CompletionRequest::for_turn(
            config,
            &system_prompt,
            &utterance.text,
            image.as_ref().map(|i| i.bytes.as_slice()),
        );
        let image_attached = request.has_image();

        info!(
            "Calling {} model {} (image: {})",
            self.provider.name(),
            config.model,
            image_attached
        );
        let reply = self.provider.complete(&config.api_key, request).await?;

        let outcome = interpret(&reply, self.registry.as_ref()).await;
        Ok(SpeechResult {
            speech_text: outcome.speech,
            language: utterance.language.clone(),
            command_executed: outcome.command_executed,
            image_attached,
        })
    }
}
