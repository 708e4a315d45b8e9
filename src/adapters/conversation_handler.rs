use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::agents::config::AgentConfig;
use crate::agents::domain::Utterance;
use crate::agents::error::{AgentError, LlmError};
use crate::agents::AgentHandler;
use crate::config::validator::ConfigValidator;

#[derive(Clone)]
pub struct ConversationState {
    pub agent: Arc<AgentHandler>,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Agent settings as exposed over HTTP; the API key is never echoed back
#[derive(Debug, Serialize, Deserialize)]
pub struct AgentConfigDto {
    /// Omitted or empty keeps the current key
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    pub api_key_set: Option<bool>,
    pub model: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub selected_entities: Vec<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl From<&AgentConfig> for AgentConfigDto {
    fn from(config: &AgentConfig) -> Self {
        Self {
            api_key: None,
            api_key_set: Some(!config.api_key.trim().is_empty()),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            selected_entities: config.selected_entities.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

// ============================================================================
// Conversation Endpoints
// ============================================================================

/// POST /api/conversation - Process one utterance
pub async fn converse(
    State(state): State<ConversationState>,
    Json(utterance): Json<Utterance>,
) -> impl IntoResponse {
    let result = state.agent.process(utterance).await;
    (StatusCode::OK, Json(result))
}

/// GET /api/models - List models available to the configured API key
pub async fn list_models(State(state): State<ConversationState>) -> impl IntoResponse {
    match state.agent.list_models(None).await {
        Ok(models) => (StatusCode::OK, Json(ApiResponse::success(models))),
        Err(e) => {
            tracing::warn!("Model listing failed: {}", e);
            let status = match &e {
                AgentError::Llm(LlmError::Api { status: 401, .. })
                | AgentError::Llm(LlmError::Authentication(_)) => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_GATEWAY,
            };
            (status, Json(ApiResponse::<Vec<String>>::error(e.to_string())))
        }
    }
}

/// GET /api/config/agent - Current agent settings
pub async fn get_agent_config(State(state): State<ConversationState>) -> impl IntoResponse {
    let config = state.agent.config_snapshot().await;
    (
        StatusCode::OK,
        Json(ApiResponse::success(AgentConfigDto::from(&config))),
    )
}

/// PUT /api/config/agent - Replace agent settings for subsequent turns
pub async fn update_agent_config(
    State(state): State<ConversationState>,
    Json(dto): Json<AgentConfigDto>,
) -> impl IntoResponse {
    let current = state.agent.config_snapshot().await;
    let config = AgentConfig {
        api_key: dto
            .api_key
            .filter(|k| !k.trim().is_empty())
            .unwrap_or(current.api_key),
        model: dto.model,
        system_prompt: dto.system_prompt,
        selected_entities: dto.selected_entities,
        max_tokens: dto.max_tokens,
        temperature: dto.temperature,
    };

    if let Err(errors) = ConfigValidator::validate_agent(&config) {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<AgentConfigDto>::error(messages.join("; "))),
        );
    }

    let response = AgentConfigDto::from(&config);
    state.agent.update_config(config).await;
    (StatusCode::OK, Json(ApiResponse::success(response)))
}
