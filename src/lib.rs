//! # groq-agent - conversational home-automation agent
//!
//! Takes a user's utterance, optionally attaches an image (a URL, a local
//! file, or a snapshot from a named camera), grounds the model in live
//! device state, sends one request to an OpenAI-compatible chat API (Groq by
//! default), and either speaks the reply or executes the device command
//! embedded in it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use groq_agent::agents::{AgentHandler, Utterance};
//! use groq_agent::agents::image::ImageResolver;
//! use groq_agent::agents::llm::create_provider;
//! use groq_agent::config::Settings;
//! use groq_agent::devices::create_registry;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::new()?;
//!     let registry = create_registry(&settings.registry).await?;
//!     let provider = create_provider(&settings.llm)?;
//!     let images = ImageResolver::new(&settings.llm)?;
//!     let agent = AgentHandler::new(settings.agent, provider, registry, images);
//!
//!     let reply = agent.process(Utterance::new("Bật đèn phòng khách", "vi")).await;
//!     println!("{}", reply.speech_text);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Agents**: the conversation pipeline and its domain types
//! - **Devices**: the device registry port and its adapters
//! - **Adapters**: HTTP handlers
//! - **Config**: configuration loading and validation

pub mod adapters;
pub mod agents;
pub mod cli;
pub mod config;
pub mod devices;

use crate::adapters::conversation_handler::{self, ConversationState};
use crate::adapters::health_handler::HealthHandler;
use crate::agents::AgentHandler;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Creates the Axum application router with all endpoints configured.
///
/// # Arguments
///
/// * `agent` - Conversation facade shared by all requests
/// * `health_handler` - Health check handler
///
/// # Returns
///
/// Configured Axum Router
pub fn create_app(agent: Arc<AgentHandler>, health_handler: Arc<HealthHandler>) -> Router {
    let health_router = Router::new()
        .route("/health", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.health().await }
            }
        }))
        .route("/health/ready", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.ready().await }
            }
        }))
        .route("/health/live", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.live().await }
            }
        }));

    let api_router = Router::new()
        .route("/conversation", post(conversation_handler::converse))
        .route("/models", get(conversation_handler::list_models))
        .route(
            "/config/agent",
            get(conversation_handler::get_agent_config)
                .put(conversation_handler::update_agent_config),
        )
        .with_state(ConversationState { agent });

    let router = health_router.nest("/api", api_router);

    router.layer(
        tower_http::cors::CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    )
}
