//! Conversation agent
//!
//! One utterance flows through four stages:
//!
//! - `image` - picks at most one image (URL, local file, or named camera)
//! - `context` - builds the system prompt from live device state
//! - `llm` - sends a single chat-completion request
//! - `interpreter` - speaks the reply or dispatches the JSON command in it
//!
//! [`AgentHandler`] ties them together and turns every failure into speech.

pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod handler;
pub mod image;
pub mod interpreter;
pub mod llm;

// Re-export commonly used types
pub use config::*;
pub use domain::*;
pub use error::*;
pub use handler::AgentHandler;
