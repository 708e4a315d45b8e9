pub mod conversation_handler;
pub mod health_handler;
