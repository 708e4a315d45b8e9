//! Domain types for the conversation agent
//!
//! Messages sent to the model, commands parsed out of its replies, and the
//! turn-level input/output types.

mod command;
mod message;
mod turn;

pub use command::*;
pub use message::*;
pub use turn::*;
