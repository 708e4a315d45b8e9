//! Reply interpretation: speech or device command
//!
//! The model is asked to answer with a JSON command when the user wants a
//! device changed, but it is free to wrap that JSON in prose. The scan is
//! therefore lenient: everything from the first `{` to the last `}` is
//! tried as a command. Replies holding several JSON-like fragments, or
//! braces in ordinary prose, will not parse and fall back to speech.

use tracing::{debug, info, warn};

use crate::agents::domain::ControlCommand;
use crate::devices::{DeviceRegistry, ServiceCall};

/// Spoken when a command runs and carries no `response` of its own
pub const GENERIC_CONFIRMATION: &str = "Đã thực hiện yêu cầu.";

/// Outcome of interpreting one reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub speech: String,
    pub command_executed: bool,
}

impl Interpretation {
    fn speech(raw: &str) -> Self {
        Self {
            speech: raw.to_string(),
            command_executed: false,
        }
    }
}

/// Parse the command embedded in `raw`, if there is a usable one.
///
/// Returns `None` when there is no `{`...`}` span, when the span is not
/// valid JSON for a command, or when `domain`/`service` are missing.
pub fn extract_command(raw: &str) -> Option<ControlCommand> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }

    let command: ControlCommand = match serde_json::from_str(&raw[start..=end]) {
        Ok(command) => command,
        Err(e) => {
            debug!("Reply has braces but no command JSON: {}", e);
            return None;
        }
    };

    if command.action().is_none() {
        debug!("Reply JSON has no domain/service, treating as speech");
        return None;
    }
    Some(command)
}

/// Turn a raw reply into speech, dispatching any embedded command.
///
/// Dispatch failures never fail the turn: they are logged and the raw
/// reply is spoken instead.
pub async fn interpret(raw: &str, registry: &dyn DeviceRegistry) -> Interpretation {
    let Some(command) = extract_command(raw) else {
        return Interpretation::speech(raw);
    };
    let Some((domain, service)) = command.action() else {
        return Interpretation::speech(raw);
    };

    let call = ServiceCall::new(domain, service, command.service_data());
    match registry.call_service(&call).await {
        Ok(()) => {
            info!(
                "Dispatched {}.{} for {:?}",
                call.domain, call.service, command.target
            );
            Interpretation {
                speech: command
                    .response
                    .clone()
                    .unwrap_or_else(|| GENERIC_CONFIRMATION.to_string()),
                command_executed: true,
            }
        }
        Err(e) => {
            warn!("Failed to dispatch {}.{}: {}", call.domain, call.service, e);
            Interpretation::speech(raw)
        }
    }
}
