use std::collections::HashSet;
use thiserror::Error;

use crate::agents::config::AgentConfig;
use crate::config::{RegistryBackend, RegistrySettings, ServerSettings, Settings};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_server(&settings.server) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_agent(&settings.agent) {
            errors.extend(e);
        }

        if settings.llm.base_url.trim().is_empty() {
            errors.push(ValidationError::MissingField("llm.base_url".to_string()));
        }

        if let Err(e) = Self::validate_registry(&settings.registry) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_server(server: &ServerSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if server.host.is_empty() {
            errors.push(ValidationError::MissingField("server.host".to_string()));
        }

        if server.port == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate the agent section on its own, e.g. before a live update
    pub fn validate_agent(agent: &AgentConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if agent.api_key.trim().is_empty() {
            errors.push(ValidationError::MissingField("agent.api_key".to_string()));
        }

        if agent.model.trim().is_empty() {
            errors.push(ValidationError::MissingField("agent.model".to_string()));
        }

        if agent.max_tokens == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "agent.max_tokens".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&agent.temperature) {
            errors.push(ValidationError::InvalidValue {
                field: "agent.temperature".to_string(),
                reason: format!("{} is outside 0.0..=2.0", agent.temperature),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_registry(registry: &RegistrySettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if registry.backend == RegistryBackend::HomeAssistant
            && registry
                .base_url
                .as_deref()
                .map_or(true, |u| u.trim().is_empty())
        {
            errors.push(ValidationError::MissingField("registry.base_url".to_string()));
        }

        let mut seen = HashSet::new();
        for (idx, seed) in registry.entities.iter().enumerate() {
            if !seed.entity_id.contains('.') {
                errors.push(ValidationError::InvalidValue {
                    field: format!("registry.entities[{}].entity_id", idx),
                    reason: format!("'{}' is not of the form domain.object_id", seed.entity_id),
                });
            }
            if !seen.insert(seed.entity_id.as_str()) {
                errors.push(ValidationError::Duplicate(format!(
                    "Entity '{}' appears more than once",
                    seed.entity_id
                )));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
