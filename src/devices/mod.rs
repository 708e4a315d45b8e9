//! Device registry port and adapters
//!
//! The agent never owns device state. It reads entity states, captures
//! camera stills and calls services through [`DeviceRegistry`]:
//! - `InMemoryDeviceRegistry` - entities seeded from configuration
//! - `HomeAssistantRegistry` - Home Assistant REST API

mod home_assistant;
mod in_memory;

pub use home_assistant::HomeAssistantRegistry;
pub use in_memory::InMemoryDeviceRegistry;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{RegistryBackend, RegistrySettings};

/// Current state of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    /// Display name
    pub name: String,
    pub state: String,
}

impl EntityState {
    pub fn new(
        entity_id: impl Into<String>,
        name: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            name: name.into(),
            state: state.into(),
        }
    }

    /// The part of the entity id before the first `.`
    pub fn domain(&self) -> &str {
        entity_domain(&self.entity_id)
    }
}

static SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9_]+$").expect("slug pattern"));

static ENTITY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_]+\.[a-z0-9_]+$").expect("entity id pattern"));

/// Whether `value` is a lowercase Home Assistant slug such as `turn_on`
pub fn is_slug(value: &str) -> bool {
    SLUG.is_match(value)
}

/// Whether `entity_id` has the `domain.object_id` slug form
pub fn is_entity_id(entity_id: &str) -> bool {
    ENTITY_ID.is_match(entity_id)
}

/// The part of an entity id before the first `.`
pub fn entity_domain(entity_id: &str) -> &str {
    entity_id.split_once('.').map(|(d, _)| d).unwrap_or(entity_id)
}

/// A service invocation such as `light.turn_on`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    /// Service data, normally `{"entity_id": [...]}`
    pub data: Value,
}

impl ServiceCall {
    pub fn new(domain: impl Into<String>, service: impl Into<String>, data: Value) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            data,
        }
    }

    /// Reject domains and services that are not plain slugs
    pub fn validate(&self) -> RegistryResult<()> {
        if !is_slug(&self.domain) || !is_slug(&self.service) {
            return Err(RegistryError::Unsupported(format!(
                "invalid service {}.{}",
                self.domain, self.service
            )));
        }
        Ok(())
    }

    /// Target entity ids carried in `data.entity_id`
    pub fn entity_ids(&self) -> Vec<String> {
        match self.data.get("entity_id") {
            Some(Value::String(id)) => vec![id.clone()],
            Some(Value::Array(ids)) => ids
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Errors raised by registry adapters
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Registry returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Registry network error: {0}")]
    Network(String),

    #[error("Registry parse error: {0}")]
    Parse(String),

    #[error("Registry IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Registry configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RegistryError::Parse(err.to_string())
        } else {
            RegistryError::Network(err.to_string())
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Read and act on the home's devices
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Every entity, in the registry's enumeration order
    async fn all_states(&self) -> RegistryResult<Vec<EntityState>>;

    /// Every entity of one domain
    async fn states_in_domain(&self, domain: &str) -> RegistryResult<Vec<EntityState>> {
        Ok(self
            .all_states()
            .await?
            .into_iter()
            .filter(|s| s.domain() == domain)
            .collect())
    }

    /// Current state of one entity, `None` when it does not exist
    async fn get_state(&self, entity_id: &str) -> RegistryResult<Option<EntityState>>;

    /// Invoke a service; there is no result beyond success or failure
    async fn call_service(&self, call: &ServiceCall) -> RegistryResult<()>;

    /// Capture a still image from a camera entity
    async fn camera_image(&self, entity_id: &str) -> RegistryResult<Vec<u8>>;
}

/// Build the registry adapter selected in configuration
pub async fn create_registry(settings: &RegistrySettings) -> RegistryResult<Arc<dyn DeviceRegistry>> {
    match settings.backend {
        RegistryBackend::InMemory => {
            let registry = InMemoryDeviceRegistry::from_seeds(&settings.entities);
            tracing::info!(
                "Using in-memory device registry with {} entities",
                settings.entities.len()
            );
            Ok(Arc::new(registry))
        }
        RegistryBackend::HomeAssistant => {
            let registry = HomeAssistantRegistry::new(settings)?;
            tracing::info!("Using Home Assistant registry at {}", registry.base_url());
            Ok(Arc::new(registry))
        }
    }
}
