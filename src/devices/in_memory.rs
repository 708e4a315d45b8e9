use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

use super::{entity_domain, DeviceRegistry, EntityState, RegistryError, RegistryResult, ServiceCall};
use crate::config::EntitySeed;

#[derive(Debug, Clone)]
enum Snapshot {
    Bytes(Vec<u8>),
    File(PathBuf),
}

/// Registry that keeps entities in memory.
///
/// Enumeration follows insertion order. Service calls are recorded and the
/// common on/off, open/close and lock/unlock services update entity state.
#[derive(Default)]
pub struct InMemoryDeviceRegistry {
    entities: RwLock<Vec<EntityState>>,
    snapshots: RwLock<HashMap<String, Snapshot>>,
    calls: RwLock<Vec<ServiceCall>>,
}

impl InMemoryDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configured entity seeds
    pub fn from_seeds(seeds: &[EntitySeed]) -> Self {
        let mut registry = Self::new();
        for seed in seeds {
            let name = seed
                .name
                .clone()
                .unwrap_or_else(|| default_name(&seed.entity_id));
            registry = registry.with_entity(EntityState::new(&seed.entity_id, name, &seed.state));
            if let Some(path) = &seed.snapshot_path {
                registry
                    .snapshots
                    .get_mut()
                    .insert(seed.entity_id.clone(), Snapshot::File(path.clone()));
            }
        }
        registry
    }

    /// Add or replace an entity
    pub fn with_entity(mut self, entity: EntityState) -> Self {
        let entities = self.entities.get_mut();
        match entities.iter_mut().find(|e| e.entity_id == entity.entity_id) {
            Some(existing) => *existing = entity,
            None => entities.push(entity),
        }
        self
    }

    /// Serve `bytes` as the still image of a camera entity
    pub fn with_snapshot(mut self, entity_id: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.snapshots
            .get_mut()
            .insert(entity_id.into(), Snapshot::Bytes(bytes));
        self
    }

    /// Service calls received so far, oldest first
    pub async fn service_calls(&self) -> Vec<ServiceCall> {
        self.calls.read().await.clone()
    }
}

/// Fallback display name: object id with underscores as spaces
fn default_name(entity_id: &str) -> String {
    entity_id
        .split_once('.')
        .map(|(_, object_id)| object_id)
        .unwrap_or(entity_id)
        .replace('_', " ")
}

/// State an entity ends up in after a well-known service, if any
fn next_state(service: &str, current: &str) -> Option<&'static str> {
    match service {
        "turn_on" => Some("on"),
        "turn_off" => Some("off"),
        "toggle" => Some(if current == "on" { "off" } else { "on" }),
        "lock" => Some("locked"),
        "unlock" => Some("unlocked"),
        "open_cover" => Some("open"),
        "close_cover" => Some("closed"),
        _ => None,
    }
}

#[async_trait]
impl DeviceRegistry for InMemoryDeviceRegistry {
    async fn all_states(&self) -> RegistryResult<Vec<EntityState>> {
        Ok(self.entities.read().await.clone())
    }

    async fn get_state(&self, entity_id: &str) -> RegistryResult<Option<EntityState>> {
        let entities = self.entities.read().await;
        Ok(entities.iter().find(|e| e.entity_id == entity_id).cloned())
    }

    async fn call_service(&self, call: &ServiceCall) -> RegistryResult<()> {
        let targets = call.entity_ids();
        {
            let mut entities = self.entities.write().await;

            // Validate every target before touching any state
            for id in &targets {
                if !entities.iter().any(|e| &e.entity_id == id) {
                    return Err(RegistryError::NotFound(id.clone()));
                }
            }

            for entity in entities.iter_mut().filter(|e| targets.contains(&e.entity_id)) {
                if let Some(state) = next_state(&call.service, &entity.state) {
                    entity.state = state.to_string();
                }
            }
        }

        self.calls.write().await.push(call.clone());
        Ok(())
    }

    async fn camera_image(&self, entity_id: &str) -> RegistryResult<Vec<u8>> {
        if entity_domain(entity_id) != "camera" {
            return Err(RegistryError::Unsupported(format!(
                "{} is not a camera",
                entity_id
            )));
        }

        let snapshot = self.snapshots.read().await.get(entity_id).cloned();
        match snapshot {
            Some(Snapshot::Bytes(bytes)) => Ok(bytes),
            Some(Snapshot::File(path)) => Ok(tokio::fs::read(&path).await?),
            None => Err(RegistryError::NotFound(format!(
                "no snapshot for {}",
                entity_id
            ))),
        }
    }
}
