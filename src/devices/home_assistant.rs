//! Home Assistant REST adapter

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::time::Duration;

use super::{is_entity_id, DeviceRegistry, EntityState, RegistryError, RegistryResult, ServiceCall};
use crate::config::RegistrySettings;

/// Registry backed by Home Assistant's REST API
pub struct HomeAssistantRegistry {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HomeAssistantRegistry {
    /// Create the adapter from registry settings.
    ///
    /// The token comes from `token`, or else from the environment variable
    /// named by `token_env` (default `HASS_TOKEN`).
    pub fn new(settings: &RegistrySettings) -> RegistryResult<Self> {
        let base_url = settings
            .base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                RegistryError::Configuration("registry.base_url is required".to_string())
            })?;

        let token = match settings.token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => token.to_string(),
            None => {
                let var = settings.token_env.as_deref().unwrap_or("HASS_TOKEN");
                env::var(var).map_err(|_| {
                    RegistryError::Configuration(format!(
                        "Environment variable {} not set",
                        var
                    ))
                })?
            }
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| RegistryError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    async fn check(response: reqwest::Response) -> RegistryResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(RegistryError::Http {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl DeviceRegistry for HomeAssistantRegistry {
    async fn all_states(&self) -> RegistryResult<Vec<EntityState>> {
        let response = Self::check(self.get("/api/states").send().await?).await?;
        let states: Vec<HaState> = response.json().await?;
        Ok(states.into_iter().map(HaState::into_entity).collect())
    }

    async fn get_state(&self, entity_id: &str) -> RegistryResult<Option<EntityState>> {
        if !is_entity_id(entity_id) {
            return Ok(None);
        }
        let response = self
            .get(&format!("/api/states/{}", entity_id))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let state: HaState = Self::check(response).await?.json().await?;
        Ok(Some(state.into_entity()))
    }

    async fn call_service(&self, call: &ServiceCall) -> RegistryResult<()> {
        // Both values end up as URL path segments
        call.validate()?;
        let response = self
            .client
            .post(format!(
                "{}/api/services/{}/{}",
                self.base_url, call.domain, call.service
            ))
            .bearer_auth(&self.token)
            .json(&call.data)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn camera_image(&self, entity_id: &str) -> RegistryResult<Vec<u8>> {
        if !is_entity_id(entity_id) {
            return Err(RegistryError::Unsupported(format!(
                "invalid entity id {}",
                entity_id
            )));
        }
        let response = self
            .get(&format!("/api/camera_proxy/{}", entity_id))
            .send()
            .await?;
        let bytes = Self::check(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

// Home Assistant API response types

#[derive(Debug, Deserialize)]
struct HaState {
    entity_id: String,
    state: String,
    #[serde(default)]
    attributes: Value,
}

impl HaState {
    fn into_entity(self) -> EntityState {
        let name = self
            .attributes
            .get("friendly_name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| {
                self.entity_id
                    .split_once('.')
                    .map(|(_, object_id)| object_id)
                    .unwrap_or(&self.entity_id)
                    .replace('_', " ")
            });
        EntityState {
            entity_id: self.entity_id,
            name,
            state: self.state,
        }
    }
}
