use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod validator;

use crate::agents::config::{AgentConfig, LlmProviderConfig};

/// Config file looked up when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "groq-agent.toml";
/// Prefix for environment overrides, e.g. `GROQ_AGENT_AGENT__API_KEY`
pub const ENV_PREFIX: &str = "GROQ_AGENT";
/// Fallback source for the API key
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub llm: LlmProviderConfig,
    #[serde(default)]
    pub registry: RegistrySettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Which device registry adapter to run against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryBackend {
    #[default]
    InMemory,
    HomeAssistant,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistrySettings {
    #[serde(default)]
    pub backend: RegistryBackend,
    /// Home Assistant root, e.g. `http://homeassistant.local:8123`
    #[serde(default)]
    pub base_url: Option<String>,
    /// Long-lived access token
    #[serde(default)]
    pub token: Option<String>,
    /// Environment variable holding the token (default `HASS_TOKEN`)
    #[serde(default)]
    pub token_env: Option<String>,
    #[serde(default = "default_registry_timeout")]
    pub timeout_secs: u64,
    /// Entities seeded into the in-memory registry
    #[serde(default)]
    pub entities: Vec<EntitySeed>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            backend: RegistryBackend::default(),
            base_url: None,
            token: None,
            token_env: None,
            timeout_secs: default_registry_timeout(),
            entities: Vec::new(),
        }
    }
}

fn default_registry_timeout() -> u64 {
    10
}

/// One entity for the in-memory registry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntitySeed {
    pub entity_id: String,
    /// Friendly name; derived from the object id when absent
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_entity_state")]
    pub state: String,
    /// Image file served as this camera's snapshot
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

fn default_entity_state() -> String {
    "unknown".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    /// Load `groq-agent.toml` from `root`, if present
    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        Self::from_file(Path::new(root).join(DEFAULT_CONFIG_FILE))
    }

    /// Load settings from an optional config file plus the environment.
    ///
    /// Precedence: environment > file > defaults. The result is validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .build()?;

        let mut settings: Settings = s.try_deserialize()?;

        settings.apply_api_key_fallback(std::env::var(API_KEY_ENV).ok());

        // Validate configuration
        validator::ConfigValidator::validate(&settings).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })?;

        Ok(settings)
    }

    /// Use `fallback` as the API key when none is configured
    pub fn apply_api_key_fallback(&mut self, fallback: Option<String>) {
        if !self.agent.api_key.trim().is_empty() {
            return;
        }
        if let Some(key) = fallback.filter(|k| !k.trim().is_empty()) {
            tracing::debug!("Using API key from {}", API_KEY_ENV);
            self.agent.api_key = key;
        }
    }

    /// Apply `serve` overrides (CLI > env vars > config file)
    pub fn apply_server_overrides(&mut self, host: Option<String>, port: Option<u16>) {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
    }
}
