//! Device-control commands embedded in model replies

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

/// A structured directive asking for a device state change.
///
/// Parsed out of a reply, executed once, then dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlCommand {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    /// Entity ids to act on; a bare string counts as one id
    #[serde(default, alias = "targets", deserialize_with = "one_or_many")]
    pub target: Vec<String>,
    /// Sentence to speak once the command succeeds
    #[serde(default)]
    pub response: Option<String>,
}

impl ControlCommand {
    /// Domain and service, when both are present and non-blank
    pub fn action(&self) -> Option<(&str, &str)> {
        let domain = self.domain.as_deref().map(str::trim).filter(|d| !d.is_empty())?;
        let service = self.service.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((domain, service))
    }

    /// Service-call payload in the registry's `{"entity_id": [...]}` shape
    pub fn service_data(&self) -> Value {
        json!({ "entity_id": self.target })
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(id) => vec![id],
        OneOrMany::Many(ids) => ids,
        OneOrMany::Null(()) => Vec::new(),
    })
}
