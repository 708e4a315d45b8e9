//! System prompt assembly
//!
//! The prompt grounds the model in live device state and tells it the exact
//! JSON shape the response interpreter understands.

use tracing::debug;

use crate::agents::config::AgentConfig;
use crate::agents::error::AgentResult;
use crate::devices::{DeviceRegistry, EntityState};

/// Domains listed when no entities are selected
pub const DEFAULT_DOMAINS: &[&str] = &["light", "switch", "fan", "cover", "climate", "lock"];

/// Maximum entities listed when no entities are selected
pub const MAX_DEFAULT_ENTITIES: usize = 50;

/// Control-format rule appended to every system prompt. The interpreter
/// depends on the model answering in exactly this shape.
pub const CONTROL_RULES: &str = r#"[Quy tắc điều khiển]
Nếu người dùng muốn thay đổi trạng thái thiết bị (Bật/Tắt/Mở/Khóa...), hãy trả về JSON:
{"domain": "tên_domain", "service": "tên_service", "target": ["entity_id"], "response": "Câu trả lời cho người dùng"}

Ví dụ: {"domain": "light", "service": "turn_on", "target": ["light.living_room"], "response": "Đã bật đèn."}
Nếu không cần điều khiển, hãy trả lời bình thường.
"#;

/// Ordered device listing for one turn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSnapshot {
    pub entries: Vec<EntityState>,
}

impl DeviceSnapshot {
    /// Snapshot the registry.
    ///
    /// With a non-empty selection, exactly the selected entities that exist,
    /// in selection order. Otherwise every entity in [`DEFAULT_DOMAINS`],
    /// cut to the first [`MAX_DEFAULT_ENTITIES`] in registry order.
    pub async fn capture(
        selected_entities: &[String],
        registry: &dyn DeviceRegistry,
    ) -> AgentResult<Self> {
        let mut entries = Vec::new();

        if !selected_entities.is_empty() {
            for entity_id in selected_entities {
                match registry.get_state(entity_id).await? {
                    Some(state) => entries.push(state),
                    None => debug!("Selected entity {} not found, skipping", entity_id),
                }
            }
        } else {
            entries = registry
                .all_states()
                .await?
                .into_iter()
                .filter(|s| DEFAULT_DOMAINS.iter().any(|d| *d == s.domain()))
                .take(MAX_DEFAULT_ENTITIES)
                .collect();
        }

        Ok(Self { entries })
    }

    /// One `name (id): state` line per entity
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{} ({}): {}", e.name, e.entity_id, e.state))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Assemble the system prompt from instruction, device block and rules
pub fn render_system_prompt(instruction: &str, snapshot: &DeviceSnapshot) -> String {
    format!(
        "{}\n\n[Dữ liệu hiện tại]\n{}\n\n{}",
        instruction,
        snapshot.render(),
        CONTROL_RULES
    )
}

/// Build the system prompt for one turn
pub async fn build_system_prompt(
    config: &AgentConfig,
    registry: &dyn DeviceRegistry,
) -> AgentResult<String> {
    let snapshot = DeviceSnapshot::capture(&config.selected_entities, registry).await?;
    debug!("Device context lists {} entities", snapshot.entries.len());
    Ok(render_system_prompt(config.instruction(), &snapshot))
}
