//! Input and output of a single conversation turn

use serde::{Deserialize, Serialize};

fn default_language() -> String {
    "vi".to_string()
}

/// One user utterance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Utterance {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
        }
    }
}

/// Where a turn's image came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ImageSource {
    None,
    Url(String),
    LocalPath(String),
    Device(String),
}

/// Spoken result of a turn
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechResult {
    pub speech_text: String,
    pub language: String,
    /// Whether a device command was dispatched successfully
    #[serde(default)]
    pub command_executed: bool,
    /// Whether an image accompanied the model request
    #[serde(default)]
    pub image_attached: bool,
}

impl SpeechResult {
    pub fn speech(speech_text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            speech_text: speech_text.into(),
            language: language.into(),
            command_executed: false,
            image_attached: false,
        }
    }
}
