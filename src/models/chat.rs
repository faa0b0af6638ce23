use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStyle {
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default = "default_true")]
    pub emojis: bool,
}

fn default_tone() -> String {
    "casual".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ChatStyle {
    fn default() -> Self {
        Self {
            tone: default_tone(),
            emojis: true,
        }
    }
}
