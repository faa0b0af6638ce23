use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    General,
    Restaurant,
    Accommodation,
    Attraction,
}

impl Intent {
    /// Whether this intent asks the model for a structured suggestion block.
    pub fn wants_suggestion(&self) -> bool {
        matches!(
            self,
            Intent::Restaurant | Intent::Accommodation | Intent::Attraction
        )
    }

    /// Output budget per intent. Accommodation carries the largest schema,
    /// so it gets the largest budget. Greetings are answered locally and
    /// never reach a provider.
    pub fn max_output_tokens(&self) -> u32 {
        match self {
            Intent::Greeting => 0,
            Intent::General => 1200,
            Intent::Restaurant => 1400,
            Intent::Accommodation => 1800,
            Intent::Attraction => 1400,
        }
    }
}
