use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Per-user concierge configuration. Empty strings mean "not set"; the
/// orchestrator falls back to the system defaults in that case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConciergeProfile {
    pub user_id: String,
    pub model: String,
    pub api_key: String,
    pub custom_instructions: String,
    pub updated_at: NaiveDateTime,
}
