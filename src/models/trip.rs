use serde::{Deserialize, Serialize};

/// Read-only snapshot of the active trip, passed into every prompt so
/// suggestions stay relevant to where the user is actually going.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TripContext {
    pub destination: Option<String>,
    pub title: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
