use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{ChatMessage, ChatStyle, TripContext};
use crate::services::concierge;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConciergeRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub trip_id: Option<String>,
    #[serde(default)]
    pub trip_context: TripContext,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub style: ChatStyle,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConciergeResponse {
    pub generated_text: String,
    pub full_response: String,
    /// Image lookup is disabled upstream; the field stays for the callers
    /// that already expect it.
    pub generated_images: Vec<String>,
    pub structured_data: Option<serde_json::Value>,
}

pub async fn concierge_chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConciergeRequest>,
) -> Result<Json<ConciergeResponse>, AppError> {
    let request_id = Uuid::new_v4();
    tracing::info!(
        %request_id,
        trip_id = body.trip_id.as_deref().unwrap_or(""),
        history_len = body.conversation_history.len(),
        "incoming concierge request"
    );

    let result = concierge::handle(
        &state,
        body.user_id.as_deref().unwrap_or(""),
        &body.prompt,
        &body.trip_context,
        &body.conversation_history,
        &body.style,
    )
    .await?;

    Ok(Json(ConciergeResponse {
        generated_text: result.clean_text,
        full_response: result.full_response,
        generated_images: Vec::new(),
        structured_data: result.structured_data,
    }))
}
