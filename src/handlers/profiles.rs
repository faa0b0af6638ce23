use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::ConciergeProfile;
use crate::services::ai::resolve_model;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user_id: String,
    pub model: String,
    pub api_key_configured: bool,
    pub custom_instructions: String,
    pub updated_at: String,
}

// GET /api/profiles/:user_id — the key itself never leaves the server.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = {
        let db = state.db.lock().unwrap();
        queries::get_profile(&db, &user_id).map_err(AppError::Internal)?
    }
    .ok_or_else(|| AppError::NotFound(format!("profile {user_id}")))?;

    Ok(Json(ProfileResponse {
        user_id: profile.user_id,
        model: profile.model,
        api_key_configured: !profile.api_key.is_empty(),
        custom_instructions: profile.custom_instructions,
        updated_at: profile.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub custom_instructions: Option<String>,
}

// PUT /api/profiles/:user_id
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Some(model) = body.model.as_deref() {
        if !model.is_empty() && resolve_model(model).is_none() {
            return Err(AppError::InvalidRequest(format!("unknown model: {model}")));
        }
    }

    let db = state.db.lock().unwrap();

    let mut profile = queries::get_profile(&db, &user_id)
        .map_err(AppError::Internal)?
        .unwrap_or(ConciergeProfile {
            user_id: user_id.clone(),
            model: String::new(),
            api_key: String::new(),
            custom_instructions: String::new(),
            updated_at: Utc::now().naive_utc(),
        });

    if let Some(model) = body.model {
        profile.model = model;
    }
    if let Some(api_key) = body.api_key {
        profile.api_key = api_key;
    }
    if let Some(instructions) = body.custom_instructions {
        profile.custom_instructions = instructions;
    }

    queries::save_profile(&db, &profile).map_err(AppError::Internal)?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
