use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{ChatMessage, ChatStyle, Intent, TripContext};
use crate::services::ai::{resolve_model, Message, ProviderFamily};
use crate::services::{extract, intent, prompt};
use crate::state::AppState;

// Degraded-mode models used when the primary family produced nothing and we
// retry once against the other family with a generic prompt.
const FALLBACK_OPENAI_MODEL: &str = "gpt-4o-mini-2024-07-18";
const FALLBACK_GEMINI_MODEL: &str = "gemini-1.5-flash";

pub struct PipelineResult {
    pub clean_text: String,
    pub full_response: String,
    pub structured_data: Option<serde_json::Value>,
}

struct ResolvedProvider {
    family: ProviderFamily,
    model_id: String,
    api_key: String,
    custom_instructions: String,
}

/// Top-level entry point: classify the utterance, talk to a provider and
/// extract whatever structured suggestion came back. Everything here lives
/// and dies within one request; nothing is persisted.
pub async fn handle(
    state: &Arc<AppState>,
    user_id: &str,
    utterance: &str,
    trip: &TripContext,
    history: &[ChatMessage],
    style: &ChatStyle,
) -> Result<PipelineResult, AppError> {
    let utterance = utterance.trim();
    if utterance.is_empty() {
        return Err(AppError::InvalidRequest("prompt is required".to_string()));
    }

    let resolved = resolve_provider(state, user_id)?;

    let intent = intent::classify(utterance);
    tracing::info!(
        user_id,
        intent = ?intent,
        family = resolved.family.as_str(),
        model = %resolved.model_id,
        "classified concierge request"
    );

    // Greetings are high-frequency and gain nothing from a model round-trip.
    if intent == Intent::Greeting {
        let text = prompt::greeting_reply(trip.destination.as_deref(), style);
        return Ok(PipelineResult {
            clean_text: text.clone(),
            full_response: text,
            structured_data: None,
        });
    }

    let system = prompt::build_system_prompt(intent, &resolved.custom_instructions, style);
    let messages = build_messages(&system, history, utterance, trip)?;

    let provider = state.providers.get(resolved.family);
    let raw = match provider
        .invoke(
            &resolved.model_id,
            &resolved.api_key,
            &messages,
            intent.max_output_tokens(),
        )
        .await
    {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            tracing::warn!(
                family = resolved.family.as_str(),
                "provider returned empty output, trying alternate family"
            );
            // A failed fallback is the same as no fallback: the error is
            // discarded and the deterministic text below takes over.
            fallback_invoke(state, resolved.family.other(), history, utterance, trip, style)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "fallback provider unavailable");
                    String::new()
                })
        }
        Err(primary_err) => {
            tracing::warn!(
                error = %primary_err,
                family = resolved.family.as_str(),
                "provider call failed, trying alternate family"
            );
            match fallback_invoke(state, resolved.family.other(), history, utterance, trip, style)
                .await
            {
                Ok(text) => text,
                Err(fallback_err) => {
                    tracing::warn!(error = %fallback_err, "fallback provider unavailable");
                    return Err(AppError::Provider(primary_err.to_string()));
                }
            }
        }
    };

    let extraction = extract::extract(&raw, intent);

    let mut clean_text = extraction.clean_text.trim().to_string();
    if clean_text.is_empty() {
        clean_text = prompt::fallback_reply(trip.destination.as_deref());
    }

    Ok(PipelineResult {
        clean_text,
        full_response: raw,
        structured_data: extraction.structured_data,
    })
}

/// Layered configuration lookup: the user's own profile, then the named
/// fallback profile, then the system defaults. The model name resolves once
/// into a provider family plus wire id.
fn resolve_provider(state: &Arc<AppState>, user_id: &str) -> Result<ResolvedProvider, AppError> {
    let profile = {
        let db = state.db.lock().unwrap();
        match queries::get_profile(&db, user_id).map_err(AppError::Internal)? {
            Some(p) => Some(p),
            None => queries::get_profile(&db, &state.config.fallback_profile)
                .map_err(AppError::Internal)?,
        }
    };

    let model_name = profile
        .as_ref()
        .map(|p| p.model.trim())
        .filter(|m| !m.is_empty())
        .unwrap_or(state.config.default_model.as_str())
        .to_string();

    let resolved = resolve_model(&model_name)
        .ok_or_else(|| AppError::Config(format!("unknown model: {model_name}")))?;

    let api_key = profile
        .as_ref()
        .map(|p| p.api_key.trim().to_string())
        .filter(|k| !k.is_empty())
        .or_else(|| system_key(&state.config, resolved.family))
        .ok_or_else(|| {
            AppError::Config(format!("no API credential configured for model {model_name}"))
        })?;

    Ok(ResolvedProvider {
        family: resolved.family,
        model_id: resolved.provider_model_id,
        api_key,
        custom_instructions: profile.map(|p| p.custom_instructions).unwrap_or_default(),
    })
}

fn system_key(config: &AppConfig, family: ProviderFamily) -> Option<String> {
    let key = match family {
        ProviderFamily::OpenAi => &config.openai_api_key,
        ProviderFamily::Gemini => &config.gemini_api_key,
    };
    (!key.is_empty()).then(|| key.clone())
}

/// One-shot degraded retry against the other provider family, using a
/// generic prompt. Only system credentials are considered here; user keys
/// belong to the family they were configured for.
async fn fallback_invoke(
    state: &Arc<AppState>,
    family: ProviderFamily,
    history: &[ChatMessage],
    utterance: &str,
    trip: &TripContext,
    style: &ChatStyle,
) -> anyhow::Result<String> {
    let api_key = system_key(&state.config, family)
        .ok_or_else(|| anyhow::anyhow!("no system credential for {} family", family.as_str()))?;

    let model_id = match family {
        ProviderFamily::OpenAi => FALLBACK_OPENAI_MODEL,
        ProviderFamily::Gemini => FALLBACK_GEMINI_MODEL,
    };

    let system = prompt::build_system_prompt(Intent::General, "", style);
    let messages = build_messages(&system, history, utterance, trip)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let text = state
        .providers
        .get(family)
        .invoke(
            model_id,
            &api_key,
            &messages,
            Intent::General.max_output_tokens(),
        )
        .await?;

    anyhow::ensure!(
        !text.trim().is_empty(),
        "fallback provider returned empty output"
    );
    Ok(text)
}

/// System instructions, then the prior turns, then the current turn wrapped
/// with the trip-context JSON.
fn build_messages(
    system: &str,
    history: &[ChatMessage],
    utterance: &str,
    trip: &TripContext,
) -> Result<Vec<Message>, AppError> {
    let mut messages = vec![Message {
        role: "system".to_string(),
        content: system.to_string(),
    }];

    for m in history {
        messages.push(Message {
            role: m.role.clone(),
            content: m.content.clone(),
        });
    }

    let trip_json = serde_json::to_string(trip)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to encode trip context: {e}")))?;
    messages.push(Message {
        role: "user".to_string(),
        content: format!("Contexto da viagem: {trip_json}\n\n{utterance}"),
    });

    Ok(messages)
}
