use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{LlmProvider, Message};

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Generate-content style adapter. The API has no system role, so the system
/// prompt is prepended to the first user message; `assistant` becomes
/// `model`; the key travels as a query parameter.
pub struct GeminiProvider {
    endpoint: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, DEFAULT_ENDPOINT.to_string())
    }

    pub fn with_endpoint(client: reqwest::Client, endpoint: String) -> Self {
        Self { endpoint, client }
    }
}

fn build_contents(messages: &[Message]) -> Vec<serde_json::Value> {
    let system_text = messages
        .iter()
        .filter(|m| m.role == "system")
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut contents = Vec::new();
    let mut system_pending = !system_text.is_empty();

    for msg in messages.iter().filter(|m| m.role != "system") {
        let role = if msg.role == "assistant" {
            "model"
        } else {
            "user"
        };

        let text = if system_pending && role == "user" {
            system_pending = false;
            format!("{system_text}\n\n{}", msg.content)
        } else {
            msg.content.clone()
        };

        contents.push(json!({
            "role": role,
            "parts": [{ "text": text }],
        }));
    }

    contents
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn invoke(
        &self,
        model: &str,
        api_key: &str,
        messages: &[Message],
        max_output_tokens: u32,
    ) -> anyhow::Result<String> {
        let body = json!({
            "contents": build_contents(messages),
            "generationConfig": {
                "maxOutputTokens": max_output_tokens,
                "temperature": 0.7,
            },
        });

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, model, api_key
        );

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("failed to call Gemini API")?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .context("failed to read Gemini response")?;

        if !status.is_success() {
            anyhow::bail!("Gemini API error ({status}): {text}");
        }

        let data: serde_json::Value =
            serde_json::from_str(&text).context("failed to parse Gemini response")?;

        Ok(data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }
}
