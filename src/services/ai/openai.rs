use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{LlmProvider, Message};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Chat-completions style adapter. Messages go through unchanged, including
/// the system role; authentication is a bearer header.
pub struct OpenAiProvider {
    endpoint: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, DEFAULT_ENDPOINT.to_string())
    }

    pub fn with_endpoint(client: reqwest::Client, endpoint: String) -> Self {
        Self { endpoint, client }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn invoke(
        &self,
        model: &str,
        api_key: &str,
        messages: &[Message],
        max_output_tokens: u32,
    ) -> anyhow::Result<String> {
        let chat_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role,
                    "content": msg.content,
                })
            })
            .collect();

        let body = json!({
            "model": model,
            "messages": chat_messages,
            "max_tokens": max_output_tokens,
            "temperature": 0.7,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .context("failed to call OpenAI API")?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .context("failed to read OpenAI response")?;

        if !status.is_success() {
            anyhow::bail!("OpenAI API error ({status}): {text}");
        }

        let data: serde_json::Value =
            serde_json::from_str(&text).context("failed to parse OpenAI response")?;

        // Missing content is treated as empty output; the orchestrator owns
        // the fallback behavior for that case.
        Ok(data["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }
}
