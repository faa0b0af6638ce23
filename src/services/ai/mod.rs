pub mod gemini;
pub mod openai;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use self::gemini::GeminiProvider;
use self::openai::OpenAiProvider;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// The two interchangeable provider API shapes the orchestrator can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFamily {
    OpenAi,
    Gemini,
}

impl ProviderFamily {
    pub fn other(self) -> Self {
        match self {
            ProviderFamily::OpenAi => ProviderFamily::Gemini,
            ProviderFamily::Gemini => ProviderFamily::OpenAi,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderFamily::OpenAi => "openai",
            ProviderFamily::Gemini => "gemini",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedModel {
    pub family: ProviderFamily,
    pub provider_model_id: String,
}

// Short marketing names map to the dated identifiers the providers expect.
const MODEL_ALIASES: &[(&str, ProviderFamily, &str)] = &[
    ("gpt-4o", ProviderFamily::OpenAi, "gpt-4o-2024-08-06"),
    ("gpt-4o-mini", ProviderFamily::OpenAi, "gpt-4o-mini-2024-07-18"),
    ("gpt-4.1", ProviderFamily::OpenAi, "gpt-4.1-2025-04-14"),
    ("gpt-4.1-mini", ProviderFamily::OpenAi, "gpt-4.1-mini-2025-04-14"),
    ("gemini-flash", ProviderFamily::Gemini, "gemini-1.5-flash"),
    ("gemini-pro", ProviderFamily::Gemini, "gemini-1.5-pro"),
];

/// Resolve a configured model name into its provider family and the model id
/// to send over the wire. Resolution happens once, during configuration
/// lookup; nothing downstream inspects the model name again.
pub fn resolve_model(name: &str) -> Option<ResolvedModel> {
    let name = name.trim();

    for (alias, family, id) in MODEL_ALIASES {
        if name.eq_ignore_ascii_case(alias) {
            return Some(ResolvedModel {
                family: *family,
                provider_model_id: (*id).to_string(),
            });
        }
    }

    // Fully-qualified ids (e.g. a dated id configured directly) pass through.
    if name.starts_with("gpt-") || name.starts_with("o1") || name.starts_with("o3") {
        return Some(ResolvedModel {
            family: ProviderFamily::OpenAi,
            provider_model_id: name.to_string(),
        });
    }
    if name.starts_with("gemini-") {
        return Some(ResolvedModel {
            family: ProviderFamily::Gemini,
            provider_model_id: name.to_string(),
        });
    }

    None
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn invoke(
        &self,
        model: &str,
        api_key: &str,
        messages: &[Message],
        max_output_tokens: u32,
    ) -> anyhow::Result<String>;
}

pub struct ProviderRegistry {
    openai: Box<dyn LlmProvider>,
    gemini: Box<dyn LlmProvider>,
}

impl ProviderRegistry {
    pub fn new(openai: Box<dyn LlmProvider>, gemini: Box<dyn LlmProvider>) -> Self {
        Self { openai, gemini }
    }

    /// Build the real adapters sharing one HTTP client. The client timeout
    /// bounds every provider call; a timed-out call surfaces as a failure.
    pub fn from_config(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::new(
            Box::new(OpenAiProvider::new(client.clone())),
            Box::new(GeminiProvider::new(client)),
        ))
    }

    pub fn get(&self, family: ProviderFamily) -> &dyn LlmProvider {
        match family {
            ProviderFamily::OpenAi => self.openai.as_ref(),
            ProviderFamily::Gemini => self.gemini.as_ref(),
        }
    }
}
