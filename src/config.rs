use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub openai_api_key: String,
    pub gemini_api_key: String,
    pub default_model: String,
    pub fallback_profile: String,
    pub provider_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "concierge.db".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            default_model: env::var("DEFAULT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            fallback_profile: env::var("FALLBACK_PROFILE")
                .unwrap_or_else(|_| "default".to_string()),
            provider_timeout_secs: env::var("PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }
}
