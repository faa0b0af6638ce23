use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceExt;

use concierge::config::AppConfig;
use concierge::db;
use concierge::handlers;
use concierge::services::ai::{LlmProvider, Message, ProviderRegistry};
use concierge::state::AppState;

// ── Mock Providers ──

#[derive(Clone)]
enum MockReply {
    Text(&'static str),
    Empty,
    Error,
}

struct MockProvider {
    reply: MockReply,
    calls: Arc<AtomicUsize>,
    last_messages: Arc<Mutex<Vec<Message>>>,
}

#[derive(Clone)]
struct MockHandle {
    calls: Arc<AtomicUsize>,
    last_messages: Arc<Mutex<Vec<Message>>>,
}

impl MockHandle {
    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_system_prompt(&self) -> String {
        self.last_messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }

    fn last_user_content(&self) -> String {
        self.last_messages
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

fn mock_provider(reply: MockReply) -> (MockProvider, MockHandle) {
    let calls = Arc::new(AtomicUsize::new(0));
    let last_messages = Arc::new(Mutex::new(Vec::new()));
    let provider = MockProvider {
        reply,
        calls: Arc::clone(&calls),
        last_messages: Arc::clone(&last_messages),
    };
    (
        provider,
        MockHandle {
            calls,
            last_messages,
        },
    )
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn invoke(
        &self,
        _model: &str,
        _api_key: &str,
        messages: &[Message],
        _max_output_tokens: u32,
    ) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = messages.to_vec();

        match &self.reply {
            MockReply::Text(text) => Ok((*text).to_string()),
            MockReply::Empty => Ok(String::new()),
            MockReply::Error => anyhow::bail!(
                "OpenAI API error (500 Internal Server Error): {{\"error\":\"boom\"}}"
            ),
        }
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        openai_api_key: "sk-test".to_string(),
        gemini_api_key: "gm-test".to_string(),
        default_model: "gpt-4o-mini".to_string(),
        fallback_profile: "default".to_string(),
        provider_timeout_secs: 60,
    }
}

fn test_state(
    config: AppConfig,
    openai: MockReply,
    gemini: MockReply,
) -> (Arc<AppState>, MockHandle, MockHandle) {
    let (openai_provider, openai_handle) = mock_provider(openai);
    let (gemini_provider, gemini_handle) = mock_provider(gemini);

    let conn = db::init_db(":memory:").unwrap();
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config,
        providers: ProviderRegistry::new(Box::new(openai_provider), Box::new(gemini_provider)),
    });

    (state, openai_handle, gemini_handle)
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/concierge", post(handlers::chat::concierge_chat))
        .route(
            "/api/profiles/:user_id",
            get(handlers::profiles::get_profile).put(handlers::profiles::update_profile),
        )
        .with_state(state)
}

fn chat_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/concierge")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(res: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

const RESTAURANT_REPLY: &str = "Que tal o Cacio e Pepe em Trastevere?\n\n```json\n{\"restaurant\":{\"name\":\"Cacio e Pepe\",\"cuisine\":\"Romana\",\"description\":\"Massas clássicas\",\"address\":\"Vicolo del Cinque 15\",\"price_range\":\"€€\",\"website\":\"https://example.com\",\"map_url\":\"https://www.google.com/maps/search/?api=1&query=Cacio+e+Pepe\"}}\n```";

// ── Health ──

#[tokio::test]
async fn test_health() {
    let (state, _, _) = test_state(test_config(), MockReply::Empty, MockReply::Empty);
    let app = test_app(state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

// ── Validation ──

#[tokio::test]
async fn test_missing_prompt_is_rejected() {
    let (state, openai, gemini) = test_state(test_config(), MockReply::Empty, MockReply::Empty);
    let app = test_app(state);

    let res = app
        .oneshot(chat_request(serde_json::json!({ "prompt": "  " })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = response_json(res).await;
    assert!(json["error"].as_str().unwrap().contains("prompt"));
    assert_eq!(openai.call_count(), 0);
    assert_eq!(gemini.call_count(), 0);
}

#[tokio::test]
async fn test_no_credentials_is_a_config_error() {
    let mut config = test_config();
    config.openai_api_key = String::new();
    config.gemini_api_key = String::new();
    let (state, openai, _) = test_state(config, MockReply::Empty, MockReply::Empty);
    let app = test_app(state);

    let res = app
        .oneshot(chat_request(
            serde_json::json!({ "prompt": "restaurantes em Roma" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = response_json(res).await;
    assert!(json["error"].as_str().unwrap().contains("credential"));
    assert_eq!(openai.call_count(), 0);
}

// ── Greeting short-circuit ──

#[tokio::test]
async fn test_greeting_never_calls_a_provider() {
    let (state, openai, gemini) = test_state(
        test_config(),
        MockReply::Text("não deveria ser usado"),
        MockReply::Text("não deveria ser usado"),
    );
    let app = test_app(state);

    let res = app
        .oneshot(chat_request(serde_json::json!({
            "prompt": "oi",
            "tripContext": { "destination": "Roma" },
        })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = response_json(res).await;
    let text = json["generatedText"].as_str().unwrap();
    assert!(!text.is_empty());
    assert!(text.contains("Roma"));
    assert!(json["structuredData"].is_null());
    assert_eq!(openai.call_count(), 0);
    assert_eq!(gemini.call_count(), 0);
}

#[tokio::test]
async fn test_greeting_respects_emoji_style() {
    let (state, _, _) = test_state(test_config(), MockReply::Empty, MockReply::Empty);
    let app = test_app(state);

    let res = app
        .oneshot(chat_request(serde_json::json!({
            "prompt": "bom dia!",
            "style": { "tone": "formal", "emojis": false },
        })))
        .await
        .unwrap();

    let json = response_json(res).await;
    assert!(!json["generatedText"].as_str().unwrap().contains('😊'));
}

// ── Intent gating ──

#[tokio::test]
async fn test_topic_without_detail_request_stays_general() {
    let (state, openai, _) = test_state(
        test_config(),
        MockReply::Text("Roma tem ótimas trattorias no Trastevere."),
        MockReply::Empty,
    );
    let app = test_app(state);

    let res = app
        .oneshot(chat_request(serde_json::json!({
            "prompt": "restaurantes em Roma",
            "tripContext": { "destination": "Roma" },
        })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = response_json(res).await;
    assert!(json["structuredData"].is_null());
    assert_eq!(openai.call_count(), 1);

    // General prompts forbid JSON output.
    let system = openai.last_system_prompt();
    assert!(system.contains("Não inclua blocos JSON"));
    assert!(!system.contains("```json"));
}

#[tokio::test]
async fn test_save_restaurant_extracts_structured_data() {
    let (state, openai, gemini) = test_state(
        test_config(),
        MockReply::Text(RESTAURANT_REPLY),
        MockReply::Empty,
    );
    let app = test_app(state);

    let res = app
        .oneshot(chat_request(serde_json::json!({
            "prompt": "salvar o restaurante Cacio e Pepe",
            "tripContext": { "destination": "Roma" },
            "conversationHistory": [
                { "role": "user", "content": "restaurantes em Roma" },
                { "role": "assistant", "content": "Tem o Cacio e Pepe..." }
            ],
        })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = response_json(res).await;

    let text = json["generatedText"].as_str().unwrap();
    assert!(text.contains("Que tal o Cacio e Pepe"));
    assert!(!text.contains("```"));

    assert!(json["fullResponse"].as_str().unwrap().contains("```json"));
    assert_eq!(json["structuredData"]["restaurant"]["name"], "Cacio e Pepe");
    assert_eq!(
        json["structuredData"]["restaurant"]["address"],
        "Vicolo del Cinque 15"
    );
    assert_eq!(json["generatedImages"].as_array().unwrap().len(), 0);

    assert_eq!(openai.call_count(), 1);
    assert_eq!(gemini.call_count(), 0);

    // The restaurant schema skeleton is part of the system instructions, and
    // the current turn carries the trip context.
    let system = openai.last_system_prompt();
    assert!(system.contains("\"restaurant\""));
    let user = openai.last_user_content();
    assert!(user.contains("Contexto da viagem:"));
    assert!(user.contains("Roma"));
}

// ── Provider failure and fallback ──

#[tokio::test]
async fn test_provider_error_without_fallback_credential_propagates() {
    let mut config = test_config();
    config.gemini_api_key = String::new();
    let (state, openai, gemini) = test_state(config, MockReply::Error, MockReply::Empty);
    let app = test_app(state);

    let res = app
        .oneshot(chat_request(
            serde_json::json!({ "prompt": "salvar o restaurante Cacio e Pepe" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let json = response_json(res).await;
    assert!(json["error"].as_str().unwrap().contains("500"));
    assert_eq!(openai.call_count(), 1);
    assert_eq!(gemini.call_count(), 0);
}

#[tokio::test]
async fn test_provider_error_uses_other_family_once() {
    let (state, openai, gemini) = test_state(
        test_config(),
        MockReply::Error,
        MockReply::Text("Posso ajudar de outro jeito?"),
    );
    let app = test_app(state);

    let res = app
        .oneshot(chat_request(
            serde_json::json!({ "prompt": "quais passeios fazer?" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = response_json(res).await;
    assert_eq!(
        json["generatedText"].as_str().unwrap(),
        "Posso ajudar de outro jeito?"
    );
    assert_eq!(openai.call_count(), 1);
    assert_eq!(gemini.call_count(), 1);
}

#[tokio::test]
async fn test_empty_output_falls_back_once_then_deterministic_text() {
    let (state, openai, gemini) = test_state(test_config(), MockReply::Empty, MockReply::Empty);
    let app = test_app(state);

    let res = app
        .oneshot(chat_request(serde_json::json!({
            "prompt": "me indica um restaurante",
            "tripContext": { "destination": "Lisboa" },
        })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = response_json(res).await;

    // Exactly one degraded retry against the other family.
    assert_eq!(openai.call_count(), 1);
    assert_eq!(gemini.call_count(), 1);

    // Never a blank reply: the deterministic destination-aware text wins.
    let text = json["generatedText"].as_str().unwrap();
    assert!(!text.is_empty());
    assert!(text.contains("Lisboa"));
    assert!(text.contains("salvar X"));
}

#[tokio::test]
async fn test_empty_output_with_no_fallback_credential_still_replies() {
    let mut config = test_config();
    config.gemini_api_key = String::new();
    let (state, openai, gemini) = test_state(config, MockReply::Empty, MockReply::Empty);
    let app = test_app(state);

    let res = app
        .oneshot(chat_request(
            serde_json::json!({ "prompt": "me indica um restaurante" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = response_json(res).await;
    assert!(!json["generatedText"].as_str().unwrap().is_empty());
    assert_eq!(openai.call_count(), 1);
    assert_eq!(gemini.call_count(), 0);
}

// ── Profiles ──

#[tokio::test]
async fn test_profile_upsert_and_masked_read() {
    let (state, _, _) = test_state(test_config(), MockReply::Empty, MockReply::Empty);

    let app = test_app(state.clone());
    let res = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/profiles/alice")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "model": "gemini-flash",
                        "apiKey": "user-key",
                        "customInstructions": "Responda em inglês.",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let app = test_app(state);
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/profiles/alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let json = response_json(res).await;
    assert_eq!(json["model"], "gemini-flash");
    assert_eq!(json["apiKeyConfigured"], true);
    assert_eq!(json["customInstructions"], "Responda em inglês.");
    assert!(json.get("apiKey").is_none());
}

#[tokio::test]
async fn test_profile_rejects_unknown_model() {
    let (state, _, _) = test_state(test_config(), MockReply::Empty, MockReply::Empty);
    let app = test_app(state);

    let res = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/profiles/alice")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "model": "llama-3" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_profile_is_404() {
    let (state, _, _) = test_state(test_config(), MockReply::Empty, MockReply::Empty);
    let app = test_app(state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/profiles/nobody")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_profile_routes_to_its_model_family() {
    let (state, openai, gemini) = test_state(
        test_config(),
        MockReply::Text("resposta openai"),
        MockReply::Text("resposta gemini"),
    );

    // alice's profile points at a Gemini model with her own key.
    let app = test_app(state.clone());
    app.oneshot(
        Request::builder()
            .method("PUT")
            .uri("/api/profiles/alice")
            .header("Content-Type", "application/json")
            .body(Body::from(
                serde_json::json!({ "model": "gemini-flash", "apiKey": "alice-key" }).to_string(),
            ))
            .unwrap(),
    )
    .await
    .unwrap();

    let app = test_app(state);
    let res = app
        .oneshot(chat_request(serde_json::json!({
            "prompt": "quais museus visitar?",
            "userId": "alice",
        })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = response_json(res).await;
    assert_eq!(json["generatedText"], "resposta gemini");
    assert_eq!(openai.call_count(), 0);
    assert_eq!(gemini.call_count(), 1);
}

#[tokio::test]
async fn test_fallback_profile_applies_to_unknown_users() {
    let (state, openai, gemini) = test_state(
        test_config(),
        MockReply::Text("resposta openai"),
        MockReply::Text("resposta gemini"),
    );

    // The "default" profile switches everyone without a profile to Gemini.
    let app = test_app(state.clone());
    app.oneshot(
        Request::builder()
            .method("PUT")
            .uri("/api/profiles/default")
            .header("Content-Type", "application/json")
            .body(Body::from(
                serde_json::json!({ "model": "gemini-pro" }).to_string(),
            ))
            .unwrap(),
    )
    .await
    .unwrap();

    let app = test_app(state);
    let res = app
        .oneshot(chat_request(serde_json::json!({
            "prompt": "onde jantar hoje?",
            "userId": "someone-new",
        })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = response_json(res).await;
    assert_eq!(json["generatedText"], "resposta gemini");
    assert_eq!(openai.call_count(), 0);
    assert_eq!(gemini.call_count(), 1);
}
