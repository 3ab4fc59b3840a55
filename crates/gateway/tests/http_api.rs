//! HTTP routes driven through the router with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use cr_domain::config::{Config, ProviderSelection};
use cr_domain::conversation::GenerationRequest;
use cr_domain::error::GenerationError;
use cr_gateway::api;
use cr_gateway::state::AppState;
use cr_providers::{ResponseResolver, TextBackend};

struct Pong;

#[async_trait::async_trait]
impl TextBackend for Pong {
    async fn generate(&self, req: &GenerationRequest) -> Result<String, GenerationError> {
        assert!(req.history.is_empty(), "stateless route must not send history");
        Ok("PONG".into())
    }
    fn name(&self) -> &str {
        "pong"
    }
}

struct Failing;

#[async_trait::async_trait]
impl TextBackend for Failing {
    async fn generate(&self, _req: &GenerationRequest) -> Result<String, GenerationError> {
        Err(GenerationError::provider("mock", "HTTP 503"))
    }
    fn name(&self) -> &str {
        "failing"
    }
}

fn app(selection: ProviderSelection, backend: Option<Arc<dyn TextBackend>>) -> Router {
    let resolver = Arc::new(ResponseResolver::new(selection, backend));
    api::router().with_state(AppState::new(Arc::new(Config::default()), resolver))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn post_chat(path: &str, body: &str) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Health
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn health_is_served_bare_and_under_api() {
    for path in ["/health", "/api/health"] {
        let app = app(ProviderSelection::Local, Some(Arc::new(Pong)));
        let (status, body) = send(app, Request::get(path).body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
        assert_eq!(body["message"], "AI Agent is running");
        assert_eq!(body["backendName"], "ollama");
        assert_eq!(body["activeConnections"], 0);
    }
}

#[tokio::test]
async fn health_reports_none_for_unknown_provider() {
    let app = app(ProviderSelection::Undetermined("gemini".into()), None);
    let (status, body) = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backendName"], "none");
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn chat_returns_generated_reply() {
    let app = app(ProviderSelection::Hosted, Some(Arc::new(Pong)));
    let (status, body) = send(
        app,
        post_chat("/api/chat", r#"{"message":"hi","conversationId":"c1"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({"message": "PONG", "conversationId": "c1"}));
}

#[tokio::test]
async fn numeric_conversation_id_is_echoed_as_string() {
    let app = app(ProviderSelection::Hosted, Some(Arc::new(Pong)));
    let (status, body) = send(
        app,
        post_chat("/chat", r#"{"message":"hi","conversationId":1718000000000}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conversationId"], "1718000000000");
}

#[tokio::test]
async fn backend_failure_returns_fallback_text() {
    let app = app(ProviderSelection::Hosted, Some(Arc::new(Failing)));
    let (status, body) = send(
        app,
        post_chat("/chat", r#"{"message":"hi","conversationId":"c1"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let text = body["message"].as_str().unwrap();
    assert!(text.contains("due to service error"), "{text}");
    assert_eq!(body["conversationId"], "c1");
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let app = app(ProviderSelection::Hosted, Some(Arc::new(Pong)));
    let (status, body) = send(
        app,
        post_chat("/chat", r#"{"message":"   ","conversationId":"c1"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_json_is_a_client_error() {
    let app = app(ProviderSelection::Hosted, Some(Arc::new(Pong)));
    let resp = app
        .oneshot(post_chat("/chat", "{\"message\":"))
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}
