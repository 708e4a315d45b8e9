mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::{FakeUpstream, API_KEY};
use groq_agent::adapters::health_handler::HealthHandler;
use groq_agent::agents::config::{AgentConfig, LlmProviderConfig};
use groq_agent::agents::image::ImageResolver;
use groq_agent::agents::llm::create_provider;
use groq_agent::agents::AgentHandler;
use groq_agent::devices::{EntityState, InMemoryDeviceRegistry};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

fn app(upstream: &FakeUpstream) -> (Router, Arc<InMemoryDeviceRegistry>) {
    let llm = LlmProviderConfig {
        base_url: upstream.llm_base(),
        ..Default::default()
    };
    let registry = Arc::new(
        InMemoryDeviceRegistry::new()
            .with_entity(EntityState::new("light.kitchen", "Đèn bếp", "off")),
    );
    let agent = Arc::new(AgentHandler::new(
        AgentConfig {
            api_key: API_KEY.to_string(),
            ..Default::default()
        },
        create_provider(&llm).unwrap(),
        registry.clone(),
        ImageResolver::new(&llm).unwrap(),
    ));
    let health_handler = Arc::new(HealthHandler::new(agent.clone()));
    (groq_agent::create_app(agent, health_handler), registry)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_conversation_endpoint_executes_command() {
    let upstream = FakeUpstream::start().await;
    upstream.reply_with(
        r#"{"domain":"light","service":"turn_on","target":["light.kitchen"],"response":"Đã bật đèn bếp."}"#,
    );
    let (app, registry) = app(&upstream);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/conversation",
            json!({ "text": "bật đèn bếp" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(
        body,
        json!({
            "speechText": "Đã bật đèn bếp.",
            "language": "vi",
            "commandExecuted": true,
            "imageAttached": false
        })
    );

    let calls = registry.service_calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].entity_ids(), vec!["light.kitchen".to_string()]);
}

#[tokio::test]
async fn test_conversation_endpoint_speaks_api_errors() {
    let upstream = FakeUpstream::start().await;
    upstream.fail_with(503, "over capacity");
    let (app, _) = app(&upstream);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/conversation",
            json!({ "text": "hello", "language": "en" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["speechText"], "Lỗi Groq (503): over capacity");
    assert_eq!(body["language"], "en");
}

#[tokio::test]
async fn test_models_endpoint() {
    let upstream = FakeUpstream::start().await;
    let (app, _) = app(&upstream);

    let request = Request::builder()
        .uri("/api/models")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0], "llama-3.3-70b-versatile");
}

#[tokio::test]
async fn test_agent_config_update() {
    let upstream = FakeUpstream::start().await;
    let (app, _) = app(&upstream);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/config/agent",
            json!({
                "model": "llama-3.1-8b-instant",
                "system_prompt": "Trả lời thật ngắn.",
                "selected_entities": ["light.kitchen"],
                "max_tokens": 256,
                "temperature": 0.2
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["api_key_set"], true);
    assert!(body["data"].get("api_key").is_none());

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/conversation",
            json!({ "text": "chào" }),
        ))
        .await
        .unwrap();

    let sent = &upstream.chat_requests()[0];
    assert_eq!(sent.authorization.as_deref(), Some("Bearer gsk_test"));
    assert_eq!(sent.body["model"], "llama-3.1-8b-instant");
    assert_eq!(sent.body["max_tokens"], 256);
    assert!(sent.body["messages"][0]["content"]
        .as_str()
        .unwrap()
        .starts_with("Trả lời thật ngắn.\n\n[Dữ liệu hiện tại]\nĐèn bếp (light.kitchen): off"));
}

#[tokio::test]
async fn test_agent_config_rejects_invalid_values() {
    let upstream = FakeUpstream::start().await;
    let (app, _) = app(&upstream);

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/config/agent",
            json!({ "model": "m", "max_tokens": 0, "temperature": 5.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_health_endpoints() {
    let upstream = FakeUpstream::start().await;
    let (app, _) = app(&upstream);

    for path in ["/health", "/health/ready", "/health/live"] {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", path);
    }
}
