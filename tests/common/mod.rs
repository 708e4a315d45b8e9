#![allow(dead_code)]

//! Throwaway upstream for integration tests.
//!
//! One axum server plays three parts: the OpenAI-compatible chat API under
//! `/openai/v1`, an image host under `/images`, and a Home Assistant REST API
//! under `/api`.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const API_KEY: &str = "gsk_test";
pub const HA_TOKEN: &str = "ha_token";
pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
pub const CAMERA_JPEG: &[u8] = &[0xFF, 0xD8, 0x01, 0x02, 0x03];

#[derive(Debug, Clone)]
pub struct RecordedChat {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedService {
    pub domain: String,
    pub service: String,
    pub data: Value,
}

#[derive(Clone)]
struct UpstreamState {
    reply: Arc<Mutex<(u16, String)>>,
    delay: Arc<Mutex<Duration>>,
    chats: Arc<Mutex<Vec<RecordedChat>>>,
    services: Arc<Mutex<Vec<RecordedService>>>,
    states: Arc<Mutex<Vec<Value>>>,
}

pub struct FakeUpstream {
    pub addr: SocketAddr,
    pub base_url: String,
    state: UpstreamState,
}

/// A chat-completion body whose single choice says `content`
pub fn completion(content: &str) -> String {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

fn default_states() -> Vec<Value> {
    vec![
        json!({"entity_id": "light.living_room", "state": "off", "attributes": {"friendly_name": "Living Room"}}),
        json!({"entity_id": "sensor.outdoor_temp", "state": "31", "attributes": {"friendly_name": "Outdoor Temp"}}),
        json!({"entity_id": "lock.front_door", "state": "locked", "attributes": {"friendly_name": "Front Door Lock"}}),
        json!({"entity_id": "camera.front_door", "state": "idle", "attributes": {"friendly_name": "Cổng trước"}}),
        json!({"entity_id": "fan.bedroom", "state": "off", "attributes": {}}),
    ]
}

impl FakeUpstream {
    pub async fn start() -> Self {
        let state = UpstreamState {
            reply: Arc::new(Mutex::new((200, completion("Xin chào!")))),
            delay: Arc::new(Mutex::new(Duration::ZERO)),
            chats: Arc::new(Mutex::new(Vec::new())),
            services: Arc::new(Mutex::new(Vec::new())),
            states: Arc::new(Mutex::new(default_states())),
        };

        let app = Router::new()
            .route("/openai/v1/chat/completions", post(chat_completions))
            .route("/openai/v1/models", get(models))
            .route("/images/:name", get(image))
            .route("/api/states", get(all_states))
            .route("/api/states/:entity_id", get(one_state))
            .route("/api/services/:domain/:service", post(call_service))
            .route("/api/camera_proxy/:entity_id", get(camera_proxy))
            .with_state(state.clone());

        // Start server on random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        FakeUpstream {
            addr,
            base_url,
            state,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Root to configure as `llm.base_url`
    pub fn llm_base(&self) -> String {
        self.url("/openai/v1")
    }

    /// Answer the next chat completions with `content`
    pub fn reply_with(&self, content: &str) {
        *self.state.reply.lock().unwrap() = (200, completion(content));
    }

    /// Answer the next chat completions with a raw status and body
    pub fn fail_with(&self, status: u16, body: &str) {
        *self.state.reply.lock().unwrap() = (status, body.to_string());
    }

    /// Hold each chat completion for `delay` before answering
    pub fn stall_replies(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = delay;
    }

    pub fn set_states(&self, states: Vec<Value>) {
        *self.state.states.lock().unwrap() = states;
    }

    pub fn chat_requests(&self) -> Vec<RecordedChat> {
        self.state.chats.lock().unwrap().clone()
    }

    pub fn service_calls(&self) -> Vec<RecordedService> {
        self.state.services.lock().unwrap().clone()
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn authorized(headers: &HeaderMap, token: &str) -> bool {
    bearer(headers).as_deref() == Some(format!("Bearer {}", token).as_str())
}

async fn chat_completions(
    State(state): State<UpstreamState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.chats.lock().unwrap().push(RecordedChat {
        authorization: bearer(&headers),
        body,
    });
    let delay = *state.delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let (status, body) = state.reply.lock().unwrap().clone();
    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

async fn models(headers: HeaderMap) -> impl IntoResponse {
    if !authorized(&headers, API_KEY) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"message": "Invalid API Key"}})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "object": "list",
            "data": [
                {"id": "llama-3.3-70b-versatile", "object": "model"},
                {"id": "llama-3.2-90b-vision-preview", "object": "model"}
            ]
        })),
    )
}

async fn image(Path(name): Path<String>) -> impl IntoResponse {
    match name.as_str() {
        "cat.jpg" => (StatusCode::OK, JPEG.to_vec()),
        "empty.jpg" => (StatusCode::OK, Vec::new()),
        _ => (StatusCode::NOT_FOUND, b"not found".to_vec()),
    }
}

async fn all_states(State(state): State<UpstreamState>, headers: HeaderMap) -> impl IntoResponse {
    if !authorized(&headers, HA_TOKEN) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"})));
    }
    let states = state.states.lock().unwrap().clone();
    (StatusCode::OK, Json(Value::Array(states)))
}

async fn one_state(
    State(state): State<UpstreamState>,
    Path(entity_id): Path<String>,
) -> impl IntoResponse {
    let found = state
        .states
        .lock()
        .unwrap()
        .iter()
        .find(|s| s["entity_id"] == entity_id.as_str())
        .cloned();
    match found {
        Some(s) => (StatusCode::OK, Json(s)),
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "Entity not found."}))),
    }
}

async fn call_service(
    State(state): State<UpstreamState>,
    Path((domain, service)): Path<(String, String)>,
    headers: HeaderMap,
    Json(data): Json<Value>,
) -> impl IntoResponse {
    if !authorized(&headers, HA_TOKEN) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"})));
    }
    if domain == "lock" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Lock requires a code"})),
        );
    }
    state.services.lock().unwrap().push(RecordedService {
        domain,
        service,
        data,
    });
    (StatusCode::OK, Json(json!([])))
}

async fn camera_proxy(Path(entity_id): Path<String>) -> impl IntoResponse {
    if entity_id == "camera.front_door" {
        (StatusCode::OK, CAMERA_JPEG.to_vec())
    } else {
        (StatusCode::NOT_FOUND, Vec::new())
    }
}
