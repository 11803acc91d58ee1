//! End-to-end tests for the relay's HTTP surface.
//!
//! The real router is driven with `tower::ServiceExt::oneshot`; the remote
//! assistant service is a local axum mock bound to an ephemeral port, so no
//! network egress or API key is needed.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header::CONTENT_TYPE},
    routing::{get, post},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use sleuth_relay::assistant::{AssistantsClient, PollOptions};
use sleuth_relay::config::Config;
use sleuth_relay::http::{AppState, router};
use sleuth_relay::relay::RelayService;

// ── Mock upstream ─────────────────────────────────────────────────────────────

#[derive(Clone)]
struct MockUpstream {
    run_status: &'static str,
    assistants_created: Arc<AtomicUsize>,
}

fn mock_router(state: MockUpstream) -> Router {
    Router::new()
        .route("/v1/assistants", post(mock_create_assistant))
        .route(
            "/v1/threads/{thread_id}/messages",
            post(mock_add_message).get(mock_list_messages),
        )
        .route("/v1/threads", post(mock_create_thread))
        .route("/v1/threads/{thread_id}/runs", post(mock_create_run))
        .route("/v1/threads/{thread_id}/runs/{run_id}", get(mock_retrieve_run))
        .with_state(state)
}

async fn mock_create_assistant(State(state): State<MockUpstream>) -> Json<Value> {
    state.assistants_created.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "id": "asst_mock", "object": "assistant" }))
}

async fn mock_create_thread() -> Json<Value> {
    Json(json!({ "id": "thread_mock", "object": "thread" }))
}

async fn mock_add_message() -> Json<Value> {
    Json(json!({ "id": "msg_user", "object": "thread.message" }))
}

async fn mock_create_run() -> Json<Value> {
    Json(json!({ "id": "run_mock", "object": "thread.run", "status": "queued" }))
}

async fn mock_retrieve_run(State(state): State<MockUpstream>) -> Json<Value> {
    Json(json!({ "id": "run_mock", "status": state.run_status }))
}

async fn mock_list_messages() -> Json<Value> {
    Json(json!({
        "object": "list",
        "data": [
            {
                "id": "msg_answer",
                "role": "assistant",
                "run_id": "run_mock",
                "created_at": 2,
                "content": [
                    { "type": "text", "text": { "value": "The butler did it.", "annotations": [] } }
                ]
            },
            {
                "id": "msg_question",
                "role": "user",
                "run_id": null,
                "created_at": 1,
                "content": [
                    { "type": "text", "text": { "value": "who did it?", "annotations": [] } }
                ]
            }
        ],
        "has_more": false
    }))
}

async fn start_mock(run_status: &'static str) -> (SocketAddr, Arc<AtomicUsize>) {
    let assistants_created = Arc::new(AtomicUsize::new(0));
    let state = MockUpstream {
        run_status,
        assistants_created: assistants_created.clone(),
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, mock_router(state)).await.unwrap();
    });
    (addr, assistants_created)
}

// ── Test helpers ──────────────────────────────────────────────────────────────

fn fast_poll() -> PollOptions {
    PollOptions {
        initial_interval: Duration::from_millis(10),
        max_interval: Duration::from_millis(50),
        deadline: Duration::from_secs(5),
    }
}

async fn test_app(run_status: &'static str) -> Router {
    let (addr, _) = start_mock(run_status).await;
    let client =
        AssistantsClient::new(format!("http://{addr}/v1"), 5, Some("test-key".into())).unwrap();
    let relay = RelayService::new(client, "asst_test".into(), fast_poll());
    router(AppState {
        bot_name: Arc::from("sleuth"),
        relay: Arc::new(relay),
    })
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ── /ask ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ask_returns_assistant_answer() {
    let app = test_app("completed").await;

    let response = app
        .oneshot(post_json("/ask", json!({ "question": "who did it?" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({ "response": "The butler did it." }));
}

#[tokio::test]
async fn failed_run_yields_null_response() {
    for status in ["failed", "cancelled", "expired"] {
        let app = test_app(status).await;

        let response = app
            .oneshot(post_json("/ask", json!({ "question": "who did it?" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "status {status}");
        let body = body_json(response).await;
        assert!(body["response"].is_null(), "status {status}: {body}");
    }
}

#[tokio::test]
async fn missing_question_is_rejected() {
    let app = test_app("completed").await;

    let response = app.oneshot(post_json("/ask", json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "question is required");
}

#[tokio::test]
async fn empty_question_is_rejected() {
    let app = test_app("completed").await;

    let response = app
        .oneshot(post_json("/ask", json!({ "question": "" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stuck_run_times_out_as_504() {
    let (addr, _) = start_mock("in_progress").await;
    let client =
        AssistantsClient::new(format!("http://{addr}/v1"), 5, Some("test-key".into())).unwrap();
    let poll = PollOptions {
        initial_interval: Duration::from_millis(10),
        max_interval: Duration::from_millis(20),
        deadline: Duration::from_millis(100),
    };
    let relay = RelayService::new(client, "asst_test".into(), poll);
    let app = router(AppState {
        bot_name: Arc::from("sleuth"),
        relay: Arc::new(relay),
    });

    let response = app
        .oneshot(post_json("/ask", json!({ "question": "who did it?" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "run timed out");
}

// ── /submitName ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_name_echoes_name_only() {
    let app = test_app("completed").await;

    let response = app
        .oneshot(post_json("/submitName", json!({ "name": "Ava" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    // The name and nothing else — in particular no credentials.
    assert_eq!(body, json!({ "name": "Ava" }));
}

#[tokio::test]
async fn submit_name_missing_is_rejected() {
    let app = test_app("completed").await;

    let response = app.oneshot(post_json("/submitName", json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "name is required");
}

#[tokio::test]
async fn submit_name_empty_is_rejected() {
    let app = test_app("completed").await;

    let response = app
        .oneshot(post_json("/submitName", json!({ "name": "" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ── Root & health ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn root_serves_greeting_page() {
    let app = test_app("completed").await;

    let response = app.oneshot(get_req("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Hello, Chat API"));
    assert!(html.contains("sleuth"));
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app("completed").await;

    let response = app.oneshot(get_req("/api/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({ "status": "ok" }));
}

// ── Assistant resolution ──────────────────────────────────────────────────────

#[tokio::test]
async fn assistant_is_created_once_per_process() {
    let (addr, created) = start_mock("completed").await;

    let mut config = Config::test_default();
    config.assistant.id = None;
    config.assistant.api_base_url = format!("http://{addr}/v1");
    config.api_key = Some("test-key".into());

    let relay = RelayService::from_config(&config).await.unwrap();
    assert_eq!(relay.assistant_id(), "asst_mock");
    assert_eq!(created.load(Ordering::SeqCst), 1);

    let app = router(AppState {
        bot_name: Arc::from("sleuth"),
        relay: Arc::new(relay),
    });

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json("/ask", json!({ "question": "who did it?" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Repeated /ask calls never re-create the assistant.
    assert_eq!(created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn configured_assistant_id_skips_creation() {
    let (addr, created) = start_mock("completed").await;

    let mut config = Config::test_default();
    config.assistant.id = Some("asst_pinned".into());
    config.assistant.api_base_url = format!("http://{addr}/v1");
    config.api_key = Some("test-key".into());

    let relay = RelayService::from_config(&config).await.unwrap();
    assert_eq!(relay.assistant_id(), "asst_pinned");
    assert_eq!(created.load(Ordering::SeqCst), 0);
}
