//! The reqwest-backed gateway client against a local stand-in for the
//! completion service, plus the full stack from router to wire.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;

use scam_radar::analysis::{Analyzer, AnalyzerSettings};
use scam_radar::routes::{router, AppState};
use scam_radar::upstream::{ApiKey, ChatCompletionRequest, ChatMessage, CompletionClient, GatewayClient, Role};
use scam_radar::AnalysisError;

#[derive(Clone, Default)]
struct Captured {
    inner: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

#[derive(Clone)]
struct FakeGateway {
    captured: Captured,
    status: StatusCode,
    body: Value,
}

async fn handle_completion(
    State(gateway): State<FakeGateway>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    gateway
        .captured
        .inner
        .lock()
        .expect("capture mutex poisoned")
        .push((headers, body));
    (gateway.status, Json(gateway.body.clone()))
}

async fn spawn_gateway(status: StatusCode, body: Value) -> (String, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(handle_completion))
        .with_state(FakeGateway {
            captured: captured.clone(),
            status,
            body,
        });

    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind fake gateway");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake gateway");
    });

    (format!("http://{addr}/v1/chat/completions"), captured)
}

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
}

fn chat_request() -> ChatCompletionRequest {
    ChatCompletionRequest::new(
        "google/gemini-2.5-flash",
        vec![
            ChatMessage {
                role: Role::System,
                content: "rules".into(),
            },
            ChatMessage {
                role: Role::User,
                content: "Analyze this job posting:\n\nCashier".into(),
            },
        ],
    )
}

#[tokio::test]
async fn sends_bearer_token_and_json_body() {
    let (endpoint, captured) = spawn_gateway(StatusCode::OK, completion("{}")).await;
    let client = GatewayClient::new(&endpoint, Some(Duration::from_secs(5))).expect("client");
    let key = ApiKey::new("gw-secret").expect("key");

    let reply = client
        .complete(&key, &chat_request())
        .await
        .expect("gateway reachable");
    assert_eq!(reply.status, StatusCode::OK);

    let calls = captured.inner.lock().expect("capture mutex poisoned").clone();
    assert_eq!(calls.len(), 1);
    let (headers, body) = &calls[0];
    assert_eq!(
        headers.get("authorization").and_then(|v| v.to_str().ok()),
        Some("Bearer gw-secret")
    );
    assert_eq!(
        headers.get("content-type").and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    assert_eq!(body["model"], "google/gemini-2.5-flash");
    assert_eq!(body["response_format"], json!({ "type": "json_object" }));
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
}

#[tokio::test]
async fn error_statuses_are_returned_not_raised() {
    let (endpoint, _) = spawn_gateway(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "message": "slow down" } }),
    )
    .await;
    let client = GatewayClient::new(&endpoint, None).expect("client");
    let key = ApiKey::new("gw-secret").expect("key");

    let reply = client
        .complete(&key, &chat_request())
        .await
        .expect("gateway reachable");
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(reply.body.contains("slow down"));
}

/// Answers one request with `status_line` and a body shorter than its
/// declared length, then hangs up.
async fn spawn_truncating_gateway(status_line: &'static str) -> String {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind truncating gateway");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut request = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let read = socket.read(&mut chunk).await.expect("read request");
            if read == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..read]);
            if request_complete(&request) {
                break;
            }
        }
        let response = format!("HTTP/1.1 {status_line}\r\nContent-Length: 64\r\n\r\nshort");
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        socket.shutdown().await.ok();
    });

    format!("http://{addr}/v1/chat/completions")
}

fn request_complete(request: &[u8]) -> bool {
    let text = String::from_utf8_lossy(request);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..header_end]
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    request.len() >= header_end + 4 + content_length
}

#[tokio::test]
async fn truncated_error_bodies_keep_their_status() {
    let key = ApiKey::new("gw-secret").expect("key");

    let endpoint = spawn_truncating_gateway("429 Too Many Requests").await;
    let client = GatewayClient::new(&endpoint, None).expect("client");
    let reply = client
        .complete(&key, &chat_request())
        .await
        .expect("status survives a cut body");
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(matches!(
        reply.into_content(),
        Err(AnalysisError::UpstreamRateLimited)
    ));

    let endpoint = spawn_truncating_gateway("402 Payment Required").await;
    let client = GatewayClient::new(&endpoint, None).expect("client");
    let reply = client
        .complete(&key, &chat_request())
        .await
        .expect("status survives a cut body");
    assert!(matches!(
        reply.into_content(),
        Err(AnalysisError::UpstreamBillingRequired)
    ));
}

#[tokio::test]
async fn truncated_success_body_is_a_transport_error() {
    let endpoint = spawn_truncating_gateway("200 OK").await;
    let client = GatewayClient::new(&endpoint, None).expect("client");
    let key = ApiKey::new("gw-secret").expect("key");

    let err = client
        .complete(&key, &chat_request())
        .await
        .expect_err("cut success body");
    assert!(matches!(err, AnalysisError::UpstreamTransport(_)));
}

#[tokio::test]
async fn unreachable_gateway_is_a_transport_error() {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let client = GatewayClient::new(&format!("http://{addr}/v1/chat/completions"), None)
        .expect("client");
    let key = ApiKey::new("gw-secret").expect("key");

    let err = client
        .complete(&key, &chat_request())
        .await
        .expect_err("nothing listening");
    assert!(matches!(err, AnalysisError::UpstreamTransport(_)));
}

#[tokio::test]
async fn full_stack_scores_a_posting() {
    let (endpoint, captured) = spawn_gateway(
        StatusCode::OK,
        completion(r#"{"score":22,"explanation":"Asks for a fee","factors":["Upfront payment"]}"#),
    )
    .await;
    let client = GatewayClient::new(&endpoint, None).expect("client");
    let settings = AnalyzerSettings {
        api_key: ApiKey::new("gw-secret"),
        ..AnalyzerSettings::default()
    };
    let app = router(AppState::new(Analyzer::new(Arc::new(client), settings)));
    let posting = "Mystery shopper. Pay $50 for your training kit.";

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/analyze-job")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "jobDescription": posting }).to_string()))
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    let payload: Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(
        payload,
        json!({ "score": 22, "explanation": "Asks for a fee", "factors": ["Upfront payment"] })
    );

    let calls = captured.inner.lock().expect("capture mutex poisoned").clone();
    assert_eq!(calls.len(), 1);
    let user_content = calls[0].1["messages"][1]["content"]
        .as_str()
        .expect("user content")
        .to_string();
    assert!(user_content.ends_with(posting));
}
