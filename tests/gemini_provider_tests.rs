use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Request, StatusCode},
    routing::post,
};
use chat_relay::message::ErrorBody;
use chat_relay::routes::create_router;
use chat_relay::services::gemini::GeminiProvider;
use chat_relay::services::provider::{GenerativeProvider, Part, ProviderError};
use chat_relay::services::relay::Models;
use chat_relay::state::AppState;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

#[derive(Clone, Debug)]
struct Captured {
    action: String,
    api_key: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct Stub {
    status: StatusCode,
    reply: Value,
    seen: Arc<Mutex<Vec<Captured>>>,
}

async fn generate_content(
    State(stub): State<Stub>,
    Path(action): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    stub.seen.lock().unwrap().push(Captured {
        action,
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    (stub.status, Json(stub.reply.clone()))
}

/// Serves `POST /v1beta/models/{model}:generateContent` and returns the base URL.
async fn spawn_stub(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let stub = Stub { status, reply, seen: seen.clone() };
    let app = Router::new()
        .route("/v1beta/models/{action}", post(generate_content))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/v1beta"), seen)
}

fn text_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn sends_model_path_key_header_and_inline_image() {
    let (base, seen) = spawn_stub(StatusCode::OK, text_reply("a tabby cat")).await;
    let provider = GeminiProvider::new(base, "secret-key", None).unwrap();

    let parts = vec![
        Part::Text("what is this?".into()),
        Part::InlineData { mime_type: "image/png".into(), data: "iVBORw==".into() },
    ];
    let reply = provider.generate("gemini-pro-vision", &parts).await.unwrap();
    assert_eq!(reply, "a tabby cat");

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].action, "gemini-pro-vision:generateContent");
    assert_eq!(seen[0].api_key.as_deref(), Some("secret-key"));
    assert_eq!(
        seen[0].body,
        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {"text": "what is this?"},
                    {"inline_data": {"mime_type": "image/png", "data": "iVBORw=="}}
                ]
            }]
        })
    );
}

#[tokio::test]
async fn text_prompt_is_a_single_part() {
    let (base, seen) = spawn_stub(StatusCode::OK, text_reply("hi")).await;
    let provider = GeminiProvider::new(format!("{base}/"), "k", None).unwrap();

    provider.generate("gemini-pro", &[Part::Text("hello".into())]).await.unwrap();

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen[0].action, "gemini-pro:generateContent");
    assert_eq!(seen[0].body["contents"][0]["parts"], json!([{"text": "hello"}]));
}

#[tokio::test]
async fn error_status_becomes_api_error() {
    for status in [StatusCode::BAD_REQUEST, StatusCode::SERVICE_UNAVAILABLE] {
        let (base, _) = spawn_stub(status, json!({"error": {"message": "nope"}})).await;
        let provider = GeminiProvider::new(base, "k", None).unwrap();

        let err = provider
            .generate("gemini-pro", &[Part::Text("hello".into())])
            .await
            .unwrap_err();
        match err {
            ProviderError::Api { status: got, body } => {
                assert_eq!(got, status.as_u16());
                assert!(body.contains("nope"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn upstream_failure_surfaces_as_opaque_500() {
    let (base, _) = spawn_stub(StatusCode::TOO_MANY_REQUESTS, json!({"error": "quota"})).await;
    let provider = GeminiProvider::new(base, "k", None).unwrap();
    let models = Models { text: "gemini-pro".into(), vision: "gemini-pro-vision".into() };
    let app = create_router(1024 * 1024, "public")
        .with_state(Arc::new(AppState::new(Arc::new(provider), models)));

    let boundary = "gemini-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"message\"\r\n\r\nhello\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.error, "internal server error");
}
