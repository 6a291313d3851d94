use super::*;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

#[derive(Debug)]
struct CapturedCall {
    action: String,
    api_key: Option<String>,
    body: serde_json::Value,
}

#[derive(Clone)]
struct ServerState {
    status: StatusCode,
    reply: String,
    tx: Arc<Mutex<Option<oneshot::Sender<CapturedCall>>>>,
}

async fn handle_generate(
    State(state): State<ServerState>,
    Path(action): Path<String>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, String) {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send(CapturedCall {
            action,
            api_key,
            body,
        });
    }
    (state.status, state.reply.clone())
}

async fn spawn_model_server(
    status: StatusCode,
    reply: impl Into<String>,
) -> anyhow::Result<(String, oneshot::Receiver<CapturedCall>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();
    let state = ServerState {
        status,
        reply: reply.into(),
        tx: Arc::new(Mutex::new(Some(tx))),
    };
    let app = Router::new()
        .route("/v1beta/models/:action", post(handle_generate))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), rx))
}

fn model_for(base_url: &str) -> GeminiModel {
    GeminiModel::new(base_url, "test-model", Client::new()).expect("model client")
}

#[test]
fn endpoint_targets_generate_content_for_model() {
    let model = GeminiModel::new(
        "https://generativelanguage.googleapis.com",
        "gemini-2.5-flash",
        Client::new(),
    )
    .expect("model client");
    assert_eq!(
        model.endpoint().as_str(),
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
    );
}

#[test]
fn base_url_path_is_kept_with_or_without_trailing_slash() {
    for base in ["https://proxy.internal/gemini", "https://proxy.internal/gemini/"] {
        let model = GeminiModel::new(base, "gemini-2.5-flash", Client::new()).expect("model client");
        assert_eq!(
            model.endpoint().as_str(),
            "https://proxy.internal/gemini/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}

#[test]
fn rejects_invalid_base_url() {
    assert!(GeminiModel::new("not a url", "m", Client::new()).is_err());
}

#[tokio::test]
async fn freeform_prompt_returns_candidate_text_and_sends_key_header() {
    let reply = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello "},{"text":"there"}]}}]}"#;
    let (base_url, call_rx) = spawn_model_server(StatusCode::OK, reply)
        .await
        .expect("spawn server");

    let text = model_for(&base_url)
        .complete("secret-key", &ModelPrompt::freeform("say hello"))
        .await
        .expect("complete");
    assert_eq!(text.as_deref(), Some("Hello there"));

    let call = call_rx.await.expect("captured call");
    assert_eq!(call.action, "test-model:generateContent");
    assert_eq!(call.api_key.as_deref(), Some("secret-key"));
    assert_eq!(call.body["contents"][0]["parts"][0]["text"], "say hello");
    assert!(call.body.get("generationConfig").is_none());
}

#[tokio::test]
async fn constrained_prompt_attaches_schema_and_mime_type() {
    let reply = r#"{"candidates":[{"content":{"parts":[{"text":"{\"matchIds\":[]}"}]}}]}"#;
    let (base_url, call_rx) = spawn_model_server(StatusCode::OK, reply)
        .await
        .expect("spawn server");

    let schema = shared::protocol::match_ids_schema();
    model_for(&base_url)
        .complete("k", &ModelPrompt::constrained("match", schema.clone()))
        .await
        .expect("complete");

    let call = call_rx.await.expect("captured call");
    let config = &call.body["generationConfig"];
    assert_eq!(config["responseMimeType"], "application/json");
    assert_eq!(config["responseSchema"], schema);
}

#[tokio::test]
async fn error_status_is_a_transport_error() {
    let (base_url, _call_rx) =
        spawn_model_server(StatusCode::SERVICE_UNAVAILABLE, "overloaded")
            .await
            .expect("spawn server");

    let err = model_for(&base_url)
        .complete("k", &ModelPrompt::freeform("hi"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, RemoteModelError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = model_for(&format!("http://{addr}"))
        .complete("k", &ModelPrompt::freeform("hi"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, RemoteModelError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn non_envelope_body_is_an_envelope_error() {
    let (base_url, _call_rx) = spawn_model_server(StatusCode::OK, "<html>oops</html>")
        .await
        .expect("spawn server");

    let err = model_for(&base_url)
        .complete("k", &ModelPrompt::freeform("hi"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, RemoteModelError::Envelope(_)), "got {err:?}");
}

#[tokio::test]
async fn missing_candidates_yield_no_text() {
    let (base_url, _call_rx) = spawn_model_server(StatusCode::OK, r#"{"candidates":[]}"#)
        .await
        .expect("spawn server");

    let text = model_for(&base_url)
        .complete("k", &ModelPrompt::freeform("hi"))
        .await
        .expect("complete");
    assert_eq!(text, None);
}
