//! Drives `RealtimeClient` against a local fake realtime endpoint.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use voicebot_llm::{ClientEvent, LlmConfig, LlmError, RealtimeClient, ServerEvent, SessionConfig};

const API_KEY: &str = "test-api-key";

#[derive(Clone)]
struct FakeState {
    received: mpsc::UnboundedSender<Value>,
}

async fn realtime(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    State(state): State<FakeState>,
) -> Response {
    let authorized = headers
        .get("api-key")
        .map(|v| v.as_bytes() == API_KEY.as_bytes())
        .unwrap_or(false);
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if query.get("deployment").map(String::as_str) != Some("gpt-4o-realtime-preview") {
        return StatusCode::NOT_FOUND.into_response();
    }
    ws.on_upgrade(move |socket| fake_session(socket, state))
}

/// Replies to `session.update` with a short scripted turn, then echoes
/// every later client event back to the test through `received`.
async fn fake_session(mut socket: WebSocket, state: FakeState) {
    let script = [
        json!({ "type": "session.created", "event_id": "e1" }).to_string(),
        "this is not json".to_string(),
        json!({ "type": "rate_limits.updated", "rate_limits": [] }).to_string(),
        json!({ "type": "response.audio.delta", "delta": "AAEC" }).to_string(),
        json!({ "type": "response.audio_transcript.delta", "delta": "Namaste" }).to_string(),
        json!({ "type": "response.done", "response": {} }).to_string(),
    ];

    while let Some(Ok(msg)) = socket.recv().await {
        if let Message::Text(text) = msg {
            let value: Value = match serde_json::from_str(text.as_str()) {
                Ok(v) => v,
                Err(_) => continue,
            };
            let is_session_update = value["type"] == "session.update";
            let _ = state.received.send(value);
            if is_session_update {
                for frame in &script {
                    if socket
                        .send(Message::Text(frame.clone().into()))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
            }
        }
    }
}

async fn start_fake() -> (SocketAddr, mpsc::UnboundedReceiver<Value>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .route("/openai/realtime", get(realtime))
        .with_state(FakeState { received: tx });
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, rx)
}

async fn next_event(client: &mut RealtimeClient) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(5), client.next_event())
        .await
        .expect("timed out waiting for event")
        .expect("connection closed")
}

#[tokio::test]
async fn test_connect_sends_session_update_first_and_reads_events() {
    let (addr, mut received) = start_fake().await;
    let config = LlmConfig::new(format!("http://{}", addr), API_KEY);

    let mut client = RealtimeClient::connect(&config, SessionConfig::new("alloy", "hi"))
        .await
        .expect("connect should succeed");

    let first = received.recv().await.unwrap();
    assert_eq!(first["type"], "session.update");
    assert_eq!(first["session"]["voice"], "alloy");
    assert_eq!(first["session"]["instructions"], "hi");

    // Garbage and unmodelled events never reach the caller as errors.
    assert_eq!(next_event(&mut client).await, ServerEvent::SessionCreated);
    assert_eq!(next_event(&mut client).await, ServerEvent::Other);
    assert_eq!(
        next_event(&mut client).await,
        ServerEvent::AudioDelta {
            delta: "AAEC".into()
        }
    );
    assert_eq!(
        next_event(&mut client).await,
        ServerEvent::AudioTranscriptDelta {
            delta: "Namaste".into()
        }
    );
    assert_eq!(next_event(&mut client).await, ServerEvent::ResponseDone);

    client.disconnect().await;
}

#[tokio::test]
async fn test_send_forwards_client_events() {
    let (addr, mut received) = start_fake().await;
    let config = LlmConfig::new(format!("http://{}", addr), API_KEY);
    let client = RealtimeClient::connect(&config, SessionConfig::new("alloy", "hi"))
        .await
        .unwrap();

    client
        .send(ClientEvent::InputAudioBufferAppend {
            audio: "AAAA".into(),
        })
        .await
        .unwrap();
    client.send(ClientEvent::user_text("hello")).await.unwrap();
    client.send(ClientEvent::ResponseCreate).await.unwrap();

    let mut types = Vec::new();
    while types.len() < 4 {
        let value = tokio::time::timeout(Duration::from_secs(5), received.recv())
            .await
            .expect("timed out")
            .unwrap();
        types.push(value["type"].as_str().unwrap_or_default().to_string());
    }
    assert_eq!(
        types,
        vec![
            "session.update",
            "input_audio_buffer.append",
            "conversation.item.create",
            "response.create"
        ]
    );

    client.disconnect().await;
}

#[tokio::test]
async fn test_wrong_api_key_is_connect_error() {
    let (addr, _received) = start_fake().await;
    let config = LlmConfig::new(format!("http://{}", addr), "wrong-key");

    let result = RealtimeClient::connect(&config, SessionConfig::new("alloy", "hi")).await;
    assert!(matches!(result, Err(LlmError::Connect(_))), "got {:?}", result);
}

#[tokio::test]
async fn test_unconfigured_client_is_config_error() {
    let result = RealtimeClient::connect(&LlmConfig::default(), SessionConfig::new("alloy", "hi")).await;
    assert!(matches!(result, Err(LlmError::Config(_))), "got {:?}", result);
}
