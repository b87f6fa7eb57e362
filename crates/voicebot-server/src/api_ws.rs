//! Caller WebSocket at `/wss/{call_id}`.
//!
//! Each accepted socket drives one [`Conversation`]: caller frames and
//! realtime events are fed to it from a single `select!` loop and the
//! resulting actions are written to the other side. Frames to the caller go
//! through a bounded channel drained by a dedicated send task.

use crate::api::{parse_call_id, ApiError};
use crate::conversation::{Action, BotFrame, CallerFrame, Conversation};
use crate::sessions::{AttachError, CallSession};
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path,
    },
    response::Response,
    Extension,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use voicebot_llm::{LlmError, RealtimeClient};
use voicebot_types::CallStatus;

const CALLER_CHANNEL_CAPACITY: usize = 256;

/// How long the send task gets to flush the last frames on shutdown.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Handler for `GET /wss/{call_id}`.
///
/// The session is claimed before the upgrade, so unknown calls get `404`
/// and calls that are running or over get `409` as plain HTTP responses.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(call_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let id = parse_call_id(&call_id)?;
    let session = state.sessions.attach(id).await.map_err(|e| match e {
        AttachError::NotFound => ApiError::NotFound(format!("call {}", call_id)),
        AttachError::Unavailable(status) => {
            ApiError::Conflict(format!("call {} is {}", call_id, status))
        }
    })?;

    let sessions = state.sessions.clone();
    Ok(ws
        .on_failed_upgrade(move |e| {
            tracing::warn!(call_id = %id, "websocket upgrade failed: {}", e);
            tokio::spawn(async move {
                sessions.finish(id, CallStatus::Failed, Vec::new()).await;
            });
        })
        .on_upgrade(move |socket| handle_call(socket, state, session)))
}

async fn handle_call(socket: WebSocket, state: Arc<AppState>, session: CallSession) {
    let call_id = session.call_id;
    tracing::info!(call_id = %call_id, loan_id = %session.request.loan_id, "caller connected");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<BotFrame>(CALLER_CHANNEL_CAPACITY);

    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let json = match serde_json::to_string(&frame) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("failed to serialize caller frame: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let mut conversation = Conversation::new(session.profile());
    let session_config = conversation.session_config(&state.llm.voice);

    let (status, history) = match RealtimeClient::connect(&state.llm, session_config).await {
        Ok(mut llm) => {
            let status = relay(&mut conversation, &mut llm, &mut receiver, &tx).await;
            llm.disconnect().await;
            (status, conversation.into_history())
        }
        Err(e) => {
            tracing::error!(call_id = %call_id, "failed to connect to realtime endpoint: {}", e);
            let _ = tx
                .send(BotFrame::Error {
                    message: "voice assistant is unavailable".to_string(),
                })
                .await;
            (CallStatus::Failed, Vec::new())
        }
    };

    drop(tx);
    if tokio::time::timeout(FLUSH_TIMEOUT, send_task).await.is_err() {
        tracing::debug!(call_id = %call_id, "caller send task did not flush in time");
    }

    state.sessions.finish(call_id, status, history).await;
    tracing::info!(call_id = %call_id, status = %status, "call ended");
}

/// Runs the call until the caller leaves, the model ends the conversation,
/// or the realtime link fails. Returns the call's final status.
async fn relay(
    conversation: &mut Conversation,
    llm: &mut RealtimeClient,
    receiver: &mut futures_util::stream::SplitStream<WebSocket>,
    tx: &mpsc::Sender<BotFrame>,
) -> CallStatus {
    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<CallerFrame>(text.as_str()) {
                        Ok(frame) => match conversation.on_caller_frame(frame) {
                            Ok(actions) => {
                                if apply(actions, llm, tx).await.is_err() {
                                    return CallStatus::Failed;
                                }
                            }
                            Err(e) => {
                                let _ = tx.send(BotFrame::Error { message: e.to_string() }).await;
                            }
                        },
                        Err(e) => {
                            tracing::debug!("unrecognised caller frame: {}", e);
                            let _ = tx
                                .send(BotFrame::Error {
                                    message: "unrecognised frame".to_string(),
                                })
                                .await;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => return CallStatus::Completed,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("caller socket error: {}", e);
                    return CallStatus::Completed;
                }
            },
            event = llm.next_event() => match event {
                Some(event) => {
                    let actions = conversation.on_llm_event(event);
                    if apply(actions, llm, tx).await.is_err() {
                        return CallStatus::Failed;
                    }
                }
                None => {
                    tracing::warn!("realtime connection closed mid-call");
                    let _ = tx
                        .send(BotFrame::Error {
                            message: "voice assistant disconnected".to_string(),
                        })
                        .await;
                    return CallStatus::Failed;
                }
            },
        }

        if conversation.is_done() {
            let _ = tx.send(BotFrame::StopAudio).await;
            return CallStatus::Completed;
        }
    }
}

async fn apply(
    actions: Vec<Action>,
    llm: &RealtimeClient,
    tx: &mpsc::Sender<BotFrame>,
) -> Result<(), LlmError> {
    for action in actions {
        match action {
            // A caller that has gone away is noticed by the receive side.
            Action::ToCaller(frame) => {
                let _ = tx.send(frame).await;
            }
            Action::ToLlm(event) => llm.send(event).await?,
        }
    }
    Ok(())
}
