//! Conversation orchestration between a caller and the realtime model.
//!
//! [`Conversation`] is a pure state machine: it consumes caller frames and
//! model events and returns the [`Action`]s to perform. It never touches a
//! socket, so the relay loop in `api_ws` stays a thin driver and every rule
//! here can be tested without a network.
//!
//! Rules it enforces:
//!
//! - at most one model response is requested at a time (`responding`);
//! - a tool result is returned as soon as the call's arguments are complete,
//!   but the follow-up `response.create` waits until the response that made
//!   the call is done;
//! - the conversation is done once an assistant message carries
//!   [`END_CONVERSATION_MARKER`]. The marker never reaches the caller.

use crate::sessions::ChatMessage;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use voicebot_llm::tools::dispatch;
use voicebot_llm::{
    system_prompt, ClientEvent, ServerEvent, SessionConfig, END_CONVERSATION_MARKER,
};
use voicebot_types::CustomerProfile;

/// Frames sent by the caller over `/wss/{call_id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind")]
pub enum CallerFrame {
    /// Base64 PCM16 audio.
    AudioData { data: String },
    /// The caller finished speaking.
    StopAudio,
    Text { text: String },
}

/// Frames sent to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum BotFrame {
    Text { text: String },
    AudioData { data: String },
    /// End of the call; the socket closes after this frame.
    StopAudio,
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ToCaller(BotFrame),
    ToLlm(ClientEvent),
}

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("invalid audio payload: {0}")]
    InvalidAudio(String),
}

pub struct Conversation {
    profile: CustomerProfile,
    history: Vec<ChatMessage>,
    /// Text of the response currently streaming.
    pending_text: String,
    responding: bool,
    /// A tool result was sent and the model must be asked to continue.
    continuation_due: bool,
    /// Function calls announced by the model, `call_id` to tool name.
    pending_calls: HashMap<String, String>,
    done: bool,
}

impl Conversation {
    pub fn new(profile: CustomerProfile) -> Self {
        Self {
            profile,
            history: Vec::new(),
            pending_text: String::new(),
            responding: false,
            continuation_due: false,
            pending_calls: HashMap::new(),
            done: false,
        }
    }

    /// Session configuration carrying this customer's instructions.
    pub fn session_config(&self, voice: &str) -> SessionConfig {
        SessionConfig::new(voice, system_prompt(&self.profile))
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn is_responding(&self) -> bool {
        self.responding
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn into_history(self) -> Vec<ChatMessage> {
        self.history
    }

    pub fn on_caller_frame(&mut self, frame: CallerFrame) -> Result<Vec<Action>, ConversationError> {
        let mut actions = Vec::new();
        if self.done {
            return Ok(actions);
        }

        match frame {
            CallerFrame::AudioData { data } => {
                if data.is_empty() {
                    return Ok(actions);
                }
                BASE64
                    .decode(data.as_bytes())
                    .map_err(|e| ConversationError::InvalidAudio(e.to_string()))?;
                actions.push(Action::ToLlm(ClientEvent::InputAudioBufferAppend {
                    audio: data,
                }));
            }
            CallerFrame::StopAudio => {
                actions.push(Action::ToLlm(ClientEvent::InputAudioBufferCommit));
                self.request_response(&mut actions);
            }
            CallerFrame::Text { text } => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(actions);
                }
                self.history.push(ChatMessage::user(text));
                actions.push(Action::ToLlm(ClientEvent::user_text(text)));
                self.request_response(&mut actions);
            }
        }
        Ok(actions)
    }

    pub fn on_llm_event(&mut self, event: ServerEvent) -> Vec<Action> {
        let mut actions = Vec::new();

        match event {
            ServerEvent::InputTranscriptionCompleted { transcript } => {
                let transcript = transcript.trim();
                if !transcript.is_empty() {
                    tracing::debug!(chars = transcript.len(), "caller speech transcribed");
                    self.history.push(ChatMessage::user(transcript));
                    self.request_response(&mut actions);
                }
            }
            ServerEvent::AudioDelta { delta } => {
                actions.push(Action::ToCaller(BotFrame::AudioData { data: delta }));
            }
            ServerEvent::TextDelta { delta } | ServerEvent::AudioTranscriptDelta { delta } => {
                self.pending_text.push_str(&delta);
            }
            ServerEvent::ResponseCreated => {
                self.responding = true;
            }
            ServerEvent::ResponseDone => {
                self.responding = false;
                self.finish_response(&mut actions);
                if self.continuation_due && !self.done {
                    self.continuation_due = false;
                    self.request_response(&mut actions);
                }
            }
            ServerEvent::OutputItemAdded { item } => {
                if item.is_function_call() {
                    if let (Some(call_id), Some(name)) = (item.call_id, item.name) {
                        self.pending_calls.insert(call_id, name);
                    }
                }
            }
            ServerEvent::FunctionCallArgumentsDone { call_id, arguments } => {
                match self.pending_calls.remove(&call_id) {
                    Some(name) => {
                        let output = dispatch(&name, &arguments, &self.profile);
                        tracing::info!(tool = %name, call_id = %call_id, "tool call answered");
                        actions.push(Action::ToLlm(ClientEvent::function_output(call_id, output)));
                        self.continuation_due = true;
                    }
                    None => {
                        tracing::warn!(call_id = %call_id, "arguments for an unannounced function call");
                    }
                }
            }
            ServerEvent::Error { error } => {
                tracing::warn!(
                    kind = error.kind.as_deref().unwrap_or("unknown"),
                    code = error.code.as_deref().unwrap_or(""),
                    "realtime error: {}",
                    error.message
                );
            }
            ServerEvent::SessionCreated | ServerEvent::SessionUpdated => {
                tracing::debug!("realtime session ready");
            }
            ServerEvent::Other => {}
        }

        actions
    }

    fn request_response(&mut self, actions: &mut Vec<Action>) {
        if self.responding {
            return;
        }
        self.responding = true;
        actions.push(Action::ToLlm(ClientEvent::ResponseCreate));
    }

    fn finish_response(&mut self, actions: &mut Vec<Action>) {
        let text = std::mem::take(&mut self.pending_text);
        if text.trim().is_empty() {
            return;
        }

        if text.contains(END_CONVERSATION_MARKER) {
            self.done = true;
        }
        let spoken = text.replace(END_CONVERSATION_MARKER, "").trim().to_string();
        if spoken.is_empty() {
            return;
        }
        self.history.push(ChatMessage::assistant(spoken.clone()));
        actions.push(Action::ToCaller(BotFrame::Text { text: spoken }));
    }
}
