//! LLM client for the voicebot service.
//!
//! The conversation runs on the Azure OpenAI realtime API: a single
//! WebSocket per call carries caller audio up and model audio, transcripts
//! and tool calls back down. This crate owns everything about that link:
//!
//! - [`LlmConfig`] and the realtime URL derived from the endpoint;
//! - the session configuration sent on connect ([`SessionConfig`]);
//! - the wire events in both directions ([`ClientEvent`], [`ServerEvent`]);
//! - the system prompt rendered from a customer profile;
//! - the tools the model may call and their local implementations;
//! - [`RealtimeClient`], the transport.
//!
//! Deciding *what* to send and when is the orchestrator's job in
//! `voicebot-server`; this crate only marshals.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod prompt;
pub mod session;
pub mod tools;

pub use client::RealtimeClient;
pub use config::LlmConfig;
pub use error::LlmError;
pub use events::{
    ClientEvent, ContentPart, ConversationItem, ErrorDetail, OutputItem, Role, ServerEvent,
};
pub use prompt::{format_amount, system_prompt, END_CONVERSATION_MARKER};
pub use session::SessionConfig;
pub use tools::{ToolDefinition, CHECK_PAYMENT_STATUS};
