//! Voicebot server library logic.
//!
//! The HTTP front door (`/health`, `/start-call`, `/calls/{call_id}`), the
//! caller WebSocket (`/wss/{call_id}`) and the conversation orchestrator
//! that relays between a caller and the realtime model.

pub mod api;
pub mod api_ws;
pub mod background;
pub mod config;
pub mod conversation;
pub mod sessions;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use sessions::SessionStore;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use voicebot_collekto::CustomerDataSource;
use voicebot_llm::LlmConfig;

/// Maximum accepted request body.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Call sessions by id.
    pub sessions: SessionStore,
    /// Collekto client or its mock, chosen at startup.
    pub data_source: Arc<dyn CustomerDataSource>,
    /// Realtime endpoint settings used for every call.
    pub llm: LlmConfig,
}

impl AppState {
    pub fn new(data_source: Arc<dyn CustomerDataSource>, llm: LlmConfig) -> Self {
        Self {
            sessions: SessionStore::new(),
            data_source,
            llm,
        }
    }
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/start-call", post(api::start_call_handler))
        .route("/calls/{call_id}", get(api::get_call_handler))
        .route("/wss/{call_id}", get(api_ws::ws_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
