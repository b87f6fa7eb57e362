//! HTTP handlers for call setup and inspection.

use crate::sessions::{CallSession, DataSourceKind, StartCallRequest};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use voicebot_types::CustomerRecord;

/// Reported by `POST /start-call` once the call has been set up. The call's
/// own lifecycle is reported by `GET /calls/{call_id}`.
const INITIATE_STATUS: &str = "COMPLETED";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Parses a path call id. Malformed ids are reported as unknown calls.
pub(crate) fn parse_call_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("call {}", raw)))
}

/// Health check handler.
///
/// Returns `200 OK` with server status and version.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Serialize)]
pub struct StartCallResponse {
    pub call_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub status: &'static str,
    pub customer_name: String,
    pub system_id: String,
    pub loan_id: String,
    pub due_date: String,
    pub due_amount: f64,
    pub product: String,
    pub data_source: DataSourceKind,
    /// The request as received.
    pub initiate: StartCallRequest,
}

/// Handler for `POST /start-call`.
///
/// Looks up the customer in the configured data source and registers a
/// call session the caller can then attach to over `/wss/{call_id}`. A
/// failed lookup does not fail the request: the call proceeds on the
/// request fields alone.
pub async fn start_call_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<StartCallRequest>, JsonRejection>,
) -> Result<Json<StartCallResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(e.body_text()),
        _ => ApiError::BadRequest(e.body_text()),
    })?;
    request.validate().map_err(ApiError::BadRequest)?;

    let (metadata, data_source) = match state
        .data_source
        .fetch_customer(&request.loan_id, &request.system_id)
        .await
    {
        Ok(record) => (record, DataSourceKind::from(state.data_source.kind())),
        Err(e) => {
            tracing::warn!(
                loan_id = %request.loan_id,
                "customer lookup failed, continuing with request data: {}",
                e
            );
            (CustomerRecord::new(), DataSourceKind::Unavailable)
        }
    };

    let session = CallSession::new(request.clone(), metadata, data_source);
    let response = StartCallResponse {
        call_id: session.call_id,
        created_at: session.created_at,
        status: INITIATE_STATUS,
        customer_name: request.customer_name.clone(),
        system_id: request.system_id.clone(),
        loan_id: request.loan_id.clone(),
        due_date: request.due_date.clone(),
        due_amount: request.due_amount,
        product: request.product.clone(),
        data_source,
        initiate: request,
    };

    tracing::info!(
        call_id = %session.call_id,
        loan_id = %response.loan_id,
        data_source = ?data_source,
        fields = session.metadata.len(),
        "call initiated"
    );
    state.sessions.insert(session).await;

    Ok(Json(response))
}

/// Handler for `GET /calls/{call_id}`.
pub async fn get_call_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(call_id): Path<String>,
) -> Result<Json<CallSession>, ApiError> {
    let id = parse_call_id(&call_id)?;
    state
        .sessions
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("call {}", call_id)))
}
