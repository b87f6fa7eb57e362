//! In-memory call sessions.
//!
//! A session is created by `POST /start-call`, attached to at most one
//! caller WebSocket, and kept after it ends so its transcript can be read
//! back until the retention task evicts it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use voicebot_collekto::SourceKind;
use voicebot_llm::Role;
use voicebot_types::{CallStatus, CustomerProfile, CustomerRecord, ProfileFallback};

/// Where a session's customer data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    Collekto,
    Mock,
    /// The lookup failed; only the start-call request fields are known.
    Unavailable,
}

impl From<SourceKind> for DataSourceKind {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Collekto => DataSourceKind::Collekto,
            SourceKind::Mock => DataSourceKind::Mock,
        }
    }
}

/// One line of the call transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Body of `POST /start-call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartCallRequest {
    pub customer_name: String,
    pub system_id: String,
    pub loan_id: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub due_amount: f64,
    #[serde(default)]
    pub product: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountInput {
    Number(f64),
    Text(String),
}

/// Accepts `5175`, `5175.5` or `"5,175.50"`.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match AmountInput::deserialize(deserializer)? {
        AmountInput::Number(n) => Ok(n),
        AmountInput::Text(s) => s
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid due_amount: {:?}", s))),
    }
}

impl StartCallRequest {
    /// Returns a description of the first invalid field, if any.
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("customer_name", &self.customer_name),
            ("loan_id", &self.loan_id),
            ("system_id", &self.system_id),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{} must not be empty", field));
            }
        }
        if !self.due_amount.is_finite() || self.due_amount < 0.0 {
            return Err("due_amount must be a non-negative number".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CallSession {
    pub call_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub status: CallStatus,
    pub request: StartCallRequest,
    /// Business data returned by Collekto or the mock.
    pub metadata: CustomerRecord,
    pub data_source: DataSourceKind,
    pub transcript: Vec<ChatMessage>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl CallSession {
    pub fn new(
        request: StartCallRequest,
        metadata: CustomerRecord,
        data_source: DataSourceKind,
    ) -> Self {
        Self {
            call_id: Uuid::new_v4(),
            created_at: Utc::now(),
            status: CallStatus::Initiated,
            request,
            metadata,
            data_source,
            transcript: Vec::new(),
            ended_at: None,
        }
    }

    /// The customer profile for the conversation, backend data first.
    pub fn profile(&self) -> CustomerProfile {
        CustomerProfile::resolve(
            ProfileFallback {
                name: &self.request.customer_name,
                due_amount: self.request.due_amount,
                due_date: &self.request.due_date,
                product: &self.request.product,
            },
            &self.metadata,
        )
    }
}

/// Why a caller could not attach to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachError {
    NotFound,
    /// Already attached or ended.
    Unavailable(CallStatus),
}

/// Shared map of call sessions. Cloning shares the same map.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, CallSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: CallSession) {
        self.inner.write().await.insert(session.call_id, session);
    }

    pub async fn get(&self, call_id: Uuid) -> Option<CallSession> {
        self.inner.read().await.get(&call_id).cloned()
    }

    /// Claims an `Initiated` session for a caller, moving it to
    /// `InProgress`. The check and the transition happen under one lock.
    pub async fn attach(&self, call_id: Uuid) -> Result<CallSession, AttachError> {
        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(&call_id).ok_or(AttachError::NotFound)?;
        if session.status != CallStatus::Initiated {
            return Err(AttachError::Unavailable(session.status));
        }
        session.status = CallStatus::InProgress;
        Ok(session.clone())
    }

    /// Records the end of a call. Returns `false` if the session is gone.
    pub async fn finish(
        &self,
        call_id: Uuid,
        status: CallStatus,
        transcript: Vec<ChatMessage>,
    ) -> bool {
        let mut sessions = self.inner.write().await;
        match sessions.get_mut(&call_id) {
            Some(session) => {
                session.status = status;
                session.transcript = transcript;
                session.ended_at = Some(Utc::now());
                true
            }
            None => false,
        }
    }

    /// Removes terminal sessions whose `ended_at` is before `cutoff`.
    pub async fn evict_ended_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| {
            !(s.status.is_terminal() && matches!(s.ended_at, Some(ended) if ended < cutoff))
        });
        before - sessions.len()
    }
}
