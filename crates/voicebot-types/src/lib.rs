//! Shared types for the voicebot service.
//!
//! This crate holds the data shapes that cross crate boundaries: the
//! customer record returned by the Collekto backend (or its mock), the
//! resolved customer profile the conversation is built around, and the
//! lifecycle status of a call.
//!
//! Nothing here performs I/O. The Collekto, LLM and server crates all
//! depend on `voicebot-types` and on nothing else in the workspace for
//! cross-cutting definitions.

pub mod customer;

pub use customer::{
    CustomerProfile, CustomerRecord, ProfileFallback, DEBTOR_NAME, DPD, EMI_AMOUNT, GENDER,
    LOAN_ID, PAYMENT_DUE_DATE, PRODUCT, SYSTEM_ID,
};

use serde::{Deserialize, Serialize};

/// Lifecycle of a single outbound call.
///
/// A call is created by `POST /start-call` (`Initiated`), becomes
/// `InProgress` when the caller's WebSocket attaches, and ends as either
/// `Completed` or `Failed`. Ended calls cannot be re-attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallStatus {
    /// Session created, no caller attached yet.
    Initiated,
    /// A caller is connected and the conversation is running.
    InProgress,
    /// The conversation ended normally or the caller hung up.
    Completed,
    /// The conversation could not be started or was aborted by an error.
    Failed,
}

impl CallStatus {
    /// Returns the wire label for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initiated => "INITIATED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// Returns `true` once the call can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
