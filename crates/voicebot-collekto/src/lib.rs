//! Collekto integration for the voicebot service.
//!
//! Collekto is the loan-servicing backend that holds the customer's loan
//! and call-disposition history. This crate provides:
//!
//! - [`CollektoClient`], the live HTTP client (AES-encrypted password
//!   login, then bearer-token requests for the loan and its case history);
//! - [`CollektoMock`], a deterministic stand-in backed by a CSV dataset;
//! - [`CustomerDataSource`], the seam the server depends on, and
//!   [`from_config`] which picks one of the two.
//!
//! With mock mode enabled the live client is never constructed, so no
//! request can reach the Collekto endpoint.

pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod mock;
pub mod source;

pub use client::CollektoClient;
pub use config::{CollektoConfig, DEFAULT_BASE_URL};
pub use crypto::{encrypt_password, DEFAULT_ENCRYPTION_KEY};
pub use error::CollektoError;
pub use mock::CollektoMock;
pub use source::{from_config, CustomerDataSource, SourceKind};
