use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Realtime connection failed: {0}")]
    Connect(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Realtime connection closed")]
    Closed,
}
