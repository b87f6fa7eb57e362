use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollektoError {
    #[error("Collekto authentication failed: {0}")]
    Authentication(String),

    #[error("Collekto API error: {0}")]
    Api(String),

    #[error("Collekto network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("password encryption failed: {0}")]
    Crypto(String),

    #[error("mock data error: {0}")]
    MockData(String),
}
