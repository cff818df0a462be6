use thiserror::Error;

/// The body of a response did not match the shape we decode it into.
#[derive(Debug, Error)]
#[error("unexpected response shape from {endpoint}: {source}")]
pub struct DecodeError {
    pub endpoint: &'static str,
    #[source]
    pub source: serde_json::Error,
}

impl DecodeError {
    pub fn new(endpoint: &'static str, source: serde_json::Error) -> Self {
        Self { endpoint, source }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type Result<T> = std::result::Result<T, FetchError>;
