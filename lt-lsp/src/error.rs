//! Errors raised while talking to a LanguageTool service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service is not running")]
    NotRunning,
    #[error("failed to start service: {0}")]
    Start(String),
    #[error("invalid service url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },
    #[error("could not serialize annotated text: {0}")]
    Payload(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
