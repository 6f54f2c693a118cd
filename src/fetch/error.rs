use reqwest::StatusCode;
use thiserror::Error;

/// The single failure kind a poll can produce.
///
/// The variants only record the cause for logging; reconciliation treats
/// them all the same.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned status {0}")]
    Status(StatusCode),
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}
