use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid orchestrator URL: {0}")]
    InvalidUrl(String),

    #[error("invalid API token: {0}")]
    InvalidToken(String),
}
