use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandoverError {
    #[error("not initialized: run 'handover init'")]
    NotInitialized,

    #[error("orchestration record not found: {0}")]
    RecordNotFound(String),

    #[error("orchestration record is closed: {0}")]
    RecordClosed(String),

    #[error("participant already has an active orchestration: {0}")]
    ActiveOrchestrationExists(String),

    #[error("action cannot be forwarded to a secondary bot: {0}")]
    UnsupportedAction(String),

    #[error("unknown session flag: {0}")]
    UnknownFlag(String),

    #[error("store error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HandoverError>;

/// Failure of a call to the remote orchestrator.
///
/// Never fatal for a turn: the interceptor maps every variant onto its
/// fallback branches.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("orchestrator unreachable: {0}")]
    Transport(String),

    #[error("orchestrator returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("orchestrator did not answer within {0:?}")]
    Timeout(Duration),

    #[error("failed to decode orchestrator response: {0}")]
    Decode(String),
}
