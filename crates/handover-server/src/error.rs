use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use handover_core::HandoverError;

// ---------------------------------------------------------------------------
// Internal sentinel for explicit 404 errors
// ---------------------------------------------------------------------------

/// Carries an explicit HTTP 404 through the `anyhow::Error` chain.
#[derive(Debug)]
struct NotFoundError(String);

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotFoundError {}

// ---------------------------------------------------------------------------
// AppError
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }
}

fn status_for(e: &HandoverError) -> StatusCode {
    match e {
        HandoverError::NotInitialized | HandoverError::UnknownFlag(_) => StatusCode::BAD_REQUEST,
        HandoverError::RecordNotFound(_) => StatusCode::NOT_FOUND,
        HandoverError::RecordClosed(_) | HandoverError::ActiveOrchestrationExists(_) => {
            StatusCode::CONFLICT
        }
        HandoverError::UnsupportedAction(_) => StatusCode::UNPROCESSABLE_ENTITY,
        HandoverError::Store(_)
        | HandoverError::Io(_)
        | HandoverError::Yaml(_)
        | HandoverError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(n) = self.0.downcast_ref::<NotFoundError>() {
            let body = serde_json::json!({ "error": n.0.clone() });
            return (StatusCode::NOT_FOUND, axum::Json(body)).into_response();
        }

        let status = self
            .0
            .downcast_ref::<HandoverError>()
            .map(status_for)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
