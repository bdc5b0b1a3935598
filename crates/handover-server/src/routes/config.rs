use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/config — the configuration the server was started with, plus
/// validation warnings.
///
/// The API token is never echoed back.
pub async fn get_config(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let mut config = (*app.config).clone();
    if config.orchestrator.api_token.is_some() {
        config.orchestrator.api_token = Some("***".to_string());
    }
    let warnings = app.config.validate();

    Ok(Json(serde_json::json!({
        "config": config,
        "warnings": warnings,
    })))
}
