use axum::extract::State;
use axum::Json;
use serde::Serialize;

use handover_core::{BotMessage, Turn, TurnBus};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TurnResult {
    /// `continue` when the primary bot's own story should run.
    pub flow: &'static str,
    pub messages: Vec<BotMessage>,
    pub ended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switched_story: Option<String>,
}

/// POST /api/turns — run the orchestration hook for one inbound turn.
pub async fn handle_turn(
    State(app): State<AppState>,
    Json(turn): Json<Turn>,
) -> Result<Json<TurnResult>, AppError> {
    let participant = turn.participant.clone();
    let interceptor = app.interceptor.clone();
    let runtime = tokio::runtime::Handle::current();
    // The hook commits redb transactions between orchestrator calls, so the
    // whole turn runs on the blocking pool.
    let (flow, bus) = tokio::task::spawn_blocking(move || {
        let mut bus = TurnBus::new(turn);
        let flow = runtime.block_on(interceptor.intercept(&mut bus));
        flow.map(|flow| (flow, bus))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    tracing::debug!(%participant, flow = flow.as_str(), "turn handled");

    let (messages, ended, switched_story) = bus.into_parts();
    Ok(Json(TurnResult {
        flow: flow.as_str(),
        messages,
        ended,
        switched_story,
    }))
}
