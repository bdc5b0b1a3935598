use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use handover_core::{ParticipantId, SecondaryBotAction};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StampBody {
    pub actions: Vec<SecondaryBotAction>,
}

#[derive(Deserialize)]
pub struct FloorBody {
    pub hold: bool,
}

/// POST /api/secondary/{participant}/stamp — set the orchestration lock on
/// outgoing secondary-bot actions from the participant's take-over block.
pub async fn stamp_actions(
    State(app): State<AppState>,
    Path(participant): Path<String>,
    Json(body): Json<StampBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let secondary = app.secondary.clone();
    let participant = ParticipantId::new(participant);
    let mut actions = body.actions;
    let actions = tokio::task::spawn_blocking(move || {
        secondary.stamp_all(&participant, &mut actions)?;
        Ok::<_, handover_core::HandoverError>(actions)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(serde_json::json!({ "actions": actions })))
}

/// PUT /api/secondary/{participant}/floor — hold or release the floor.
pub async fn put_floor(
    State(app): State<AppState>,
    Path(participant): Path<String>,
    Json(body): Json<FloorBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let secondary = app.secondary.clone();
    let participant = ParticipantId::new(participant);
    {
        let participant = participant.clone();
        tokio::task::spawn_blocking(move || {
            if body.hold {
                secondary.hold_floor(&participant)
            } else {
                secondary.release_floor(&participant)
            }
        })
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    }

    Ok(Json(serde_json::json!({
        "participant": participant,
        "hold": body.hold,
    })))
}
