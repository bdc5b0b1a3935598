//! The orchestration record: one handoff session between the primary bot and
//! a secondary bot for a single participant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::SecondaryBotAction;
use crate::types::{ConnectorType, ParticipantId};

// ---------------------------------------------------------------------------
// TargetBot / TargetMetadata
// ---------------------------------------------------------------------------

/// Descriptor of a secondary bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetBot {
    pub bot_id: String,
    /// Name shown to the user ("You are now talking with <label>").
    pub label: String,
    /// Story the primary bot switches to when this bot stops answering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_story: Option<String>,
}

impl TargetBot {
    pub fn new(bot_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            label: label.into(),
            fallback_story: None,
        }
    }

    pub fn with_fallback_story(mut self, story: impl Into<String>) -> Self {
        self.fallback_story = Some(story.into());
        self
    }
}

/// Addressing needed to route further messages through the target bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetMetadata {
    pub participant: ParticipantId,
    pub connector: ConnectorType,
    pub application_id: String,
    pub recipient_id: String,
}

// ---------------------------------------------------------------------------
// OrchestrationStatus
// ---------------------------------------------------------------------------

/// Transitions: `Active → Closed`. A closed record is never reopened; a new
/// handoff creates a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationStatus {
    Active,
    Closed,
}

impl OrchestrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for OrchestrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OrchestrationRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationRecord {
    pub id: Uuid,
    pub participant: ParticipantId,
    pub target_metadata: TargetMetadata,
    pub target_bot: TargetBot,
    pub status: OrchestrationStatus,
    /// Secondary-bot actions in the order they were returned. Append-only.
    pub history: Vec<SecondaryBotAction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl OrchestrationRecord {
    /// Create a new active record seeded with the secondary bot's first answer.
    pub fn new(
        target_metadata: TargetMetadata,
        target_bot: TargetBot,
        history: Vec<SecondaryBotAction>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            participant: target_metadata.participant.clone(),
            target_metadata,
            target_bot,
            status: OrchestrationStatus::Active,
            history,
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == OrchestrationStatus::Active
    }

    /// True while the secondary bot holds the floor, i.e. its most recent
    /// action was stamped with the orchestration lock.
    pub fn is_locked(&self) -> bool {
        self.history
            .last()
            .is_some_and(|a| a.metadata.orchestration_lock)
    }

    pub(crate) fn close(&mut self, at: DateTime<Utc>) {
        self.status = OrchestrationStatus::Closed;
        self.updated_at = at;
        self.closed_at = Some(at);
    }
}
