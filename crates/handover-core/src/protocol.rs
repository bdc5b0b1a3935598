//! Request and response bodies exchanged with the orchestrator.

use serde::{Deserialize, Serialize};

use crate::action::SecondaryBotAction;
use crate::record::{TargetBot, TargetMetadata};
use crate::types::{ConnectorType, ParticipantId};

/// Conversation context sent along with an eligibility query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub participant: ParticipantId,
    pub connector: ConnectorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

/// "Is any of these bots able to take this action?"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityRequest {
    pub eligible_bots: Vec<TargetBot>,
    pub session: SessionData,
    pub action: SecondaryBotAction,
    pub metadata: TargetMetadata,
}

/// "Continue the conversation with this bot."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRequest {
    pub target_bot: TargetBot,
    pub action: SecondaryBotAction,
    pub metadata: TargetMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestrationResponse {
    /// A secondary bot can take the conversation.
    Eligible {
        target_bot: TargetBot,
        score: f64,
        metadata: TargetMetadata,
    },
    /// The secondary bot answered.
    Available {
        target_bot: TargetBot,
        actions: Vec<SecondaryBotAction>,
        metadata: TargetMetadata,
    },
    /// No secondary bot wants the action.
    NoEligibleBot,
    /// The secondary bot could not answer.
    Unavailable {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_bot: Option<TargetBot>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl OrchestrationResponse {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Eligible { .. } => "eligible",
            Self::Available { .. } => "available",
            Self::NoEligibleBot => "no_eligible_bot",
            Self::Unavailable { .. } => "unavailable",
        }
    }
}
