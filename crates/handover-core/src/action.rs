//! Inbound user actions and the neutral action form exchanged with secondary bots.
//!
//! A `UserAction` is what the dialog engine hands us for the current turn.
//! A `SecondaryBotAction` is what travels to and from the orchestrator. Not
//! every user action has a secondary-bot form: locations and raw connector
//! events stay with the primary bot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::HandoverError;

// ---------------------------------------------------------------------------
// UserAction
// ---------------------------------------------------------------------------

/// What the user sent on this turn, after connector translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserAction {
    /// Free text.
    Sentence { text: String },
    /// A button / quick reply carrying an explicit intent.
    Choice {
        intent: String,
        #[serde(default)]
        parameters: BTreeMap<String, String>,
    },
    /// A file or media upload.
    Attachment { url: String, attachment_type: String },
    /// A shared position.
    Location { latitude: f64, longitude: f64 },
    /// A connector-level event (typing, read receipt, referral, ...).
    Event { name: String },
}

impl UserAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sentence { .. } => "sentence",
            Self::Choice { .. } => "choice",
            Self::Attachment { .. } => "attachment",
            Self::Location { .. } => "location",
            Self::Event { .. } => "event",
        }
    }
}

// ---------------------------------------------------------------------------
// SecondaryBotAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionPayload {
    Sentence { text: String },
    Choice {
        intent: String,
        #[serde(default)]
        parameters: BTreeMap<String, String>,
    },
    Attachment { url: String, attachment_type: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMetadata {
    /// Set by the secondary bot while it still holds the floor.
    #[serde(default)]
    pub orchestration_lock: bool,
    pub sent_at: DateTime<Utc>,
}

impl Default for ActionMetadata {
    fn default() -> Self {
        Self {
            orchestration_lock: false,
            sent_at: Utc::now(),
        }
    }
}

/// An action in the form understood by secondary bots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryBotAction {
    pub payload: ActionPayload,
    #[serde(default)]
    pub metadata: ActionMetadata,
}

impl SecondaryBotAction {
    pub fn sentence(text: impl Into<String>) -> Self {
        Self {
            payload: ActionPayload::Sentence { text: text.into() },
            metadata: ActionMetadata::default(),
        }
    }

    /// Builder-style setter for the lock flag.
    pub fn locked(mut self, lock: bool) -> Self {
        self.metadata.orchestration_lock = lock;
        self
    }

    /// Human-readable text of the action, if it has one.
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            ActionPayload::Sentence { text } => Some(text),
            _ => None,
        }
    }
}

impl TryFrom<&UserAction> for SecondaryBotAction {
    type Error = HandoverError;

    fn try_from(action: &UserAction) -> Result<Self, Self::Error> {
        let payload = match action {
            UserAction::Sentence { text } => ActionPayload::Sentence { text: text.clone() },
            UserAction::Choice { intent, parameters } => ActionPayload::Choice {
                intent: intent.clone(),
                parameters: parameters.clone(),
            },
            UserAction::Attachment {
                url,
                attachment_type,
            } => ActionPayload::Attachment {
                url: url.clone(),
                attachment_type: attachment_type.clone(),
            },
            UserAction::Location { .. } | UserAction::Event { .. } => {
                return Err(HandoverError::UnsupportedAction(action.kind().to_string()))
            }
        };
        Ok(Self {
            payload,
            metadata: ActionMetadata::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_converts_to_secondary_sentence() {
        let user = UserAction::Sentence {
            text: "I need a quote".into(),
        };
        let action = SecondaryBotAction::try_from(&user).unwrap();
        assert_eq!(action.text(), Some("I need a quote"));
        assert!(!action.metadata.orchestration_lock);
    }

    #[test]
    fn choice_keeps_intent_and_parameters() {
        let mut parameters = BTreeMap::new();
        parameters.insert("plan".to_string(), "gold".to_string());
        let user = UserAction::Choice {
            intent: "subscribe".into(),
            parameters: parameters.clone(),
        };
        let action = SecondaryBotAction::try_from(&user).unwrap();
        assert_eq!(
            action.payload,
            ActionPayload::Choice {
                intent: "subscribe".into(),
                parameters
            }
        );
    }

    #[test]
    fn location_and_events_are_unsupported() {
        let location = UserAction::Location {
            latitude: 48.85,
            longitude: 2.35,
        };
        let err = SecondaryBotAction::try_from(&location).unwrap_err();
        assert!(matches!(err, HandoverError::UnsupportedAction(ref k) if k == "location"));

        let event = UserAction::Event {
            name: "typing".into(),
        };
        assert!(SecondaryBotAction::try_from(&event).is_err());
    }

    #[test]
    fn missing_metadata_defaults_to_unlocked() {
        let json = r#"{"payload":{"type":"sentence","text":"hello"}}"#;
        let action: SecondaryBotAction = serde_json::from_str(json).unwrap();
        assert!(!action.metadata.orchestration_lock);
        assert_eq!(action.text(), Some("hello"));
    }
}
