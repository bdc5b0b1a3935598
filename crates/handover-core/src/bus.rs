//! The dialog engine as seen from the orchestration hook.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::{SecondaryBotAction, UserAction};
use crate::types::{ConnectorType, ParticipantId};

/// Something the bot says to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BotMessage {
    /// Copy produced by the primary bot (announcements, apologies).
    Text { text: String },
    /// An action produced by a secondary bot, relayed verbatim.
    Relay {
        bot_id: String,
        action: SecondaryBotAction,
    },
}

impl BotMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// One inbound turn of the dialog engine.
///
/// The orchestration hook reads the turn through the accessors and talks
/// back to the user with `send` / `end`. `end` closes the bot's turn.
pub trait DialogBus: Send {
    fn participant(&self) -> &ParticipantId;
    fn connector(&self) -> &ConnectorType;
    /// Intent resolved by NLP for this turn, if any.
    fn intent(&self) -> Option<&str>;
    fn action(&self) -> &UserAction;
    fn application_id(&self) -> &str;
    fn recipient_id(&self) -> &str;
    /// When the user last spoke before this turn.
    fn last_user_action_at(&self) -> Option<DateTime<Utc>>;

    fn send(&mut self, message: BotMessage);
    fn end(&mut self, message: BotMessage);
    fn switch_story(&mut self, story: &str);
}

// ---------------------------------------------------------------------------
// TurnBus
// ---------------------------------------------------------------------------

/// Inbound side of a `TurnBus`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub participant: ParticipantId,
    pub connector: ConnectorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    pub action: UserAction,
    pub application_id: String,
    pub recipient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_user_action_at: Option<DateTime<Utc>>,
}

/// A `DialogBus` that buffers everything the hook emits so the caller can
/// deliver it afterwards.
#[derive(Debug, Clone)]
pub struct TurnBus {
    turn: Turn,
    messages: Vec<BotMessage>,
    ended: bool,
    switched_story: Option<String>,
}

impl TurnBus {
    pub fn new(turn: Turn) -> Self {
        Self {
            turn,
            messages: Vec::new(),
            ended: false,
            switched_story: None,
        }
    }

    pub fn turn(&self) -> &Turn {
        &self.turn
    }

    pub fn messages(&self) -> &[BotMessage] {
        &self.messages
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn switched_story(&self) -> Option<&str> {
        self.switched_story.as_deref()
    }

    pub fn into_parts(self) -> (Vec<BotMessage>, bool, Option<String>) {
        (self.messages, self.ended, self.switched_story)
    }
}

impl DialogBus for TurnBus {
    fn participant(&self) -> &ParticipantId {
        &self.turn.participant
    }

    fn connector(&self) -> &ConnectorType {
        &self.turn.connector
    }

    fn intent(&self) -> Option<&str> {
        self.turn.intent.as_deref()
    }

    fn action(&self) -> &UserAction {
        &self.turn.action
    }

    fn application_id(&self) -> &str {
        &self.turn.application_id
    }

    fn recipient_id(&self) -> &str {
        &self.turn.recipient_id
    }

    fn last_user_action_at(&self) -> Option<DateTime<Utc>> {
        self.turn.last_user_action_at
    }

    fn send(&mut self, message: BotMessage) {
        self.messages.push(message);
    }

    fn end(&mut self, message: BotMessage) {
        self.messages.push(message);
        self.ended = true;
    }

    fn switch_story(&mut self, story: &str) {
        self.switched_story = Some(story.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn() -> Turn {
        Turn {
            participant: "user-1".into(),
            connector: "web".into(),
            intent: Some("insurance".into()),
            action: UserAction::Sentence {
                text: "quote please".into(),
            },
            application_id: "app".into(),
            recipient_id: "primary".into(),
            last_user_action_at: None,
        }
    }

    #[test]
    fn turn_bus_buffers_messages_in_order() {
        let mut bus = TurnBus::new(turn());
        bus.send(BotMessage::text("one"));
        assert!(!bus.is_ended());
        bus.end(BotMessage::text("two"));
        assert!(bus.is_ended());
        assert_eq!(
            bus.messages(),
            &[BotMessage::text("one"), BotMessage::text("two")]
        );
    }

    #[test]
    fn turn_bus_records_story_switch() {
        let mut bus = TurnBus::new(turn());
        assert_eq!(bus.switched_story(), None);
        bus.switch_story("comeback");
        assert_eq!(bus.switched_story(), Some("comeback"));
        assert_eq!(bus.intent(), Some("insurance"));
    }

    #[test]
    fn turn_parses_without_optional_fields() {
        let json = r#"{
            "participant": "user-1",
            "connector": "web",
            "action": {"type": "sentence", "text": "hi"},
            "application_id": "app",
            "recipient_id": "primary"
        }"#;
        let turn: Turn = serde_json::from_str(json).unwrap();
        assert!(turn.intent.is_none());
        assert!(turn.last_user_action_at.is_none());
    }
}
