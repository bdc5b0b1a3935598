//! Lifecycle callbacks fired by the interceptor.
//!
//! Handlers produce the user-facing copy for a transition and decide whether
//! the primary bot's own story still runs on the turn that closed the
//! orchestration.

use crate::bus::{BotMessage, DialogBus};
use crate::config::MessageTemplates;
use crate::record::OrchestrationRecord;

/// What the interceptor does after a closing callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Let the story the primary bot resolved for this turn run.
    ExecuteInitialStory,
    /// The callback handled the turn.
    DoNothingMore,
}

pub trait OrchestrationEventHandler: Send + Sync {
    /// A secondary bot accepted the conversation. Called before its first
    /// answer is relayed.
    fn on_start(&self, bus: &mut dyn DialogBus, record: &OrchestrationRecord);

    /// The user asked to leave the secondary bot.
    fn on_stop(&self, bus: &mut dyn DialogBus, record: &OrchestrationRecord) -> EventOutcome;

    /// The user said something only the primary bot handles.
    fn on_no_orchestration(
        &self,
        bus: &mut dyn DialogBus,
        record: &OrchestrationRecord,
    ) -> EventOutcome;

    /// The primary bot reclaimed the conversation on its own.
    fn on_take_back(&self, bus: &mut dyn DialogBus, record: &OrchestrationRecord)
        -> EventOutcome;
}

/// Templated announcements; on stop, redirects to the comeback story.
#[derive(Debug, Clone)]
pub struct DefaultEventHandler {
    messages: MessageTemplates,
    comeback_story: String,
}

impl DefaultEventHandler {
    pub fn new(messages: MessageTemplates, comeback_story: impl Into<String>) -> Self {
        Self {
            messages,
            comeback_story: comeback_story.into(),
        }
    }
}

impl OrchestrationEventHandler for DefaultEventHandler {
    fn on_start(&self, bus: &mut dyn DialogBus, record: &OrchestrationRecord) {
        bus.send(BotMessage::text(
            self.messages.started(&record.target_bot.label),
        ));
    }

    fn on_stop(&self, bus: &mut dyn DialogBus, record: &OrchestrationRecord) -> EventOutcome {
        bus.send(BotMessage::text(self.messages.ended(&record.target_bot.label)));
        bus.switch_story(&self.comeback_story);
        EventOutcome::DoNothingMore
    }

    fn on_no_orchestration(
        &self,
        bus: &mut dyn DialogBus,
        record: &OrchestrationRecord,
    ) -> EventOutcome {
        bus.send(BotMessage::text(self.messages.ended(&record.target_bot.label)));
        EventOutcome::ExecuteInitialStory
    }

    fn on_take_back(
        &self,
        bus: &mut dyn DialogBus,
        record: &OrchestrationRecord,
    ) -> EventOutcome {
        bus.send(BotMessage::text(self.messages.ended(&record.target_bot.label)));
        EventOutcome::ExecuteInitialStory
    }
}
