//! Lifecycle events published to `/api/events` subscribers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use handover_core::{DialogBus, EventOutcome, OrchestrationEventHandler, OrchestrationRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleKind {
    Started,
    Stopped,
    NoOrchestration,
    TakenBack,
}

impl LifecycleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::NoOrchestration => "no_orchestration",
            Self::TakenBack => "taken_back",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LifecycleEvent {
    pub kind: LifecycleKind,
    pub participant: String,
    pub bot_id: String,
    pub record_id: String,
    pub at: DateTime<Utc>,
}

impl LifecycleEvent {
    fn new(kind: LifecycleKind, record: &OrchestrationRecord) -> Self {
        Self {
            kind,
            participant: record.participant.to_string(),
            bot_id: record.target_bot.bot_id.clone(),
            record_id: record.id.to_string(),
            at: Utc::now(),
        }
    }
}

/// Wraps another handler and broadcasts every callback.
pub struct BroadcastingEventHandler {
    inner: Arc<dyn OrchestrationEventHandler>,
    tx: broadcast::Sender<LifecycleEvent>,
}

impl BroadcastingEventHandler {
    pub fn new(
        inner: Arc<dyn OrchestrationEventHandler>,
        tx: broadcast::Sender<LifecycleEvent>,
    ) -> Self {
        Self { inner, tx }
    }

    fn publish(&self, kind: LifecycleKind, record: &OrchestrationRecord) {
        // No subscribers is fine.
        let _ = self.tx.send(LifecycleEvent::new(kind, record));
    }
}

impl OrchestrationEventHandler for BroadcastingEventHandler {
    fn on_start(&self, bus: &mut dyn DialogBus, record: &OrchestrationRecord) {
        self.inner.on_start(bus, record);
        self.publish(LifecycleKind::Started, record);
    }

    fn on_stop(&self, bus: &mut dyn DialogBus, record: &OrchestrationRecord) -> EventOutcome {
        let outcome = self.inner.on_stop(bus, record);
        self.publish(LifecycleKind::Stopped, record);
        outcome
    }

    fn on_no_orchestration(
        &self,
        bus: &mut dyn DialogBus,
        record: &OrchestrationRecord,
    ) -> EventOutcome {
        let outcome = self.inner.on_no_orchestration(bus, record);
        self.publish(LifecycleKind::NoOrchestration, record);
        outcome
    }

    fn on_take_back(
        &self,
        bus: &mut dyn DialogBus,
        record: &OrchestrationRecord,
    ) -> EventOutcome {
        let outcome = self.inner.on_take_back(bus, record);
        self.publish(LifecycleKind::TakenBack, record);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handover_core::config::MessageTemplates;
    use handover_core::{
        DefaultEventHandler, SecondaryBotAction, TargetBot, TargetMetadata, Turn, TurnBus,
        UserAction,
    };

    fn record() -> OrchestrationRecord {
        OrchestrationRecord::new(
            TargetMetadata {
                participant: "user-1".into(),
                connector: "web".into(),
                application_id: "app".into(),
                recipient_id: "primary".into(),
            },
            TargetBot::new("insurance", "Insurance assistant"),
            vec![SecondaryBotAction::sentence("hello")],
        )
    }

    fn bus() -> TurnBus {
        TurnBus::new(Turn {
            participant: "user-1".into(),
            connector: "web".into(),
            intent: None,
            action: UserAction::Sentence { text: "hi".into() },
            application_id: "app".into(),
            recipient_id: "primary".into(),
            last_user_action_at: None,
        })
    }

    #[test]
    fn callbacks_are_broadcast_and_delegated() {
        let (tx, mut rx) = broadcast::channel(8);
        let handler = BroadcastingEventHandler::new(
            Arc::new(DefaultEventHandler::new(MessageTemplates::default(), "comeback")),
            tx,
        );
        let record = record();
        let mut bus = bus();

        handler.on_start(&mut bus, &record);
        let outcome = handler.on_stop(&mut bus, &record);

        assert_eq!(outcome, EventOutcome::DoNothingMore);
        assert_eq!(bus.messages().len(), 2);
        assert_eq!(bus.switched_story(), Some("comeback"));

        let started = rx.try_recv().unwrap();
        assert_eq!(started.kind, LifecycleKind::Started);
        assert_eq!(started.participant, "user-1");
        assert_eq!(started.bot_id, "insurance");
        assert_eq!(rx.try_recv().unwrap().kind, LifecycleKind::Stopped);
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let (tx, _) = broadcast::channel(8);
        let handler = BroadcastingEventHandler::new(
            Arc::new(DefaultEventHandler::new(MessageTemplates::default(), "comeback")),
            tx,
        );
        let outcome = handler.on_take_back(&mut bus(), &record());
        assert_eq!(outcome, EventOutcome::ExecuteInitialStory);
    }
}
