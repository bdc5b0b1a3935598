//! The orchestration hook run before the primary bot's story handler.
//!
//! # Decision order
//!
//! ```text
//! handover blocked?            ── yes ──► Continue
//! active record?               ── yes ──► resume
//!   unlocked: stop intent      ──► close, on_stop
//!             no-orch intent   ──► close, on_no_orchestration
//!             take-back        ──► close, on_take_back
//!   unconvertible action       ──► close, "interrupted", Continue
//!   resume Available           ──► append + relay, Handled
//!   resume failed              ──► close, fallback story | apology + comeback, Handled
//! start intent and enabled?    ── yes ──► start
//!   eligible + Available       ──► create record, on_start, relay, Handled
//!   anything else              ──► Continue
//! otherwise                    ──► Continue
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::action::SecondaryBotAction;
use crate::bus::{BotMessage, DialogBus};
use crate::client::OrchestratorClient;
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, MessageTemplates, OrchestrationSettings};
use crate::error::{HandoverError, Result};
use crate::events::{DefaultEventHandler, EventOutcome, OrchestrationEventHandler};
use crate::flags::{FlagStore, SessionFlag};
use crate::protocol::{EligibilityRequest, OrchestrationResponse, ResumeRequest, SessionData};
use crate::record::{OrchestrationRecord, TargetBot, TargetMetadata};
use crate::store::RecordStore;
use crate::takeback::{self, TakeBackPredicate};
use crate::types::ParticipantId;

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

/// Result of the hook for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Let the dialog engine run its normal story handling.
    Continue,
    /// Orchestration fully handled the turn.
    Handled,
}

impl Flow {
    pub fn as_str(self) -> &'static str {
        match self {
            Flow::Continue => "continue",
            Flow::Handled => "handled",
        }
    }
}

impl From<EventOutcome> for Flow {
    fn from(outcome: EventOutcome) -> Self {
        match outcome {
            EventOutcome::ExecuteInitialStory => Flow::Continue,
            EventOutcome::DoNothingMore => Flow::Handled,
        }
    }
}

// ---------------------------------------------------------------------------
// OrchestrationInterceptor
// ---------------------------------------------------------------------------

pub struct OrchestrationInterceptor {
    settings: OrchestrationSettings,
    messages: MessageTemplates,
    store: Arc<dyn RecordStore>,
    flags: Arc<dyn FlagStore>,
    client: Arc<dyn OrchestratorClient>,
    events: Arc<dyn OrchestrationEventHandler>,
    take_back: Arc<dyn TakeBackPredicate>,
}

impl OrchestrationInterceptor {
    pub fn builder(
        config: &Config,
        store: Arc<dyn RecordStore>,
        flags: Arc<dyn FlagStore>,
        client: Arc<dyn OrchestratorClient>,
    ) -> InterceptorBuilder {
        InterceptorBuilder {
            settings: config.orchestration.clone(),
            messages: config.messages.clone(),
            store,
            flags,
            client,
            events: None,
            take_back: None,
            clock: None,
        }
    }

    /// Keep the primary bot in charge of `participant` for the configured TTL,
    /// e.g. while one of its own multi-turn stories is in progress.
    pub fn block_handover(&self, participant: &ParticipantId) -> Result<()> {
        self.flags.set(
            participant,
            SessionFlag::BlockHandoverToSecondaryBot,
            self.settings.flag_ttl(),
            true,
        )
    }

    pub fn release_handover(&self, participant: &ParticipantId) -> Result<()> {
        self.flags
            .clear(participant, SessionFlag::BlockHandoverToSecondaryBot)
    }

    /// Run the hook for the current turn.
    ///
    /// Orchestrator failures are absorbed into the returned `Flow`; only
    /// store errors are returned as `Err`.
    pub async fn intercept(&self, bus: &mut dyn DialogBus) -> Result<Flow> {
        let participant = bus.participant().clone();

        if self
            .flags
            .is_set(&participant, SessionFlag::BlockHandoverToSecondaryBot)?
        {
            debug!(%participant, "handover blocked for this session");
            return Ok(Flow::Continue);
        }

        if let Some(record) = self.store.get(&participant)? {
            return self.resume(bus, record).await;
        }

        let is_start_intent = bus
            .intent()
            .is_some_and(|intent| self.settings.is_start_intent(intent));
        if is_start_intent && self.settings.enabled {
            return self.start(bus).await;
        }

        Ok(Flow::Continue)
    }

    // -----------------------------------------------------------------------
    // start
    // -----------------------------------------------------------------------

    async fn start(&self, bus: &mut dyn DialogBus) -> Result<Flow> {
        let participant = bus.participant().clone();

        let action = match SecondaryBotAction::try_from(bus.action()) {
            Ok(action) => action,
            Err(e) => {
                debug!(%participant, error = %e, "not starting orchestration");
                return Ok(Flow::Continue);
            }
        };

        let eligible_bots = self.settings.eligible_bots_for(bus.connector()).to_vec();
        if eligible_bots.is_empty() {
            debug!(%participant, connector = %bus.connector(), "no secondary bot configured for connector");
            return Ok(Flow::Continue);
        }

        let metadata = target_metadata(bus);
        let request = EligibilityRequest {
            eligible_bots,
            session: SessionData {
                participant: participant.clone(),
                connector: bus.connector().clone(),
                intent: bus.intent().map(str::to_owned),
            },
            action: action.clone(),
            metadata: metadata.clone(),
        };

        let target_bot = match self.client.ask_orchestration(request).await {
            Ok(OrchestrationResponse::Eligible {
                target_bot, score, ..
            }) => {
                debug!(%participant, bot = %target_bot.bot_id, score, "secondary bot eligible");
                target_bot
            }
            Ok(other) => {
                info!(%participant, response = other.kind(), "no secondary bot eligible");
                return Ok(Flow::Continue);
            }
            Err(e) => {
                warn!(%participant, error = %e, "eligibility query failed");
                return Ok(Flow::Continue);
            }
        };

        let request = ResumeRequest {
            target_bot: target_bot.clone(),
            action,
            metadata: metadata.clone(),
        };
        let actions = match self.client.resume_orchestration(request).await {
            Ok(OrchestrationResponse::Available { actions, .. }) => actions,
            Ok(other) => {
                warn!(%participant, bot = %target_bot.bot_id, response = other.kind(), "secondary bot did not answer first turn");
                return Ok(Flow::Continue);
            }
            Err(e) => {
                warn!(%participant, bot = %target_bot.bot_id, error = %e, "first resume failed");
                return Ok(Flow::Continue);
            }
        };

        let record = OrchestrationRecord::new(metadata, target_bot, actions);
        self.store.create(&record)?;
        info!(%participant, bot = %record.target_bot.bot_id, record = %record.id, "orchestration started");

        self.events.on_start(bus, &record);
        relay(bus, &record.target_bot, &record.history);
        Ok(Flow::Handled)
    }

    // -----------------------------------------------------------------------
    // resume
    // -----------------------------------------------------------------------

    async fn resume(&self, bus: &mut dyn DialogBus, record: OrchestrationRecord) -> Result<Flow> {
        let participant = record.participant.clone();

        if record.is_locked() {
            debug!(%participant, bot = %record.target_bot.bot_id, "secondary bot holds the floor");
        } else if let Some(flow) = self.try_close(bus, &record)? {
            return Ok(flow);
        }

        let action = match SecondaryBotAction::try_from(bus.action()) {
            Ok(action) => action,
            Err(e) => {
                self.store.end(&participant)?;
                info!(%participant, bot = %record.target_bot.bot_id, error = %e, "orchestration interrupted");
                bus.send(BotMessage::text(
                    self.messages.interrupted(&record.target_bot.label),
                ));
                return Ok(Flow::Continue);
            }
        };

        let request = ResumeRequest {
            target_bot: record.target_bot.clone(),
            action,
            metadata: record.target_metadata.clone(),
        };
        match self.client.resume_orchestration(request).await {
            Ok(OrchestrationResponse::Available { actions, .. }) => {
                match self.store.append(record.id, &actions) {
                    Ok(_) => {}
                    Err(HandoverError::RecordClosed(_) | HandoverError::RecordNotFound(_)) => {
                        info!(%participant, bot = %record.target_bot.bot_id, "orchestration closed while resuming");
                    }
                    Err(e) => return Err(e),
                }
                debug!(%participant, bot = %record.target_bot.bot_id, count = actions.len(), "relaying secondary bot answer");
                relay(bus, &record.target_bot, &actions);
                Ok(Flow::Handled)
            }
            Ok(other) => {
                warn!(%participant, bot = %record.target_bot.bot_id, response = other.kind(), "secondary bot unavailable");
                self.fail_over(bus, &record)
            }
            Err(e) => {
                warn!(%participant, bot = %record.target_bot.bot_id, error = %e, "resume failed");
                self.fail_over(bus, &record)
            }
        }
    }

    /// Stop / no-orchestration / take-back checks. `Some` when the record
    /// was closed.
    fn try_close(
        &self,
        bus: &mut dyn DialogBus,
        record: &OrchestrationRecord,
    ) -> Result<Option<Flow>> {
        let intent = bus.intent().map(str::to_owned);

        if let Some(intent) = intent.as_deref() {
            if self.settings.is_stop_intent(intent) {
                self.store.end(&record.participant)?;
                info!(participant = %record.participant, intent, "orchestration stopped");
                return Ok(Some(self.events.on_stop(bus, record).into()));
            }
            if self.settings.is_no_orchestration_intent(intent) {
                self.store.end(&record.participant)?;
                info!(participant = %record.participant, intent, "orchestration left for primary intent");
                return Ok(Some(self.events.on_no_orchestration(bus, record).into()));
            }
        }

        if self.take_back.should_take_back(&*bus, record) {
            self.store.end(&record.participant)?;
            info!(participant = %record.participant, "orchestration taken back");
            return Ok(Some(self.events.on_take_back(bus, record).into()));
        }

        Ok(None)
    }

    fn fail_over(&self, bus: &mut dyn DialogBus, record: &OrchestrationRecord) -> Result<Flow> {
        self.store.end(&record.participant)?;
        match &record.target_bot.fallback_story {
            Some(story) => {
                info!(participant = %record.participant, story = story.as_str(), "switching to fallback story");
                bus.switch_story(story);
            }
            None => {
                bus.send(BotMessage::text(
                    self.messages.interrupted(&record.target_bot.label),
                ));
                bus.switch_story(&self.settings.comeback_story);
            }
        }
        Ok(Flow::Handled)
    }
}

fn target_metadata(bus: &dyn DialogBus) -> TargetMetadata {
    TargetMetadata {
        participant: bus.participant().clone(),
        connector: bus.connector().clone(),
        application_id: bus.application_id().to_string(),
        recipient_id: bus.recipient_id().to_string(),
    }
}

/// Forward secondary-bot actions in order; the last one ends the turn.
fn relay(bus: &mut dyn DialogBus, bot: &TargetBot, actions: &[SecondaryBotAction]) {
    let Some((last, rest)) = actions.split_last() else {
        return;
    };
    for action in rest {
        bus.send(BotMessage::Relay {
            bot_id: bot.bot_id.clone(),
            action: action.clone(),
        });
    }
    bus.end(BotMessage::Relay {
        bot_id: bot.bot_id.clone(),
        action: last.clone(),
    });
}

// ---------------------------------------------------------------------------
// InterceptorBuilder
// ---------------------------------------------------------------------------

pub struct InterceptorBuilder {
    settings: OrchestrationSettings,
    messages: MessageTemplates,
    store: Arc<dyn RecordStore>,
    flags: Arc<dyn FlagStore>,
    client: Arc<dyn OrchestratorClient>,
    events: Option<Arc<dyn OrchestrationEventHandler>>,
    take_back: Option<Arc<dyn TakeBackPredicate>>,
    clock: Option<Arc<dyn Clock>>,
}

impl InterceptorBuilder {
    /// Replace the default templated event handler.
    pub fn event_handler(mut self, events: Arc<dyn OrchestrationEventHandler>) -> Self {
        self.events = Some(events);
        self
    }

    /// Replace the take-back predicate built from `orchestration.take_back`.
    pub fn take_back(mut self, predicate: Arc<dyn TakeBackPredicate>) -> Self {
        self.take_back = Some(predicate);
        self
    }

    /// Clock used by the configured take-back predicate.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> OrchestrationInterceptor {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let take_back = self
            .take_back
            .unwrap_or_else(|| takeback::from_config(&self.settings.take_back, clock));
        let events = self.events.unwrap_or_else(|| {
            Arc::new(DefaultEventHandler::new(
                self.messages.clone(),
                self.settings.comeback_story.clone(),
            ))
        });
        OrchestrationInterceptor {
            settings: self.settings,
            messages: self.messages,
            store: self.store,
            flags: self.flags,
            client: self.client,
            events,
            take_back,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
