//! Predicates deciding when the primary bot reclaims a conversation.

use chrono::Duration;
use std::sync::Arc;

use crate::bus::DialogBus;
use crate::clock::Clock;
use crate::config::TakeBackConfig;
use crate::record::OrchestrationRecord;

pub trait TakeBackPredicate: Send + Sync {
    fn should_take_back(&self, bus: &dyn DialogBus, record: &OrchestrationRecord) -> bool;
}

/// Never reclaim; only stop intents and failures end an orchestration.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverTakeBack;

impl TakeBackPredicate for NeverTakeBack {
    fn should_take_back(&self, _bus: &dyn DialogBus, _record: &OrchestrationRecord) -> bool {
        false
    }
}

/// Reclaim when the user comes back after more than `after` of silence.
///
/// The reference point is the user's previous action; without one, the
/// record's last update is used.
pub struct InactivityTakeBack {
    after: Duration,
    clock: Arc<dyn Clock>,
}

impl InactivityTakeBack {
    pub fn with_clock(after: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { after, clock }
    }
}

impl TakeBackPredicate for InactivityTakeBack {
    fn should_take_back(&self, bus: &dyn DialogBus, record: &OrchestrationRecord) -> bool {
        let last = bus.last_user_action_at().unwrap_or(record.updated_at);
        self.clock.now() - last > self.after
    }
}

/// Build the predicate described by the config.
pub fn from_config(config: &TakeBackConfig, clock: Arc<dyn Clock>) -> Arc<dyn TakeBackPredicate> {
    match config {
        TakeBackConfig::Inactivity { after_minutes } => Arc::new(InactivityTakeBack::with_clock(
            Duration::minutes(i64::from(*after_minutes)),
            clock,
        )),
        TakeBackConfig::Never => Arc::new(NeverTakeBack),
    }
}
