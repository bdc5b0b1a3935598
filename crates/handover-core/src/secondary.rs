//! Secondary-bot side of the floor lock.
//!
//! A secondary bot that needs several uninterrupted turns (a form, a
//! payment) sets `BlockTakeOverFromPrimaryBot` for the participant. Every
//! action it sends back is stamped with the flag's current value, and the
//! primary bot skips its stop / take-back checks while the last stamped
//! action carries the lock.

use std::sync::Arc;

use chrono::Duration;
use tracing::debug;

use crate::action::SecondaryBotAction;
use crate::error::Result;
use crate::flags::{FlagStore, SessionFlag};
use crate::types::ParticipantId;

pub struct SecondaryResponseInterceptor {
    flags: Arc<dyn FlagStore>,
    ttl: Duration,
}

impl SecondaryResponseInterceptor {
    pub fn new(flags: Arc<dyn FlagStore>, ttl: Duration) -> Self {
        Self { flags, ttl }
    }

    /// Copy the participant's take-over block into the action metadata.
    pub fn stamp(&self, participant: &ParticipantId, action: &mut SecondaryBotAction) -> Result<()> {
        let locked = self
            .flags
            .is_set(participant, SessionFlag::BlockTakeOverFromPrimaryBot)?;
        action.metadata.orchestration_lock = locked;
        Ok(())
    }

    pub fn stamp_all(
        &self,
        participant: &ParticipantId,
        actions: &mut [SecondaryBotAction],
    ) -> Result<()> {
        let locked = self
            .flags
            .is_set(participant, SessionFlag::BlockTakeOverFromPrimaryBot)?;
        for action in actions.iter_mut() {
            action.metadata.orchestration_lock = locked;
        }
        debug!(%participant, locked, count = actions.len(), "stamped secondary actions");
        Ok(())
    }

    /// Keep the primary bot from reclaiming the conversation until
    /// `release_floor` or the TTL runs out.
    pub fn hold_floor(&self, participant: &ParticipantId) -> Result<()> {
        self.flags.set(
            participant,
            SessionFlag::BlockTakeOverFromPrimaryBot,
            self.ttl,
            true,
        )
    }

    pub fn release_floor(&self, participant: &ParticipantId) -> Result<()> {
        self.flags
            .clear(participant, SessionFlag::BlockTakeOverFromPrimaryBot)
    }
}
