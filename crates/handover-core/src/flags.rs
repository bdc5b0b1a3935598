//! Short-lived boolean flags scoped to a participant's session.
//!
//! Each flag has exactly one writer: the primary bot writes
//! `BlockHandoverToSecondaryBot`, the secondary bot writes
//! `BlockTakeOverFromPrimaryBot`. Every write carries a TTL so a writer that
//! crashes mid-session cannot wedge the conversation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use crate::clock::{Clock, SystemClock};
use crate::error::{HandoverError, Result};
use crate::types::ParticipantId;

// ---------------------------------------------------------------------------
// SessionFlag
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionFlag {
    /// Primary side: do not evaluate start-orchestration this turn.
    BlockHandoverToSecondaryBot,
    /// Secondary side: still answering, the primary bot must not pre-empt.
    BlockTakeOverFromPrimaryBot,
}

impl SessionFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BlockHandoverToSecondaryBot => "block_handover_to_secondary_bot",
            Self::BlockTakeOverFromPrimaryBot => "block_take_over_from_primary_bot",
        }
    }

    pub fn all() -> &'static [SessionFlag] {
        &[
            Self::BlockHandoverToSecondaryBot,
            Self::BlockTakeOverFromPrimaryBot,
        ]
    }
}

impl std::fmt::Display for SessionFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionFlag {
    type Err = HandoverError;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| HandoverError::UnknownFlag(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// FlagValue
// ---------------------------------------------------------------------------

/// A stored flag with its expiry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlagValue {
    pub value: bool,
    pub expires_at: DateTime<Utc>,
}

impl FlagValue {
    pub fn new(value: bool, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// The value as seen at `now`: `None` once the TTL has elapsed.
    pub fn live(&self, now: DateTime<Utc>) -> Option<bool> {
        (!self.is_expired(now)).then_some(self.value)
    }
}

// ---------------------------------------------------------------------------
// FlagStore
// ---------------------------------------------------------------------------

pub trait FlagStore: Send + Sync {
    /// Current value, or `None` if never set or expired.
    fn get(&self, participant: &ParticipantId, flag: SessionFlag) -> Result<Option<bool>>;

    /// Write a value that expires after `ttl`.
    fn set(
        &self,
        participant: &ParticipantId,
        flag: SessionFlag,
        ttl: Duration,
        value: bool,
    ) -> Result<()>;

    /// Remove the flag.
    fn clear(&self, participant: &ParticipantId, flag: SessionFlag) -> Result<()>;

    /// Absent and expired flags read as `false`.
    fn is_set(&self, participant: &ParticipantId, flag: SessionFlag) -> Result<bool> {
        Ok(self.get(participant, flag)?.unwrap_or(false))
    }
}

// ---------------------------------------------------------------------------
// MemoryFlagStore
// ---------------------------------------------------------------------------

/// Process-local flag store.
pub struct MemoryFlagStore {
    flags: Mutex<HashMap<(ParticipantId, SessionFlag), FlagValue>>,
    clock: Arc<dyn Clock>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            flags: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

impl Default for MemoryFlagStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self, participant: &ParticipantId, flag: SessionFlag) -> Result<Option<bool>> {
        let now = self.clock.now();
        let mut flags = self
            .flags
            .lock()
            .map_err(|e| HandoverError::Store(e.to_string()))?;
        let key = (participant.clone(), flag);
        match flags.get(&key).copied() {
            Some(stored) if stored.is_expired(now) => {
                flags.remove(&key);
                Ok(None)
            }
            Some(stored) => Ok(Some(stored.value)),
            None => Ok(None),
        }
    }

    fn set(
        &self,
        participant: &ParticipantId,
        flag: SessionFlag,
        ttl: Duration,
        value: bool,
    ) -> Result<()> {
        let stored = FlagValue::new(value, self.clock.now(), ttl);
        self.flags
            .lock()
            .map_err(|e| HandoverError::Store(e.to_string()))?
            .insert((participant.clone(), flag), stored);
        Ok(())
    }

    fn clear(&self, participant: &ParticipantId, flag: SessionFlag) -> Result<()> {
        self.flags
            .lock()
            .map_err(|e| HandoverError::Store(e.to_string()))?
            .remove(&(participant.clone(), flag));
        Ok(())
    }
}
