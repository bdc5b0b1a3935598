//! Persistence of orchestration records.
//!
//! Provides the `RecordStore` trait and two implementations: `MemoryStore`
//! for tests and single-process embedding, and `RedbStore` which persists
//! records (and session flags) in an embedded redb file.

pub mod memory;
pub mod redb_store;

use uuid::Uuid;

use crate::action::SecondaryBotAction;
use crate::error::Result;
use crate::record::OrchestrationRecord;
use crate::types::ParticipantId;

pub use self::memory::MemoryStore;
pub use self::redb_store::RedbStore;

/// Repository of orchestration records.
///
/// Implementations must make every method atomic: a concurrent `get` never
/// observes a half-applied `append`, and at most one active record exists
/// per participant.
pub trait RecordStore: Send + Sync {
    /// Insert a new active record. Fails with
    /// `HandoverError::ActiveOrchestrationExists` if the participant already
    /// has one.
    fn create(&self, record: &OrchestrationRecord) -> Result<()>;

    /// The participant's active record, if any.
    fn get(&self, participant: &ParticipantId) -> Result<Option<OrchestrationRecord>>;

    /// Append one secondary-bot turn to the history of the active record
    /// `id` and return the updated record. All of `actions` land together or
    /// none do; readers never see part of a turn.
    fn append(&self, id: Uuid, actions: &[SecondaryBotAction]) -> Result<OrchestrationRecord>;

    /// Append a single action.
    fn update(&self, id: Uuid, action: SecondaryBotAction) -> Result<OrchestrationRecord> {
        self.append(id, std::slice::from_ref(&action))
    }

    /// Close every active record of the participant. Returns how many were
    /// closed; closing nothing is not an error.
    fn end(&self, participant: &ParticipantId) -> Result<usize>;

    /// Every record of the participant, active or closed, newest first.
    fn list(&self, participant: &ParticipantId) -> Result<Vec<OrchestrationRecord>>;
}
