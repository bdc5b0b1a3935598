use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::action::SecondaryBotAction;
use crate::clock::{Clock, SystemClock};
use crate::error::{HandoverError, Result};
use crate::record::OrchestrationRecord;
use crate::types::ParticipantId;

use super::RecordStore;

#[derive(Default)]
struct Inner {
    records: HashMap<Uuid, OrchestrationRecord>,
    active: HashMap<ParticipantId, Uuid>,
}

/// In-process record store. A single mutex covers both the records and the
/// active index, so every operation is atomic.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            clock,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| HandoverError::Store(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn create(&self, record: &OrchestrationRecord) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.active.contains_key(&record.participant) {
            return Err(HandoverError::ActiveOrchestrationExists(
                record.participant.to_string(),
            ));
        }
        if record.is_active() {
            inner.active.insert(record.participant.clone(), record.id);
        }
        inner.records.insert(record.id, record.clone());
        Ok(())
    }

    fn get(&self, participant: &ParticipantId) -> Result<Option<OrchestrationRecord>> {
        let inner = self.lock()?;
        Ok(inner
            .active
            .get(participant)
            .and_then(|id| inner.records.get(id))
            .cloned())
    }

    fn append(&self, id: Uuid, actions: &[SecondaryBotAction]) -> Result<OrchestrationRecord> {
        let now = self.clock.now();
        let mut inner = self.lock()?;
        let record = inner
            .records
            .get_mut(&id)
            .ok_or_else(|| HandoverError::RecordNotFound(id.to_string()))?;
        if !record.is_active() {
            return Err(HandoverError::RecordClosed(id.to_string()));
        }
        record.history.extend_from_slice(actions);
        record.updated_at = now;
        Ok(record.clone())
    }

    fn end(&self, participant: &ParticipantId) -> Result<usize> {
        let now = self.clock.now();
        let mut inner = self.lock()?;
        let Some(id) = inner.active.remove(participant) else {
            return Ok(0);
        };
        match inner.records.get_mut(&id) {
            Some(record) => {
                record.close(now);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn list(&self, participant: &ParticipantId) -> Result<Vec<OrchestrationRecord>> {
        let inner = self.lock()?;
        let mut records: Vec<_> = inner
            .records
            .values()
            .filter(|r| &r.participant == participant)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
