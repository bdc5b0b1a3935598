//! Persistent storage for orchestration records and session flags using redb.
//!
//! # Table design
//!
//! ```text
//! RECORDS  uuid bytes (16)              -> JSON OrchestrationRecord
//! ACTIVE   participant id               -> uuid bytes of the active record
//! FLAGS    participant id 0x1f flag key -> JSON FlagValue
//! ```
//!
//! `ACTIVE` is the uniqueness index: a participant has an entry iff it has
//! an active record. redb serializes write transactions, and every mutating
//! operation reads and writes both tables inside one transaction, so
//! find-or-create and append are atomic.

use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use redb::{Database, ReadableTable, TableDefinition};
use uuid::Uuid;

use crate::action::SecondaryBotAction;
use crate::clock::{Clock, SystemClock};
use crate::error::{HandoverError, Result};
use crate::flags::{FlagStore, FlagValue, SessionFlag};
use crate::record::OrchestrationRecord;
use crate::types::ParticipantId;

use super::RecordStore;

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

const RECORDS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("records");
const ACTIVE: TableDefinition<&str, &[u8]> = TableDefinition::new("active");
const FLAGS: TableDefinition<&str, &[u8]> = TableDefinition::new("flags");

// ---------------------------------------------------------------------------
// Key helpers
// ---------------------------------------------------------------------------

fn flag_key(participant: &ParticipantId, flag: SessionFlag) -> String {
    format!("{}\u{1f}{}", participant.as_str(), flag.as_str())
}

fn db_err(e: impl std::fmt::Display) -> HandoverError {
    HandoverError::Store(e.to_string())
}

fn decode_record(bytes: &[u8]) -> Result<OrchestrationRecord> {
    serde_json::from_slice(bytes).map_err(db_err)
}

fn decode_id(bytes: &[u8]) -> Result<Uuid> {
    Uuid::from_slice(bytes).map_err(db_err)
}

// ---------------------------------------------------------------------------
// RedbStore
// ---------------------------------------------------------------------------

/// Persistent store for `OrchestrationRecord`s and session flags.
pub struct RedbStore {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl RedbStore {
    /// Open or create the redb database at `path`.
    ///
    /// Creates all tables if they don't already exist.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    pub fn open_with_clock(path: &Path, clock: Arc<dyn Clock>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;
        // Ensure the tables exist before any reads
        let wt = db.begin_write().map_err(db_err)?;
        wt.open_table(RECORDS).map_err(db_err)?;
        wt.open_table(ACTIVE).map_err(db_err)?;
        wt.open_table(FLAGS).map_err(db_err)?;
        wt.commit().map_err(db_err)?;
        Ok(Self { db, clock })
    }

    /// Every active record, oldest first.
    pub fn list_active(&self) -> Result<Vec<OrchestrationRecord>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let active = rt.open_table(ACTIVE).map_err(db_err)?;
        let records = rt.open_table(RECORDS).map_err(db_err)?;

        let mut result = Vec::new();
        for entry in active.iter().map_err(db_err)? {
            let (_, id) = entry.map_err(db_err)?;
            if let Some(v) = records.get(id.value()).map_err(db_err)? {
                result.push(decode_record(v.value())?);
            }
        }
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }

    /// Drop every expired flag. Returns the number removed.
    pub fn purge_expired_flags(&self) -> Result<u32> {
        let now = self.clock.now();
        let wt = self.db.begin_write().map_err(db_err)?;
        let mut count = 0u32;
        {
            let mut table = wt.open_table(FLAGS).map_err(db_err)?;
            let mut expired = Vec::new();
            for entry in table.iter().map_err(db_err)? {
                let (k, v) = entry.map_err(db_err)?;
                let stored: FlagValue = serde_json::from_slice(v.value()).map_err(db_err)?;
                if stored.is_expired(now) {
                    expired.push(k.value().to_string());
                }
            }
            for key in expired {
                table.remove(key.as_str()).map_err(db_err)?;
                count += 1;
            }
        }
        wt.commit().map_err(db_err)?;
        Ok(count)
    }
}

impl RecordStore for RedbStore {
    fn create(&self, record: &OrchestrationRecord) -> Result<()> {
        let value = serde_json::to_vec(record).map_err(db_err)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut active = wt.open_table(ACTIVE).map_err(db_err)?;
            let taken = active
                .get(record.participant.as_str())
                .map_err(db_err)?
                .is_some();
            if taken {
                return Err(HandoverError::ActiveOrchestrationExists(
                    record.participant.to_string(),
                ));
            }
            if record.is_active() {
                active
                    .insert(record.participant.as_str(), record.id.as_bytes().as_slice())
                    .map_err(db_err)?;
            }
            let mut records = wt.open_table(RECORDS).map_err(db_err)?;
            records
                .insert(record.id.as_bytes().as_slice(), value.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    fn get(&self, participant: &ParticipantId) -> Result<Option<OrchestrationRecord>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let active = rt.open_table(ACTIVE).map_err(db_err)?;
        let Some(id) = active.get(participant.as_str()).map_err(db_err)? else {
            return Ok(None);
        };
        let records = rt.open_table(RECORDS).map_err(db_err)?;
        let record = match records.get(id.value()).map_err(db_err)? {
            Some(v) => Some(decode_record(v.value())?),
            None => None,
        };
        Ok(record)
    }

    fn append(&self, id: Uuid, actions: &[SecondaryBotAction]) -> Result<OrchestrationRecord> {
        let now = self.clock.now();
        let wt = self.db.begin_write().map_err(db_err)?;
        let record = {
            let mut records = wt.open_table(RECORDS).map_err(db_err)?;
            let existing = records
                .get(id.as_bytes().as_slice())
                .map_err(db_err)?
                .map(|v| v.value().to_vec())
                .ok_or_else(|| HandoverError::RecordNotFound(id.to_string()))?;
            let mut record = decode_record(&existing)?;
            if !record.is_active() {
                return Err(HandoverError::RecordClosed(id.to_string()));
            }
            record.history.extend_from_slice(actions);
            record.updated_at = now;
            let value = serde_json::to_vec(&record).map_err(db_err)?;
            records
                .insert(id.as_bytes().as_slice(), value.as_slice())
                .map_err(db_err)?;
            record
        };
        wt.commit().map_err(db_err)?;
        Ok(record)
    }

    fn end(&self, participant: &ParticipantId) -> Result<usize> {
        let now = self.clock.now();
        let wt = self.db.begin_write().map_err(db_err)?;
        let closed = {
            let mut active = wt.open_table(ACTIVE).map_err(db_err)?;
            let removed = active
                .remove(participant.as_str())
                .map_err(db_err)?
                .map(|v| v.value().to_vec());
            match removed {
                None => 0,
                Some(id_bytes) => {
                    let mut records = wt.open_table(RECORDS).map_err(db_err)?;
                    let existing = records
                        .get(id_bytes.as_slice())
                        .map_err(db_err)?
                        .map(|v| v.value().to_vec());
                    match existing {
                        None => 0,
                        Some(bytes) => {
                            let mut record = decode_record(&bytes)?;
                            record.close(now);
                            let value = serde_json::to_vec(&record).map_err(db_err)?;
                            records
                                .insert(id_bytes.as_slice(), value.as_slice())
                                .map_err(db_err)?;
                            1
                        }
                    }
                }
            }
        };
        wt.commit().map_err(db_err)?;
        Ok(closed)
    }

    fn list(&self, participant: &ParticipantId) -> Result<Vec<OrchestrationRecord>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(RECORDS).map_err(db_err)?;

        let mut result = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (_, v) = entry.map_err(db_err)?;
            let record = decode_record(v.value())?;
            if &record.participant == participant {
                result.push(record);
            }
        }
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }
}

impl FlagStore for RedbStore {
    fn get(&self, participant: &ParticipantId, flag: SessionFlag) -> Result<Option<bool>> {
        let key = flag_key(participant, flag);
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(FLAGS).map_err(db_err)?;
        let Some(v) = table.get(key.as_str()).map_err(db_err)? else {
            return Ok(None);
        };
        let stored: FlagValue = serde_json::from_slice(v.value()).map_err(db_err)?;
        Ok(stored.live(self.clock.now()))
    }

    fn set(
        &self,
        participant: &ParticipantId,
        flag: SessionFlag,
        ttl: Duration,
        value: bool,
    ) -> Result<()> {
        let key = flag_key(participant, flag);
        let stored = FlagValue::new(value, self.clock.now(), ttl);
        let bytes = serde_json::to_vec(&stored).map_err(db_err)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(FLAGS).map_err(db_err)?;
            table
                .insert(key.as_str(), bytes.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    fn clear(&self, participant: &ParticipantId, flag: SessionFlag) -> Result<()> {
        let key = flag_key(participant, flag);
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(FLAGS).map_err(db_err)?;
            table.remove(key.as_str()).map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
