pub mod config;
pub mod flag;
pub mod init;
pub mod record;
pub mod serve;

use anyhow::Context;
use handover_core::{paths, RedbStore};
use std::path::Path;

/// Open the project's store, failing if the project was never initialized.
pub(crate) fn open_store(root: &Path) -> anyhow::Result<RedbStore> {
    if !paths::handover_dir(root).is_dir() {
        return Err(handover_core::HandoverError::NotInitialized.into());
    }
    RedbStore::open(&paths::db_path(root)).context("failed to open orchestration store")
}
