use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const HANDOVER_DIR: &str = ".handover";
pub const CONFIG_FILE: &str = ".handover/config.yaml";
pub const DB_FILE: &str = ".handover/orchestrations.redb";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn handover_dir(root: &Path) -> PathBuf {
    root.join(HANDOVER_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn db_path(root: &Path) -> PathBuf {
    root.join(DB_FILE)
}
