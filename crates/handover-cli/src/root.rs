use handover_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the project root.
///
/// `--root` / `HANDOVER_ROOT` wins; otherwise walk up from the current
/// directory to the first one holding `.handover/`, falling back to the
/// current directory.
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_root_from(&cwd).unwrap_or(cwd)
}

fn find_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(paths::HANDOVER_DIR).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn finds_handover_dir_from_subdirectory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".handover")).unwrap();
        let subdir = dir.path().join("bots/primary");
        std::fs::create_dir_all(&subdir).unwrap();

        assert_eq!(find_root_from(&subdir), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn no_handover_dir_finds_nothing() {
        let dir = TempDir::new().unwrap();
        assert_eq!(find_root_from(dir.path()), None);
    }
}
