//! Retention policy for the versions store.
//!
//! Keeps the N most recently modified version directories and deletes the
//! rest. Enforcement is best-effort: failures are recorded and logged, never
//! surfaced to the update caller.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// One immediate subdirectory of the versions store.
#[derive(Debug, Clone)]
pub(crate) struct VersionDirEntry {
    pub path: PathBuf,
    pub name: String,
    pub modified: SystemTime,
}

/// List non-hidden immediate subdirectories with their modification times.
/// Hidden (dot-prefixed) entries are extraction staging areas, not versions.
pub(crate) fn list_version_dirs(store: &Path) -> Vec<VersionDirEntry> {
    let entries = match fs::read_dir(store) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut dirs = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let metadata = match entry.metadata() {
            Ok(metadata) if metadata.is_dir() => metadata,
            Ok(_) => continue,
            Err(e) => {
                warn!("Skipping unreadable entry {}: {}", name, e);
                continue;
            }
        };
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        dirs.push(VersionDirEntry {
            path: entry.path(),
            name,
            modified,
        });
    }
    dirs
}

/// What retention actually did. Failures end up here instead of in a
/// `Result` so a stale directory can never fail an otherwise-good update.
#[derive(Debug, Default)]
pub struct RetentionOutcome {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

impl RetentionOutcome {
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty() && self.failed.is_empty()
    }
}

/// Delete all but the `keep` most recently modified version directories.
///
/// Ties on modification time are broken by directory name so the result is
/// deterministic. Deletion is recursive and unconditional.
pub fn enforce_retention(store: &Path, keep: usize) -> RetentionOutcome {
    let mut dirs = list_version_dirs(store);
    let mut outcome = RetentionOutcome::default();

    if dirs.len() <= keep {
        return outcome;
    }

    dirs.sort_by(|a, b| (a.modified, &a.name).cmp(&(b.modified, &b.name)));

    let excess = dirs.len() - keep;
    for dir in &dirs[..excess] {
        match fs::remove_dir_all(&dir.path) {
            Ok(()) => {
                debug!("Removed old version directory {}", dir.path.display());
                outcome.removed.push(dir.path.clone());
            }
            Err(e) => {
                warn!("Failed to remove {}: {}", dir.path.display(), e);
                outcome.failed.push(dir.path.clone());
            }
        }
    }
    outcome
}
