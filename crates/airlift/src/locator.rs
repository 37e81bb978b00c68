//! Bundle selection at host startup.

use crate::retention::list_version_dirs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path to the runtime bundle file inside the newest version directory.
///
/// Only the single newest directory is considered: if its bundle file is
/// missing there is no fallback to older versions, the host falls back to
/// its built-in bundle instead.
pub fn locate_latest_bundle(store: &Path, bundle_file_name: &str) -> Option<PathBuf> {
    let mut dirs = list_version_dirs(store);
    if dirs.is_empty() {
        return None;
    }

    dirs.sort_by(|a, b| (b.modified, &b.name).cmp(&(a.modified, &a.name)));
    let newest = &dirs[0];

    let bundle = newest.path.join(bundle_file_name);
    if bundle.is_file() {
        debug!("Latest bundle at {}", bundle.display());
        Some(bundle)
    } else {
        debug!(
            "Newest version directory {} has no {}",
            newest.path.display(),
            bundle_file_name
        );
        None
    }
}
