//! Update pipeline orchestration.
//!
//! One `Updater` owns the versions store: resolve, fetch, extract, retire,
//! in that order, serialized across concurrent callers.

use crate::config::UpdaterConfig;
use crate::device::{DeviceIdentity, DeviceStore, FileDeviceStore};
use crate::error::UpdateError;
use crate::extract;
use crate::fetcher::{BundleFetcher, DownloadParamsDecorator, UrlDecorator};
use crate::http::{HttpClient, ReqwestHttpClient};
use crate::locator;
use crate::resolver::VersionResolver;
use crate::restart::{ProcessRestart, RestartHandle};
use crate::retention::{enforce_retention, RetentionOutcome};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Successful update result: where the new version directory landed.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub path: PathBuf,
}

/// Orchestrates the versioned bundle update pipeline.
pub struct Updater {
    config: UpdaterConfig,
    device: DeviceIdentity,
    resolver: VersionResolver,
    fetcher: BundleFetcher,
    restart: Box<dyn RestartHandle>,
    // Serializes pipeline runs; two interleaved runs could delete a
    // directory mid-extraction or break the retention invariant.
    run_lock: Mutex<()>,
}

impl Updater {
    /// Production wiring: reqwest transport, file-backed device id, process
    /// restart.
    pub fn new(config: UpdaterConfig) -> Self {
        let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(Duration::from_secs(
            config.request_timeout_secs,
        )));
        let device_store = Box::new(FileDeviceStore::new(config.device_id_path()));
        Self::with_components(config, http, device_store, Box::new(ProcessRestart))
    }

    /// Explicit wiring for tests and embedders with their own transport.
    pub fn with_components(
        config: UpdaterConfig,
        http: Arc<dyn HttpClient>,
        device_store: Box<dyn DeviceStore>,
        restart: Box<dyn RestartHandle>,
    ) -> Self {
        let resolver = VersionResolver::new(http.clone(), config.api_base.clone(), config.platform.clone());
        let decorator: Box<dyn UrlDecorator> =
            Box::new(DownloadParamsDecorator::new(config.platform.clone()));
        let fetcher = BundleFetcher::new(http, decorator);
        Self {
            config,
            device: DeviceIdentity::new(device_store),
            resolver,
            fetcher,
            restart,
            run_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// Run the full pipeline once. The first failing stage aborts the run
    /// and its error is returned verbatim; cleanup and retention are
    /// best-effort and never fail a successful update.
    pub async fn update(
        &self,
        api_key: &str,
        project_id: &str,
    ) -> Result<UpdateOutcome, UpdateError> {
        let _guard = self.run_lock.lock().await;

        let device_id = self.device.get_or_create();
        let native_version = self.config.native_version_or_default();

        let metadata = self
            .resolver
            .resolve(api_key, project_id, native_version)
            .await?;
        info!(
            "Resolved version {} for project {}",
            metadata.version.as_deref().unwrap_or("(unversioned)"),
            project_id
        );

        let archive = self
            .fetcher
            .fetch(&metadata.download_url, &device_id)
            .await?;
        info!("Downloaded archive ({} bytes)", archive.len());

        let store = self.config.versions_dir();
        fs::create_dir_all(&store).map_err(|e| {
            UpdateError::Extraction(format!("failed to create {}: {}", store.display(), e))
        })?;

        let version_name = allocate_version_name(&store);
        let temp_archive = store.join(format!("{}.zip", version_name));
        let staging = store.join(format!(".staging-{}", version_name));
        let dest = store.join(&version_name);

        fs::write(&temp_archive, &archive).map_err(|e| {
            UpdateError::Extraction(format!("failed to write {}: {}", temp_archive.display(), e))
        })?;

        // Extract into a hidden staging directory and publish with a single
        // rename: the store never contains a visible half-extracted version.
        let published = extract::extract_archive(&archive, &staging).and_then(|()| {
            fs::rename(&staging, &dest).map_err(|e| {
                UpdateError::Extraction(format!("failed to publish {}: {}", dest.display(), e))
            })
        });

        if let Err(e) = published {
            let _ = fs::remove_dir_all(&staging);
            let _ = fs::remove_file(&temp_archive);
            return Err(e);
        }

        if let Err(e) = fs::remove_file(&temp_archive) {
            warn!(
                "Failed to remove temporary archive {}: {}",
                temp_archive.display(),
                e
            );
        }

        let retention = enforce_retention(&store, self.config.retain_versions);
        if !retention.removed.is_empty() {
            info!("Retired {} old version(s)", retention.removed.len());
        }

        info!("Update installed at {}", dest.display());
        Ok(UpdateOutcome { path: dest })
    }

    /// Newest valid bundle for host startup. Does not require a prior
    /// `update` call in this process.
    pub fn latest_bundle_path(&self) -> Option<PathBuf> {
        locator::locate_latest_bundle(&self.config.versions_dir(), &self.config.bundle_file_name)
    }

    /// Enforce retention outside an update run.
    pub async fn prune(&self) -> RetentionOutcome {
        let _guard = self.run_lock.lock().await;
        enforce_retention(&self.config.versions_dir(), self.config.retain_versions)
    }

    /// Fire-and-forget host restart.
    pub fn restart(&self) {
        self.restart.schedule_restart();
    }
}

/// Millisecond timestamp, bumped past any name already present so repeated
/// updates within one millisecond still get distinct directories.
fn allocate_version_name(store: &Path) -> String {
    let mut timestamp = Utc::now().timestamp_millis();
    loop {
        let name = timestamp.to_string();
        if !store.join(&name).exists() && !store.join(format!(".staging-{}", name)).exists() {
            return name;
        }
        timestamp += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn version_names_never_collide() {
        let temp = TempDir::new().unwrap();
        let first = allocate_version_name(temp.path());
        fs::create_dir_all(temp.path().join(&first)).unwrap();
        let second = allocate_version_name(temp.path());
        assert_ne!(first, second);
    }

    #[test]
    fn staging_names_also_block_allocation() {
        let temp = TempDir::new().unwrap();
        let first = allocate_version_name(temp.path());
        fs::create_dir_all(temp.path().join(format!(".staging-{}", first))).unwrap();
        let second = allocate_version_name(temp.path());
        assert_ne!(first, second);
    }
}
