//! Updater configuration.
//!
//! Plain struct with serde defaults so a partial TOML file is enough; the
//! host application usually overrides `data_dir` and `native_version`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Configuration for one [`crate::Updater`] instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Base URL of the metadata service.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Platform identifier sent with every request.
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Native host application version; `None` is reported as "0.0.0".
    #[serde(default)]
    pub native_version: Option<String>,

    /// Root directory for local state (versions store, device id).
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// File name of the runtime bundle inside a version directory.
    #[serde(default = "default_bundle_file_name")]
    pub bundle_file_name: String,

    /// How many version directories to keep after an update.
    #[serde(default = "default_retain_versions")]
    pub retain_versions: usize,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.airlift.dev".to_string()
}

fn default_platform() -> String {
    std::env::consts::OS.to_string()
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("airlift")
}

fn default_bundle_file_name() -> String {
    "index.bundle".to_string()
}

fn default_retain_versions() -> usize {
    3
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            platform: default_platform(),
            native_version: None,
            data_dir: default_data_dir(),
            bundle_file_name: default_bundle_file_name(),
            retain_versions: default_retain_versions(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl UpdaterConfig {
    /// Load from a TOML file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Directory holding all retained version directories.
    pub fn versions_dir(&self) -> PathBuf {
        self.data_dir.join("versions")
    }

    /// File persisting the per-install device identifier.
    pub fn device_id_path(&self) -> PathBuf {
        self.data_dir.join("device_id")
    }

    /// Native version string sent as `min_native_version`.
    pub fn native_version_or_default(&self) -> &str {
        self.native_version.as_deref().unwrap_or("0.0.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_complete() {
        let config = UpdaterConfig::default();
        assert_eq!(config.retain_versions, 3);
        assert_eq!(config.bundle_file_name, "index.bundle");
        assert_eq!(config.native_version_or_default(), "0.0.0");
        assert!(config.versions_dir().ends_with("versions"));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("airlift.toml");
        std::fs::write(
            &path,
            r#"
api_base = "http://localhost:9000"
native_version = "2.1.0"
"#,
        )
        .unwrap();

        let config = UpdaterConfig::load(&path).unwrap();
        assert_eq!(config.api_base, "http://localhost:9000");
        assert_eq!(config.native_version_or_default(), "2.1.0");
        assert_eq!(config.retain_versions, 3);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("airlift.toml");
        std::fs::write(&path, "retain_versions = \"three\"").unwrap();
        assert!(UpdaterConfig::load(&path).is_err());
    }
}
