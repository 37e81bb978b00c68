//! Per-install device identity.
//!
//! A random token generated once and persisted outside the versions store,
//! used to attribute requests to an installation. The store is injectable so
//! tests run against memory.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tracing::warn;
use uuid::Uuid;

/// Backing storage for the device identifier.
pub trait DeviceStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, id: &str) -> io::Result<()>;
}

/// Persists the token in a single file.
pub struct FileDeviceStore {
    path: PathBuf,
}

impl FileDeviceStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl DeviceStore for FileDeviceStore {
    fn load(&self) -> Option<String> {
        let content = fs::read_to_string(&self.path).ok()?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn save(&self, id: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write to temp file, then rename (atomic on most filesystems)
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, id)?;
        fs::rename(&temp_path, &self.path)
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryDeviceStore {
    value: Mutex<Option<String>>,
}

impl MemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeviceStore for MemoryDeviceStore {
    fn load(&self) -> Option<String> {
        self.value.lock().unwrap().clone()
    }

    fn save(&self, id: &str) -> io::Result<()> {
        *self.value.lock().unwrap() = Some(id.to_string());
        Ok(())
    }
}

/// Lazily created, process-cached device identifier.
pub struct DeviceIdentity {
    store: Box<dyn DeviceStore>,
    cached: OnceLock<String>,
}

impl DeviceIdentity {
    pub fn new(store: Box<dyn DeviceStore>) -> Self {
        Self {
            store,
            cached: OnceLock::new(),
        }
    }

    /// Return the stored token, or generate, persist and cache a new one.
    ///
    /// A failed write is tolerated: the token is still returned and repeat
    /// calls within this process return the same value.
    pub fn get_or_create(&self) -> String {
        self.cached
            .get_or_init(|| {
                if let Some(existing) = self.store.load() {
                    return existing;
                }
                let id = Uuid::new_v4().to_string();
                if let Err(e) = self.store.save(&id) {
                    warn!("Failed to persist device id: {}", e);
                }
                id
            })
            .clone()
    }
}
