//! Airlift - over-the-air bundle updates for host applications
//!
//! Resolves the latest compatible bundle version from the Airlift service,
//! downloads and extracts it into a local versioned store, retires old
//! versions, and locates the newest valid bundle at startup.

pub mod config;
pub mod device;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod http;
pub mod locator;
pub mod pipeline;
pub mod resolver;
pub mod restart;
pub mod retention;

pub use config::UpdaterConfig;
pub use device::{DeviceIdentity, DeviceStore, FileDeviceStore, MemoryDeviceStore};
pub use error::UpdateError;
pub use extract::extract_archive;
pub use fetcher::{BundleFetcher, DownloadParamsDecorator, UrlDecorator};
pub use http::{FakeHttpClient, HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use locator::locate_latest_bundle;
pub use pipeline::{UpdateOutcome, Updater};
pub use resolver::{VersionMetadata, VersionResolver};
pub use restart::{FakeRestart, ProcessRestart, RestartHandle};
pub use retention::{enforce_retention, RetentionOutcome};
