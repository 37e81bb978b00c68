//! Bundle archive download.

use crate::error::UpdateError;
use crate::http::{HttpClient, HttpRequest};
use std::sync::Arc;
use tracing::debug;

/// Adjusts a parsed download URL before the request goes out.
///
/// Kept pluggable because the adjustments are endpoint-specific conventions,
/// not a protocol: servers that hand out pre-signed URLs need none.
pub trait UrlDecorator: Send + Sync {
    fn decorate(&self, url: &mut reqwest::Url, device_id: &str);
}

/// Default decoration for the service's own download endpoint: URLs whose
/// path contains `/api/download` get `deviceId` and `platform` query
/// parameters, unless the server already embedded them.
pub struct DownloadParamsDecorator {
    platform: String,
}

impl DownloadParamsDecorator {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
        }
    }
}

impl UrlDecorator for DownloadParamsDecorator {
    fn decorate(&self, url: &mut reqwest::Url, device_id: &str) {
        if !url.path().contains("/api/download") {
            return;
        }

        let has_device_id = url.query_pairs().any(|(name, _)| name == "deviceId");
        let has_platform = url.query_pairs().any(|(name, _)| name == "platform");

        if !has_device_id {
            url.query_pairs_mut().append_pair("deviceId", device_id);
        }
        if !has_platform {
            url.query_pairs_mut().append_pair("platform", &self.platform);
        }
    }
}

/// Downloads the archive referenced by resolved version metadata.
///
/// The whole body is buffered in memory; bundles are small.
pub struct BundleFetcher {
    http: Arc<dyn HttpClient>,
    decorator: Box<dyn UrlDecorator>,
}

impl BundleFetcher {
    pub fn new(http: Arc<dyn HttpClient>, decorator: Box<dyn UrlDecorator>) -> Self {
        Self { http, decorator }
    }

    pub async fn fetch(&self, download_url: &str, device_id: &str) -> Result<Vec<u8>, UpdateError> {
        let mut url = reqwest::Url::parse(download_url)
            .map_err(|e| UpdateError::Url(format!("{}: {}", download_url, e)))?;
        self.decorator.decorate(&mut url, device_id);

        debug!("Downloading bundle archive from {}", url);

        let response = self
            .http
            .get(HttpRequest::get(url.to_string()))
            .await
            .map_err(UpdateError::Download)?;

        if !response.is_success() {
            return Err(UpdateError::Api(format!(
                "download endpoint returned status {}",
                response.status
            )));
        }

        Ok(response.body)
    }
}
