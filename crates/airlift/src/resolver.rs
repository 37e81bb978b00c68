//! Version resolution against the metadata service.

use crate::error::UpdateError;
use crate::http::{HttpClient, HttpRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Metadata for the latest compatible bundle version.
///
/// The service guarantees `download_url`; everything else is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionMetadata {
    pub download_url: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Queries the metadata endpoint for the latest version compatible with the
/// running native version and platform. Single attempt, no retry.
pub struct VersionResolver {
    http: Arc<dyn HttpClient>,
    api_base: String,
    platform: String,
}

impl VersionResolver {
    pub fn new(http: Arc<dyn HttpClient>, api_base: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            platform: platform.into(),
        }
    }

    /// `GET {api_base}/api/projects/{project_id}/versions/latest`.
    ///
    /// The API key travels as the `X-API-Key` header, never in the URL.
    pub async fn resolve(
        &self,
        api_key: &str,
        project_id: &str,
        native_version: &str,
    ) -> Result<VersionMetadata, UpdateError> {
        let endpoint = format!(
            "{}/api/projects/{}/versions/latest",
            self.api_base.trim_end_matches('/'),
            project_id
        );
        let mut url = reqwest::Url::parse(&endpoint)
            .map_err(|e| UpdateError::Url(format!("{}: {}", endpoint, e)))?;
        url.query_pairs_mut()
            .append_pair("platform", &self.platform)
            .append_pair("min_native_version", native_version);

        debug!("Resolving latest version for project {}", project_id);

        let request = HttpRequest::get(url.to_string()).header("X-API-Key", api_key);
        let response = self.http.get(request).await.map_err(UpdateError::Network)?;

        if !response.is_success() {
            return Err(UpdateError::Api(format!(
                "metadata endpoint returned status {}",
                response.status
            )));
        }

        let metadata: VersionMetadata =
            serde_json::from_slice(&response.body).map_err(|e| UpdateError::Parse(e.to_string()))?;

        if metadata.download_url.is_empty() {
            return Err(UpdateError::Parse("empty download_url in response".to_string()));
        }

        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::FakeHttpClient;

    fn resolver(fake: Arc<FakeHttpClient>) -> VersionResolver {
        VersionResolver::new(fake, "https://api.example.com", "linux")
    }

    #[tokio::test]
    async fn returns_download_url_from_valid_response() {
        let fake = Arc::new(FakeHttpClient::new());
        fake.push_response(200, br#"{"download_url":"https://cdn/x.zip","version":"1.2.0"}"#.to_vec());

        let metadata = resolver(fake.clone())
            .resolve("key", "proj-1", "1.0.0")
            .await
            .unwrap();
        assert_eq!(metadata.download_url, "https://cdn/x.zip");
        assert_eq!(metadata.version.as_deref(), Some("1.2.0"));

        let request = &fake.requests()[0];
        assert!(request.url.contains("/api/projects/proj-1/versions/latest"));
        assert!(request.url.contains("platform=linux"));
        assert!(request.url.contains("min_native_version=1.0.0"));
        assert!(
            !request.url.contains("key"),
            "api key must not appear in the URL"
        );
        assert_eq!(
            request.headers,
            vec![("X-API-Key".to_string(), "key".to_string())]
        );
    }

    #[tokio::test]
    async fn missing_download_url_is_a_parse_error() {
        let fake = Arc::new(FakeHttpClient::new());
        fake.push_response(200, br#"{"version":"1.2.0"}"#.to_vec());

        let err = resolver(fake).resolve("key", "p", "0.0.0").await.unwrap_err();
        assert!(matches!(err, UpdateError::Parse(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn non_json_body_is_a_parse_error() {
        let fake = Arc::new(FakeHttpClient::new());
        fake.push_response(200, b"<html>oops</html>".to_vec());

        let err = resolver(fake).resolve("key", "p", "0.0.0").await.unwrap_err();
        assert!(matches!(err, UpdateError::Parse(_)));
    }

    #[tokio::test]
    async fn http_error_status_is_an_api_error() {
        let fake = Arc::new(FakeHttpClient::new());
        fake.push_response(500, b"".to_vec());

        let err = resolver(fake).resolve("key", "p", "0.0.0").await.unwrap_err();
        assert!(matches!(err, UpdateError::Api(_)));
    }

    #[tokio::test]
    async fn transport_failure_is_a_network_error() {
        let fake = Arc::new(FakeHttpClient::new());
        fake.push_transport_error("dns failure");

        let err = resolver(fake).resolve("key", "p", "0.0.0").await.unwrap_err();
        assert!(matches!(err, UpdateError::Network(_)));
    }
}
