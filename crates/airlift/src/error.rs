//! Error types for the update pipeline.

use thiserror::Error;

/// One failure kind per pipeline stage. Nothing here is retried internally;
/// retry policy belongs to the caller.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid download URL: {0}")]
    Url(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Extraction error: {0}")]
    Extraction(String),
}

impl UpdateError {
    /// Stable machine-readable kind, independent of the message.
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateError::Network(_) => "network_error",
            UpdateError::Api(_) => "api_error",
            UpdateError::Parse(_) => "parse_error",
            UpdateError::Url(_) => "url_error",
            UpdateError::Download(_) => "download_error",
            UpdateError::Extraction(_) => "extraction_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_stable_per_variant() {
        assert_eq!(UpdateError::Network("x".into()).kind(), "network_error");
        assert_eq!(UpdateError::Api("x".into()).kind(), "api_error");
        assert_eq!(UpdateError::Parse("x".into()).kind(), "parse_error");
        assert_eq!(UpdateError::Url("x".into()).kind(), "url_error");
        assert_eq!(UpdateError::Download("x".into()).kind(), "download_error");
        assert_eq!(UpdateError::Extraction("x".into()).kind(), "extraction_error");
    }

    #[test]
    fn display_includes_underlying_message() {
        let err = UpdateError::Api("unexpected status 500".into());
        assert_eq!(err.to_string(), "API error: unexpected status 500");
    }
}
