//! Error handling for Reelfetch

use crate::extractor::models::Platform;
use thiserror::Error;

/// Main error type for Reelfetch
#[derive(Debug, Error)]
pub enum ReelfetchError {
    #[error(transparent)]
    MalformedId(#[from] MalformedIdError),

    #[error("All {platform} download methods failed after {attempts} attempts: {last}")]
    AllStrategiesExhausted {
        platform: Platform,
        attempts: usize,
        last: ExtractionFailure,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(#[from] toml::de::Error),
}

impl ReelfetchError {
    /// HTTP status a web front end should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ReelfetchError::MalformedId(_) => 400,
            _ => 500,
        }
    }
}

/// The identifier did not match any shape accepted for its platform.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid {platform} ID format: {raw:?}")]
pub struct MalformedIdError {
    pub platform: Platform,
    pub raw: String,
}

/// Outcome of a single failed extraction strategy.
///
/// The chain only cares that a strategy failed; the split exists so logs and
/// the final error tell a missing post apart from a broken mirror.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionFailure {
    #[error("Video not found: {0}")]
    NotFound(String),

    #[error("Download failed: {0}")]
    DownloadError(String),
}

impl ExtractionFailure {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ExtractionFailure::NotFound(msg.into())
    }

    pub fn download(msg: impl Into<String>) -> Self {
        ExtractionFailure::DownloadError(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ExtractionFailure::NotFound(_))
    }
}

impl From<reqwest::Error> for ExtractionFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.status().map(|s| s.as_u16() == 404).unwrap_or(false) {
            ExtractionFailure::NotFound(e.to_string())
        } else {
            ExtractionFailure::DownloadError(e.to_string())
        }
    }
}

impl From<std::io::Error> for ExtractionFailure {
    fn from(e: std::io::Error) -> Self {
        ExtractionFailure::DownloadError(format!("IO error: {}", e))
    }
}

impl From<serde_json::Error> for ExtractionFailure {
    fn from(e: serde_json::Error) -> Self {
        ExtractionFailure::DownloadError(format!("Invalid JSON response: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_id_maps_to_client_error() {
        let err: ReelfetchError = MalformedIdError {
            platform: Platform::TikTok,
            raw: "bad id!".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("TikTok"));
    }

    #[test]
    fn exhausted_chain_cites_last_failure() {
        let err = ReelfetchError::AllStrategiesExhausted {
            platform: Platform::X,
            attempts: 2,
            last: ExtractionFailure::not_found("no meta tag"),
        };
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("no meta tag"));
    }

    #[test]
    fn io_errors_are_download_errors() {
        let failure: ExtractionFailure =
            std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert!(!failure.is_not_found());
    }
}
