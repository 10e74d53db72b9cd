//! Error type shared by the fetcher and every data source.

use thiserror::Error;

/// Why a single poll of a data source failed.
///
/// The selector treats every variant the same way (the source is considered
/// down for this tick) but the kind is kept for logging and for the
/// "Show problem" popup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Transport-level failure: DNS, connect, timeout or a non-success status.
    #[error("network error: {0}")]
    Network(String),

    /// The response body was not valid JSON.
    #[error("decode error: {0}")]
    Decode(String),

    /// The JSON parsed but required fields or relationships are missing.
    #[error("unexpected data: {0}")]
    DataShape(String),
}

impl SourceError {
    /// Short label for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Network(_) => "network",
            SourceError::Decode(_) => "decode",
            SourceError::DataShape(_) => "data_shape",
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Network(format!("request timed out: {err}"))
        } else if err.is_connect() {
            SourceError::Network(format!("connection failed: {err}"))
        } else if err.is_decode() {
            SourceError::Decode(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() {
            SourceError::DataShape(err.to_string())
        } else {
            SourceError::Decode(err.to_string())
        }
    }
}
