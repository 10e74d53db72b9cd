//! Thin JSON-over-HTTP fetcher shared by all data sources.
//!
//! The fetcher performs exactly one GET per call and never retries; retry
//! policy belongs to the [`Selector`](crate::selector::Selector).  A single
//! [`reqwest::Client`] is shared (cheap to clone) so connections are pooled
//! across sources and ticks.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::source::SourceError;

/// Issues single GET requests and parses the body as JSON.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    /// Build a fetcher whose every request is bounded by `timeout`.
    ///
    /// Failing here is a setup error, not a poll failure, so it is returned
    /// as the plain [`reqwest::Error`] for the caller to report.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// GET `url` with the given headers and decode the body as JSON.
    pub async fn fetch(&self, url: &str, headers: &[(&str, &str)]) -> Result<Value, SourceError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(%url, %status, "fetched");

        if !status.is_success() {
            return Err(SourceError::Network(format!("HTTP {status} from {url}")));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| SourceError::Decode(format!("{url}: {e}")))
    }
}
