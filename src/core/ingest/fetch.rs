//! Remote image retrieval over HTTP(S).
//!
//! One GET per query, bounded by a timeout, never retried. A slow or
//! failing image host costs the caller at most one timeout.

use crate::error::{IngestError, LookalikeError};
use reqwest::blocking::Client;
use reqwest::Url;
use std::io::Read;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default request timeout
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// Default upper bound on a downloaded image (20MB)
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Settings for remote fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchConfig {
    /// Whole-request timeout (connect, headers and body)
    pub timeout: Duration,
    /// Responses larger than this are rejected
    pub max_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            max_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
        }
    }
}

/// Blocking HTTP fetcher for query images
#[derive(Clone)]
pub struct RemoteFetcher {
    client: Client,
    config: FetchConfig,
}

impl RemoteFetcher {
    /// Create a fetcher with the given settings.
    pub fn new(config: FetchConfig) -> Result<Self, LookalikeError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("lookalike/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LookalikeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> FetchConfig {
        self.config
    }

    /// Fetch `url` with the configured timeout
    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, IngestError> {
        self.fetch_with_timeout(url, self.config.timeout)
    }

    /// Fetch `url` with an explicit timeout.
    ///
    /// Only `http` and `https` URLs are accepted. Any non-2xx status is a
    /// failure; redirects are followed by the client.
    pub fn fetch_with_timeout(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, IngestError> {
        let failure = |reason: String| IngestError::FetchFailure {
            url: url.to_string(),
            reason,
        };

        let parsed = Url::parse(url).map_err(|e| failure(format!("invalid URL: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(failure(format!(
                "unsupported scheme '{}' (use http or https)",
                parsed.scheme()
            )));
        }

        let start = Instant::now();

        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .map_err(|e| {
                let latency_ms = start.elapsed().as_millis() as u64;
                warn!(url, error = %e, latency_ms, "Image request failed");
                if e.is_timeout() {
                    failure(format!("timed out after {}s", timeout.as_secs_f32()))
                } else {
                    failure(e.to_string())
                }
            })?;

        let status = response.status();
        debug!(url, status = %status, "Received HTTP response");

        if !status.is_success() {
            warn!(url, status = %status, "Image host returned an error status");
            return Err(failure(format!("HTTP {}", status)));
        }

        let limit = self.config.max_bytes;
        if let Some(length) = response.content_length() {
            if length > limit {
                return Err(failure(format!(
                    "image is {} bytes, limit is {} bytes",
                    length, limit
                )));
            }
        }

        // Content-Length can be absent or wrong, so cap the read as well
        let mut body = Vec::new();
        response
            .take(limit + 1)
            .read_to_end(&mut body)
            .map_err(|e| {
                if start.elapsed() >= timeout {
                    failure(format!("timed out after {}s", timeout.as_secs_f32()))
                } else {
                    failure(format!("failed to read body: {}", e))
                }
            })?;

        if body.len() as u64 > limit {
            return Err(failure(format!("image exceeds the {} byte limit", limit)));
        }

        debug!(
            url,
            bytes = body.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Fetched remote image"
        );

        Ok(body)
    }
}
