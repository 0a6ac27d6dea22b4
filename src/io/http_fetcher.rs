//! Upstream tile fetcher over HTTP.
//!
//! Tile providers such as tile.openstreetmap.org block anonymous or default
//! user agents, so every request carries an application-identifying
//! `User-Agent` with contact information.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;
use url::Url;

use super::TileFetcher;
use crate::error::UpstreamError;
use crate::tile::TileId;

/// Default upstream tile server.
pub const DEFAULT_UPSTREAM_URL: &str = "https://tile.openstreetmap.org";

/// Default user agent sent to the upstream.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "tile-cache-proxy/",
    env!("CARGO_PKG_VERSION"),
    " (bus arrivals map; contact: tiles@example.org)"
);

/// Default upstream request timeout in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Fetches tiles from an HTTP tile server laid out as `{base}/{z}/{x}/{y}.png`.
///
/// # Example
///
/// ```no_run
/// use tile_cache_proxy::io::{HttpTileFetcher, TileFetcher};
/// use tile_cache_proxy::tile::TileId;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = HttpTileFetcher::new(
///     "https://tile.openstreetmap.org",
///     "my-app/1.0 (me@example.org)",
/// )?;
/// let png = fetcher.fetch(&TileId::new(3, 4, 5)).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTileFetcher {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTileFetcher {
    /// Create a fetcher with the default timeout.
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, UpstreamError> {
        Self::with_timeout(
            base_url,
            user_agent,
            Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        )
    }

    /// Create a fetcher with a custom request timeout.
    pub fn with_timeout(
        base_url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let agent = HeaderValue::from_str(user_agent)
            .map_err(|e| UpstreamError::Client(format!("invalid user agent: {}", e)))?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, agent);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| UpstreamError::Client(format!("failed to create HTTP client: {}", e)))?;

        let base_url = parse_base_url(base_url)?;

        Ok(Self { client, base_url })
    }

    /// The upstream base URL, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full upstream URL for `id`.
    pub fn tile_url(&self, id: &TileId) -> Result<Url, UpstreamError> {
        self.base_url
            .join(&id.upstream_path())
            .map_err(|e| UpstreamError::Client(format!("invalid tile URL: {}", e)))
    }
}

/// Parse the base URL, keeping any path prefix for `Url::join`.
fn parse_base_url(raw: &str) -> Result<Url, UpstreamError> {
    let normalized = format!("{}/", raw.trim_end_matches('/'));
    let url = Url::parse(&normalized)
        .map_err(|e| UpstreamError::Client(format!("invalid upstream URL '{}': {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(UpstreamError::Client(format!(
            "unsupported upstream scheme '{}'",
            other
        ))),
    }
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
    async fn fetch(&self, id: &TileId) -> Result<Bytes, UpstreamError> {
        let url = self.tile_url(id)?;

        debug!(tile = %id, url = %url, "Fetching tile from upstream");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.bytes().await.map_err(|e| {
            UpstreamError::Transport(format!("failed to read body from {}: {}", url, e))
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
