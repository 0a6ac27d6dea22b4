//! Configuration management for the tile proxy.
//!
//! Configuration comes from command-line arguments via clap, with
//! environment variable fallbacks using the `TILES_` prefix and defaults for
//! every setting.
//!
//! # Environment Variables
//!
//! - `TILES_HOST` - Server bind address (default: 0.0.0.0)
//! - `TILES_PORT` - Server port (default: 3000)
//! - `TILES_CACHE_DIR` - Tile cache directory (default: tile_cache)
//! - `TILES_UPSTREAM_URL` - Upstream tile server (default: https://tile.openstreetmap.org)
//! - `TILES_USER_AGENT` - User-Agent sent upstream, should include contact info
//! - `TILES_UPSTREAM_TIMEOUT` - Upstream request timeout in seconds (default: 30)
//! - `TILES_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 86400)
//! - `TILES_CORS_ORIGINS` - Allowed CORS origins, comma separated

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::io::{DEFAULT_UPSTREAM_TIMEOUT_SECS, DEFAULT_UPSTREAM_URL, DEFAULT_USER_AGENT};
use crate::server::{RouterConfig, DEFAULT_CACHE_MAX_AGE};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default tile cache directory.
pub const DEFAULT_CACHE_DIR: &str = "tile_cache";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Tile Cache Proxy - serves map tiles from a local disk cache.
///
/// Tiles missing from the cache are fetched from the upstream tile server,
/// stored, and served. Cached tiles are kept forever.
#[derive(Parser, Debug, Clone)]
#[command(name = "tile-cache-proxy")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "TILES_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "TILES_PORT")]
    pub port: u16,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Directory holding cached tiles. Created if missing.
    #[arg(long, default_value = DEFAULT_CACHE_DIR, env = "TILES_CACHE_DIR")]
    pub cache_dir: PathBuf,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "TILES_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // Upstream Configuration
    // =========================================================================
    /// Base URL of the upstream tile server.
    #[arg(long, default_value = DEFAULT_UPSTREAM_URL, env = "TILES_UPSTREAM_URL")]
    pub upstream_url: String,

    /// User-Agent sent to the upstream.
    ///
    /// Public tile servers require an application name and contact address.
    #[arg(long, default_value = DEFAULT_USER_AGENT, env = "TILES_USER_AGENT")]
    pub user_agent: String,

    /// Upstream request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_UPSTREAM_TIMEOUT_SECS, env = "TILES_UPSTREAM_TIMEOUT")]
    pub upstream_timeout: u64,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "TILES_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err("Cache directory is required. Set --cache-dir or TILES_CACHE_DIR".to_string());
        }

        if self.user_agent.trim().is_empty() {
            return Err(
                "User agent must not be empty. Tile servers block anonymous clients; \
                 set --user-agent or TILES_USER_AGENT"
                    .to_string(),
            );
        }

        match Url::parse(&self.upstream_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(format!(
                    "Upstream URL must use http or https, got '{}'",
                    url.scheme()
                ))
            }
            Err(e) => {
                return Err(format!(
                    "Invalid upstream URL '{}': {}",
                    self.upstream_url, e
                ))
            }
        }

        if self.upstream_timeout == 0 {
            return Err("upstream_timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Upstream request timeout.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }

    /// Build the router configuration from these settings.
    pub fn router_config(&self) -> RouterConfig {
        let mut router_config = RouterConfig::new()
            .with_cache_max_age(self.cache_max_age)
            .with_tracing(!self.no_tracing);

        if let Some(ref origins) = self.cors_origins {
            router_config = router_config.with_cors_origins(origins.clone());
        }

        router_config
    }
}

// =============================================================================
// Tests
// =============================================================================
