//! # Tile Cache Proxy
//!
//! A caching proxy for OpenStreetMap raster tiles.
//!
//! Map tiles are served from a local on-disk cache keyed by `(zoom, x, y)`.
//! On a miss the tile is fetched from the upstream tile server, written to the
//! cache and returned. Cached tiles are treated as immutable: they are never
//! refetched or evicted.
//!
//! ## Features
//!
//! - **Permanent disk cache**: one PNG file per tile in a flat directory
//! - **Atomic writes**: readers never observe a partially written tile
//! - **Single-flight fetches**: concurrent misses for a tile share one upstream request
//! - **Graceful degradation**: cache write failures still serve the fetched tile
//!
//! ## Architecture
//!
//! - [`io`] - Tile store (disk) and tile fetcher (HTTP upstream)
//! - [`tile`] - Tile identifier and cache service
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use tile_cache_proxy::{create_router, DiskTileStore, HttpTileFetcher, RouterConfig, TileCacheService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DiskTileStore::open("tile_cache").await?;
//!     let fetcher = HttpTileFetcher::new(
//!         "https://tile.openstreetmap.org",
//!         "my-app/1.0 (me@example.org)",
//!     )?;
//!
//!     let router = create_router(TileCacheService::new(store, fetcher), RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod server;
pub mod tile;

// Re-export commonly used types
pub use config::Config;
pub use error::{StoreError, TileError, UpstreamError};
pub use io::{DiskTileStore, HttpTileFetcher, TileFetcher, TileStore};
pub use server::{create_router, AppState, HealthResponse, RouterConfig};
pub use tile::{TileCacheService, TileId, TileResponse};
