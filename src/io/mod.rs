//! Storage and upstream I/O.
//!
//! Two seams sit under the tile cache service:
//!
//! - [`TileStore`]: durable local storage, implemented by [`DiskTileStore`]
//! - [`TileFetcher`]: the upstream provider, implemented by [`HttpTileFetcher`]

mod disk_store;
mod fetcher;
mod http_fetcher;
mod store;

pub use disk_store::DiskTileStore;
pub use fetcher::TileFetcher;
pub use http_fetcher::{
    HttpTileFetcher, DEFAULT_UPSTREAM_TIMEOUT_SECS, DEFAULT_UPSTREAM_URL, DEFAULT_USER_AGENT,
};
pub use store::TileStore;
