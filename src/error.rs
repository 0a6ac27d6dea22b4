use thiserror::Error;

use crate::tile::TileId;

/// Errors from the local tile store
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// No cached blob exists for the requested tile
    #[error("Tile not cached: {0}")]
    NotFound(String),

    /// Filesystem failure while reading or writing a tile
    #[error("Storage error at {path}: {message}")]
    Storage { path: String, message: String },
}

/// Errors from the upstream tile provider
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-success status
    #[error("Upstream returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Connection, timeout, DNS or body read failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Errors surfaced by the tile cache service
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// The tile is not cached and could not be fetched from upstream
    #[error("Tile {id} unavailable: {source}")]
    Unavailable {
        id: TileId,
        #[source]
        source: UpstreamError,
    },
}

impl StoreError {
    /// Build a storage error from an I/O failure on `path`.
    pub fn storage(path: &std::path::Path, err: &std::io::Error) -> Self {
        StoreError::Storage {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
