//! Tile identifier.
//!
//! Tiles follow the standard slippy-map scheme and are addressed by
//! `(zoom, x, y)`. The identifier doubles as the cache key: it derives both
//! the on-disk file name and the upstream request path.
//!
//! No range check is applied (e.g. `x < 2^zoom`). Identifiers are taken as
//! received and the upstream provider decides whether the tile exists.

use std::fmt;

/// Identifier of a single map tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    /// Zoom level (0 = whole world in one tile)
    pub zoom: u32,

    /// Tile column, 0-indexed from the west
    pub x: u32,

    /// Tile row, 0-indexed from the north
    pub y: u32,
}

impl TileId {
    /// Create a new tile identifier.
    pub fn new(zoom: u32, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// File name of the cached tile, `{zoom}-{x}-{y}.png`.
    pub fn cache_file_name(&self) -> String {
        format!("{}-{}-{}.png", self.zoom, self.x, self.y)
    }

    /// Path of the tile relative to the upstream base URL, `{zoom}/{x}/{y}.png`.
    pub fn upstream_path(&self) -> String {
        format!("{}/{}/{}.png", self.zoom, self.x, self.y)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

// =============================================================================
// Tests
// =============================================================================
