//! Tile service layer.
//!
//! This module provides the tile identifier and the cache service that sits
//! between the HTTP layer and the storage/upstream I/O.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │ TileId
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            TileCacheService             │
//! │   (read-through, write-through,         │
//! │    single-flight per tile)              │
//! └──────────┬─────────────────┬────────────┘
//!            │                 │
//!            ▼                 ▼
//! ┌──────────────────┐ ┌──────────────────┐
//! │  DiskTileStore   │ │  HttpTileFetcher │
//! └──────────────────┘ └──────────────────┘
//! ```
//!
//! # Components
//!
//! - [`TileId`]: `(zoom, x, y)` identifier, also the cache key
//! - [`TileCacheService`]: main entry point for tile requests
//! - [`TileResponse`]: tile bytes plus whether they came from the cache

mod id;
mod service;

pub use id::TileId;
pub use service::{TileCacheService, TileResponse};
