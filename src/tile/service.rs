//! Tile cache service.
//!
//! The TileCacheService is the entry point for tile requests. It implements a
//! permanent read-through / write-through cache in front of the upstream:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      TileCacheService                           │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                    get_tile()                           │    │
//! │  │  1. Store hit? return bytes (no network)                │    │
//! │  │  2. Join in-flight fetch for the same tile, or lead one │    │
//! │  │  3. Fetch upstream, write-through (best effort), return │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │                 │                              │                │
//! │                 ▼                              ▼                │
//! │          ┌─────────────┐               ┌──────────────┐         │
//! │          │  TileStore  │               │ TileFetcher  │         │
//! │          └─────────────┘               └──────────────┘         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cached tiles are never considered stale and never evicted. Tiles at a
//! given (zoom, x, y) are treated as immutable.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::TileError;
use crate::io::{TileFetcher, TileStore};

use super::TileId;

/// Outcome shared between the leader of a fetch and its waiters.
type SharedOutcome = Option<Result<Bytes, TileError>>;

/// In-flight fetches keyed by tile.
type InFlightMap = Mutex<HashMap<TileId, watch::Receiver<SharedOutcome>>>;

// =============================================================================
// Tile Response
// =============================================================================

/// Response from the tile cache service.
#[derive(Debug, Clone)]
pub struct TileResponse {
    /// The PNG tile data
    pub data: Bytes,

    /// Whether this tile was served from the local store
    pub cache_hit: bool,
}

// =============================================================================
// In-flight Tracking
// =============================================================================

/// Held by the task fetching a tile. Dropping it unregisters the fetch.
///
/// The map entry is removed before the sender is dropped, so a waiter that
/// sees the channel close never finds the stale entry on retry.
struct InFlightGuard<'a> {
    in_flight: &'a InFlightMap,
    id: TileId,
    sender: watch::Sender<SharedOutcome>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

enum Role<'a> {
    Leader(InFlightGuard<'a>),
    Waiter(watch::Receiver<SharedOutcome>),
}

// =============================================================================
// Tile Cache Service
// =============================================================================

/// Service serving tiles from a local store, falling back to the upstream.
///
/// Concurrent misses for the same tile share one upstream fetch. Misses for
/// different tiles proceed independently.
///
/// # Type Parameters
///
/// * `S` - The tile store (e.g. [`DiskTileStore`](crate::io::DiskTileStore))
/// * `F` - The upstream fetcher (e.g. [`HttpTileFetcher`](crate::io::HttpTileFetcher))
///
/// # Example
///
/// ```ignore
/// use tile_cache_proxy::io::{DiskTileStore, HttpTileFetcher};
/// use tile_cache_proxy::tile::{TileCacheService, TileId};
///
/// let store = DiskTileStore::open("tile_cache").await?;
/// let fetcher = HttpTileFetcher::new("https://tile.openstreetmap.org", "my-app/1.0 (me@example.org)")?;
/// let service = TileCacheService::new(store, fetcher);
///
/// let response = service.get_tile(TileId::new(3, 4, 5)).await?;
/// println!("{} bytes, cache hit: {}", response.data.len(), response.cache_hit);
/// ```
pub struct TileCacheService<S: TileStore, F: TileFetcher> {
    /// Durable local storage
    store: Arc<S>,

    /// Upstream provider
    fetcher: Arc<F>,

    /// Fetches currently in progress
    in_flight: InFlightMap,
}

impl<S: TileStore, F: TileFetcher> TileCacheService<S, F> {
    /// Create a new service owning the given store and fetcher.
    pub fn new(store: S, fetcher: F) -> Self {
        Self::with_shared(Arc::new(store), Arc::new(fetcher))
    }

    /// Create a new service from shared store and fetcher handles.
    ///
    /// Useful in tests that need to inspect the store or count fetches.
    pub fn with_shared(store: Arc<S>, fetcher: Arc<F>) -> Self {
        Self {
            store,
            fetcher,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Get a tile, from the store when cached, otherwise from the upstream.
    ///
    /// A successful upstream fetch is written through to the store. A failed
    /// write is logged and the fetched bytes are still returned.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::Unavailable`] if the tile is not cached and the
    /// upstream fetch fails. Nothing is stored in that case.
    pub async fn get_tile(&self, id: TileId) -> Result<TileResponse, TileError> {
        // Fast path: never touches the network
        if let Some(data) = self.read_cached(&id).await {
            debug!(tile = %id, "Tile cache hit");
            return Ok(TileResponse {
                data,
                cache_hit: true,
            });
        }

        loop {
            match self.join_or_lead(id) {
                Role::Leader(guard) => {
                    // A previous leader may have finished between our store
                    // check and registering
                    if let Some(data) = self.read_cached(&id).await {
                        guard.sender.send_replace(Some(Ok(data.clone())));
                        return Ok(TileResponse {
                            data,
                            cache_hit: true,
                        });
                    }

                    debug!(tile = %id, "Tile cache miss");
                    let result = self.fetch_and_store(&id).await;
                    guard.sender.send_replace(Some(result.clone()));

                    return result.map(|data| TileResponse {
                        data,
                        cache_hit: false,
                    });
                }
                Role::Waiter(mut receiver) => {
                    debug!(tile = %id, "Waiting on in-flight fetch");

                    let outcome = match receiver.wait_for(Option::is_some).await {
                        Ok(value) => (*value).clone(),
                        Err(_) => None,
                    };

                    if let Some(result) = outcome {
                        return result.map(|data| TileResponse {
                            data,
                            cache_hit: false,
                        });
                    }

                    // Leader was dropped before finishing; try again
                    debug!(tile = %id, "In-flight fetch abandoned, retrying");
                }
            }
        }
    }

    /// Register as the fetcher for `id`, or subscribe to the existing fetch.
    fn join_or_lead(&self, id: TileId) -> Role<'_> {
        let mut in_flight = self.lock_in_flight();

        if let Some(receiver) = in_flight.get(&id) {
            return Role::Waiter(receiver.clone());
        }

        let (sender, receiver) = watch::channel(None);
        in_flight.insert(id, receiver);

        Role::Leader(InFlightGuard {
            in_flight: &self.in_flight,
            id,
            sender,
        })
    }

    /// Read a tile from the store, treating any read failure as a miss.
    async fn read_cached(&self, id: &TileId) -> Option<Bytes> {
        if !self.store.has(id).await {
            return None;
        }

        match self.store.read(id).await {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(tile = %id, error = %e, "Cached tile unreadable, refetching");
                None
            }
        }
    }

    /// Fetch from upstream and write through to the store.
    async fn fetch_and_store(&self, id: &TileId) -> Result<Bytes, TileError> {
        let data = self
            .fetcher
            .fetch(id)
            .await
            .map_err(|source| TileError::Unavailable { id: *id, source })?;

        if let Err(e) = self.store.write(id, &data).await {
            warn!(tile = %id, error = %e, "Failed to cache tile, serving uncached");
        }

        Ok(data)
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<TileId, watch::Receiver<SharedOutcome>>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of tiles currently being fetched from upstream.
    pub fn in_flight_count(&self) -> usize {
        self.lock_in_flight().len()
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Get a reference to the underlying fetcher.
    pub fn fetcher(&self) -> &Arc<F> {
        &self.fetcher
    }
}

// =============================================================================
// Tests
// =============================================================================
