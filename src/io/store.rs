use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::tile::TileId;

/// Durable mapping from tile identifier to tile bytes.
///
/// Implementations have no network knowledge. They must be thread-safe since
/// one store is shared by every in-flight request.
#[async_trait]
pub trait TileStore: Send + Sync {
    /// Whether a blob exists for `id`. Has no side effects.
    async fn has(&self, id: &TileId) -> bool;

    /// Read the stored bytes for `id`.
    ///
    /// Returns `StoreError::NotFound` if nothing is stored.
    async fn read(&self, id: &TileId) -> Result<Bytes, StoreError>;

    /// Store `data` for `id`, replacing any previous blob.
    ///
    /// Writing the same bytes twice leaves the store in the same state as
    /// writing once.
    async fn write(&self, id: &TileId, data: &Bytes) -> Result<(), StoreError>;

    /// Number of tiles currently stored.
    async fn cached_count(&self) -> Result<usize, StoreError>;
}
