use async_trait::async_trait;
use bytes::Bytes;

use crate::error::UpstreamError;
use crate::tile::TileId;

/// Trait for retrieving tiles from an upstream provider.
///
/// Implementations perform exactly one attempt per call. Retry policy, if
/// any, belongs to the caller.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    /// Fetch the complete image for `id`.
    ///
    /// The returned bytes are the fully buffered body; a failure never yields
    /// partial data.
    async fn fetch(&self, id: &TileId) -> Result<Bytes, UpstreamError>;
}
