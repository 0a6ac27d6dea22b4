//! Disk-backed tile store.
//!
//! Tiles live in a single flat directory, one file per tile, named
//! `{zoom}-{x}-{y}.png`. There is no index or manifest: the directory listing
//! is the only metadata.
//!
//! Writes go to a uniquely named temporary file in the same directory and are
//! then renamed into place. Rename within a directory is atomic, so a reader
//! either sees no file or the complete tile, even when two requests for the
//! same tile write concurrently.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::TileStore;
use crate::error::StoreError;
use crate::tile::TileId;

/// Extension of committed tile files.
const TILE_EXTENSION: &str = "png";

/// Suffix of in-progress writes. Never matched by `has` or `cached_count`.
const TEMP_SUFFIX: &str = "tmp";

/// Disambiguates temporary files of concurrent writers in this process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Tile store backed by a local directory.
///
/// # Example
///
/// ```no_run
/// use bytes::Bytes;
/// use tile_cache_proxy::io::{DiskTileStore, TileStore};
/// use tile_cache_proxy::tile::TileId;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = DiskTileStore::open("tile_cache").await?;
/// let id = TileId::new(3, 4, 5);
///
/// store.write(&id, &Bytes::from_static(b"PNGDATA")).await?;
/// assert!(store.has(&id).await);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DiskTileStore {
    root: PathBuf,
}

impl DiskTileStore {
    /// Open a store rooted at `root`, creating the directory if missing.
    ///
    /// Opening an existing directory is a no-op, so this is safe to call on
    /// every startup.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::storage(&root, &e))?;

        debug!(root = %root.display(), "Opened tile store");
        Ok(Self { root })
    }

    /// The cache directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the cached file for `id`.
    pub fn tile_path(&self, id: &TileId) -> PathBuf {
        self.root.join(id.cache_file_name())
    }

    fn temp_path(&self, id: &TileId) -> PathBuf {
        let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.root.join(format!(
            ".{}.{}.{}.{}",
            id.cache_file_name(),
            std::process::id(),
            seq,
            TEMP_SUFFIX
        ))
    }
}

#[async_trait]
impl TileStore for DiskTileStore {
    async fn has(&self, id: &TileId) -> bool {
        tokio::fs::metadata(self.tile_path(id))
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    async fn read(&self, id: &TileId) -> Result<Bytes, StoreError> {
        let path = self.tile_path(id);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(StoreError::storage(&path, &e)),
        }
    }

    async fn write(&self, id: &TileId, data: &Bytes) -> Result<(), StoreError> {
        let path = self.tile_path(id);
        let temp = self.temp_path(id);

        if let Err(e) = tokio::fs::write(&temp, data).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(StoreError::storage(&temp, &e));
        }

        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(StoreError::storage(&path, &e));
        }

        debug!(tile = %id, bytes = data.len(), "Stored tile");
        Ok(())
    }

    /// Counts committed tiles by listing the cache directory.
    async fn cached_count(&self) -> Result<usize, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| StoreError::storage(&self.root, &e))?;

        let mut count = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::storage(&self.root, &e))?
        {
            let path = entry.path();
            let is_tile = path.extension().and_then(|ext| ext.to_str()) == Some(TILE_EXTENSION);
            if is_tile && entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                count += 1;
            }
        }

        Ok(count)
    }
}

// =============================================================================
// Tests
// =============================================================================
