//! HTTP request handlers for the tile proxy.
//!
//! # Endpoints
//!
//! - `GET /tiles/{z}/{x}/{y}.png` - Serve a tile
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::TileError;
use crate::io::{TileFetcher, TileStore};
use crate::tile::{TileCacheService, TileId};

/// Body returned when a tile cannot be served.
pub const TILE_ERROR_BODY: &str = "failed to fetch tile";

/// Default Cache-Control max-age for tiles (1 day).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 86400;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the tile cache service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: TileStore, F: TileFetcher> {
    /// The service answering tile requests
    pub tile_service: Arc<TileCacheService<S, F>>,

    /// Cache-Control max-age in seconds sent with tiles
    pub cache_max_age: u32,
}

impl<S: TileStore, F: TileFetcher> AppState<S, F> {
    /// Create a new application state with the given tile service.
    pub fn new(tile_service: TileCacheService<S, F>) -> Self {
        Self::with_cache_max_age(tile_service, DEFAULT_CACHE_MAX_AGE)
    }

    /// Create a new application state with custom cache max-age.
    pub fn with_cache_max_age(tile_service: TileCacheService<S, F>, cache_max_age: u32) -> Self {
        Self {
            tile_service: Arc::new(tile_service),
            cache_max_age,
        }
    }
}

impl<S: TileStore, F: TileFetcher> Clone for AppState<S, F> {
    fn clone(&self) -> Self {
        Self {
            tile_service: Arc::clone(&self.tile_service),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for tile requests.
///
/// Extracted from: `/tiles/{z}/{x}/{filename}`
/// where filename is `{y}.png` or `{y}`
#[derive(Debug, Deserialize)]
pub struct TilePathParams {
    /// Zoom level
    pub z: u32,

    /// Tile column
    pub x: u32,

    /// Tile row with optional .png extension (e.g., "5" or "5.png")
    pub filename: String,
}

impl TilePathParams {
    /// Parse the Y coordinate from the filename, stripping any .png extension.
    pub fn y(&self) -> Result<u32, std::num::ParseIntError> {
        let y_str = self.filename.strip_suffix(".png").unwrap_or(&self.filename);
        y_str.parse()
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Number of tiles in the cache directory, if it could be listed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_tiles: Option<usize>,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert TileError to HTTP response.
///
/// Clients only ever see a short message; the full error, including the
/// upstream cause, goes to the server log.
impl IntoResponse for TileError {
    fn into_response(self) -> Response {
        let status = match &self {
            TileError::Unavailable { id, source } => {
                error!(
                    tile = %id,
                    error = %source,
                    status = StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    "Failed to serve tile"
                );
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            TILE_ERROR_BODY,
        )
            .into_response()
    }
}

/// Wrapper for handler errors to implement IntoResponse.
pub struct HandlerError(pub TileError);

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

impl From<TileError> for HandlerError {
    fn from(err: TileError) -> Self {
        HandlerError(err)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle tile requests.
///
/// # Endpoint
///
/// `GET /tiles/{z}/{x}/{y}.png`
///
/// # Response
///
/// - `200 OK`: PNG tile with `Content-Type: image/png`
/// - `400 Bad Request`: Coordinates are not non-negative integers
/// - `500 Internal Server Error`: Tile not cached and upstream unavailable
///
/// # Headers
///
/// - `Content-Type: image/png`
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `X-Tile-Cache-Hit: true|false`
pub async fn tile_handler<S, F>(
    State(state): State<AppState<S, F>>,
    Path(params): Path<TilePathParams>,
) -> Result<Response, HandlerError>
where
    S: TileStore + 'static,
    F: TileFetcher + 'static,
{
    let y = match params.y() {
        Ok(y) => y,
        Err(_) => {
            warn!(filename = %params.filename, "Invalid tile row");
            return Ok((StatusCode::BAD_REQUEST, "invalid tile coordinates").into_response());
        }
    };

    let id = TileId::new(params.z, params.x, y);
    let tile = state.tile_service.get_tile(id).await?;

    let response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (
                header::CACHE_CONTROL,
                format!("public, max-age={}", state.cache_max_age),
            ),
            (
                header::HeaderName::from_static("x-tile-cache-hit"),
                tile.cache_hit.to_string(),
            ),
        ],
        tile.data,
    )
        .into_response();

    Ok(response)
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// Always returns `200 OK` with a JSON body. `cached_tiles` is omitted when
/// the cache directory cannot be listed.
pub async fn health_handler<S, F>(State(state): State<AppState<S, F>>) -> Json<HealthResponse>
where
    S: TileStore + 'static,
    F: TileFetcher + 'static,
{
    let cached_tiles = match state.tile_service.store().cached_count().await {
        Ok(count) => Some(count),
        Err(e) => {
            warn!(error = %e, "Failed to count cached tiles");
            None
        }
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cached_tiles,
    })
}

// =============================================================================
// Tests
// =============================================================================
