//! HTTP server layer for the tile proxy.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                GET /tiles/{z}/{x}/{y}.png                       │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │          routes             │  │
//! │  │ (tile, health, errors)   │  │ (router, CORS, tracing)     │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, tile_handler, AppState, HandlerError, HealthResponse, TilePathParams,
    DEFAULT_CACHE_MAX_AGE, TILE_ERROR_BODY,
};
pub use routes::{create_router, RouterConfig};
