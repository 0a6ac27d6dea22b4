//! Tile Cache Proxy - serves map tiles from a local disk cache.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tile_cache_proxy::{
    create_router, Config, DiskTileStore, HttpTileFetcher, TileCacheService, TileStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Tile Cache Proxy v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Cache directory: {}", config.cache_dir.display());
    info!("  Upstream: {}", config.upstream_url);
    info!("  User-Agent: {}", config.user_agent);
    info!("  Upstream timeout: {}s", config.upstream_timeout);
    info!("  Cache-Control max-age: {}s", config.cache_max_age);

    // Bootstrap the cache directory before accepting requests
    let store = match DiskTileStore::open(&config.cache_dir).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open tile cache: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match store.cached_count().await {
        Ok(count) => info!("  Cached tiles: {}", count),
        Err(e) => warn!("  Could not list cached tiles: {}", e),
    }

    let fetcher = match HttpTileFetcher::with_timeout(
        &config.upstream_url,
        &config.user_agent,
        config.upstream_timeout(),
    ) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("Failed to create upstream client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let router = create_router(TileCacheService::new(store, fetcher), config.router_config());

    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("  Try: curl -o tile.png http://{}/tiles/0/0/0.png", addr);
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tile_cache_proxy=debug,tower_http=debug"
    } else {
        "tile_cache_proxy=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
