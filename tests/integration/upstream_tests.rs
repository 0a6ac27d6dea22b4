//! End-to-end tests against a stub HTTP tile server.
//!
//! Tests verify the full path from the HTTP endpoint through the disk store
//! and the real HTTP fetcher to an upstream, including the User-Agent header.

use std::sync::Arc;

use axum::http::StatusCode;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tile_cache_proxy::io::{DiskTileStore, HttpTileFetcher};
use tile_cache_proxy::tile::{TileCacheService, TileId};
use tile_cache_proxy::{create_router, RouterConfig, TileStore};

use super::test_utils::send_get;

const TEST_USER_AGENT: &str = "tile-cache-proxy-tests/1.0 (tests@example.org)";

struct Proxy {
    router: axum::Router,
    store: Arc<DiskTileStore>,
    _dir: TempDir,
}

async fn proxy_for(upstream: &MockServer) -> Proxy {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        DiskTileStore::open(dir.path().join("tile_cache"))
            .await
            .unwrap(),
    );
    let fetcher = Arc::new(HttpTileFetcher::new(&upstream.uri(), TEST_USER_AGENT).unwrap());
    let service = TileCacheService::with_shared(store.clone(), fetcher);

    Proxy {
        router: create_router(service, RouterConfig::new().with_tracing(false)),
        store,
        _dir: dir,
    }
}

#[tokio::test]
async fn test_miss_then_hit_against_upstream() {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/3/4/5.png"))
        .and(header("user-agent", TEST_USER_AGENT))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(b"PNGDATA".to_vec()),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let proxy = proxy_for(&upstream).await;

    let first = send_get(proxy.router.clone(), "/tiles/3/4/5.png").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.header("content-type"), Some("image/png"));
    assert_eq!(&first.body[..], b"PNGDATA");
    assert_eq!(
        std::fs::read(proxy.store.root().join("3-4-5.png")).unwrap(),
        b"PNGDATA"
    );

    let second = send_get(proxy.router.clone(), "/tiles/3/4/5.png").await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.header("content-type"), Some("image/png"));
    assert_eq!(&second.body[..], b"PNGDATA");

    // `expect(1)` is verified when the mock server drops
    upstream.verify().await;
}

#[tokio::test]
async fn test_upstream_503_returns_500_without_caching() {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/9/9/9.png"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&upstream)
        .await;

    let proxy = proxy_for(&upstream).await;

    let response = send_get(proxy.router.clone(), "/tiles/9/9/9.png").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.body.is_empty());
    assert!(!proxy.store.root().join("9-9-9.png").exists());
    assert!(!proxy.store.has(&TileId::new(9, 9, 9)).await);
}

#[tokio::test]
async fn test_unreachable_upstream_returns_500() {
    let dir = tempfile::tempdir().unwrap();
    let store = DiskTileStore::open(dir.path().join("tile_cache"))
        .await
        .unwrap();
    let fetcher = HttpTileFetcher::new("http://127.0.0.1:9", TEST_USER_AGENT).unwrap();
    let router = create_router(
        TileCacheService::new(store, fetcher),
        RouterConfig::new().with_tracing(false),
    );

    let response = send_get(router, "/tiles/1/1/1.png").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}
