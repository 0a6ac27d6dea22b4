//! Cache behaviour integration tests.
//!
//! Tests verify:
//! - Tiles are cached independently by coordinate
//! - Tiles already on disk are served without contacting the upstream
//! - Concurrent requests for one tile share a single upstream fetch
//! - Cache write failures degrade to serving uncached tiles

use std::time::Duration;

use axum::http::StatusCode;
use bytes::Bytes;

use tile_cache_proxy::tile::TileId;
use tile_cache_proxy::TileStore;

use super::test_utils::{send_get, MockFetcher, TestServer};

#[tokio::test]
async fn test_different_tiles_cached_independently() {
    let a = TileId::new(10, 371, 510);
    let b = TileId::new(10, 372, 510);
    let server = TestServer::new(
        MockFetcher::new()
            .with_tile(a, b"TILE-A")
            .with_tile(b, b"TILE-B"),
    )
    .await;

    let response = server.get("/tiles/10/371/510.png").await;
    assert_eq!(response.header("x-tile-cache-hit"), Some("false"));

    let response = server.get("/tiles/10/372/510.png").await;
    assert_eq!(response.header("x-tile-cache-hit"), Some("false"));

    let response = server.get("/tiles/10/371/510.png").await;
    assert_eq!(response.header("x-tile-cache-hit"), Some("true"));
    assert_eq!(&response.body[..], b"TILE-A");

    let response = server.get("/tiles/10/372/510.png").await;
    assert_eq!(response.header("x-tile-cache-hit"), Some("true"));
    assert_eq!(&response.body[..], b"TILE-B");

    assert_eq!(server.fetcher.request_count(a).await, 1);
    assert_eq!(server.fetcher.request_count(b).await, 1);
    assert_eq!(server.store.cached_count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_preexisting_file_served_without_upstream() {
    let server = TestServer::new(MockFetcher::new()).await;

    // Populated externally, e.g. left over from a previous run
    std::fs::write(server.store.root().join("5-17-15.png"), b"FROM DISK").unwrap();

    let response = server.get("/tiles/5/17/15.png").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("x-tile-cache-hit"), Some("true"));
    assert_eq!(&response.body[..], b"FROM DISK");
    assert_eq!(server.fetcher.total_requests(), 0);
}

#[tokio::test]
async fn test_externally_cleared_cache_refetches() {
    let id = TileId::new(6, 23, 31);
    let server = TestServer::new(MockFetcher::new().with_tile(id, b"TILE")).await;

    server.get("/tiles/6/23/31.png").await;
    std::fs::remove_file(server.store.root().join("6-23-31.png")).unwrap();

    let response = server.get("/tiles/6/23/31.png").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("x-tile-cache-hit"), Some("false"));
    assert_eq!(server.fetcher.request_count(id).await, 2);
    assert!(server.store.has(&id).await);
}

#[tokio::test]
async fn test_concurrent_requests_share_one_fetch() {
    let id = TileId::new(14, 6340, 8640);
    let server = TestServer::new(
        MockFetcher::new()
            .with_tile(id, b"SHARED")
            .with_delay(Duration::from_millis(100)),
    )
    .await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let router = server.router.clone();
        handles.push(tokio::spawn(async move {
            send_get(router, "/tiles/14/6340/8640.png").await
        }));
    }

    for handle in handles {
        let response = handle.await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(&response.body[..], b"SHARED");
    }

    assert_eq!(server.fetcher.request_count(id).await, 1);
    assert_eq!(
        server.store.read(&id).await.unwrap(),
        Bytes::from_static(b"SHARED")
    );
    assert_eq!(server.store.cached_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_failures_create_no_file() {
    let id = TileId::new(9, 9, 9);
    let server = TestServer::new(
        MockFetcher::new()
            .with_status(id, 503)
            .with_delay(Duration::from_millis(50)),
    )
    .await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let router = server.router.clone();
        handles.push(tokio::spawn(async move {
            send_get(router, "/tiles/9/9/9.png").await
        }));
    }

    for handle in handles {
        assert_eq!(
            handle.await.unwrap().status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    assert!(!server.store.has(&id).await);
    assert_eq!(std::fs::read_dir(server.store.root()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_write_failure_still_serves_tile() {
    let id = TileId::new(7, 64, 42);
    let server = TestServer::new(MockFetcher::new().with_tile(id, b"UNCACHED")).await;

    // A directory squatting on the tile's file name makes the write fail
    std::fs::create_dir(server.store.root().join("7-64-42.png")).unwrap();

    let response = server.get("/tiles/7/64/42.png").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("x-tile-cache-hit"), Some("false"));
    assert_eq!(&response.body[..], b"UNCACHED");
    assert!(!server.store.has(&id).await);

    // Still uncached, so the upstream is asked again
    let response = server.get("/tiles/7/64/42.png").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(server.fetcher.request_count(id).await, 2);
}

#[tokio::test]
async fn test_missing_cache_directory_degrades_to_uncached() {
    let id = TileId::new(3, 3, 3);
    let server = TestServer::new(MockFetcher::new().with_tile(id, b"TILE")).await;

    std::fs::remove_dir_all(server.store.root()).unwrap();

    let response = server.get("/tiles/3/3/3.png").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..], b"TILE");

    // Listing fails, so the health check omits the count
    let response = server.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert!(json.get("cached_tiles").is_none());
}
