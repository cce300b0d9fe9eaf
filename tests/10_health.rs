mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use common::test_config;
use worksite_api::config::StorageMode;
use worksite_api::{router, AppState};

async fn get(uri: &str) -> Result<(StatusCode, Value)> {
    let state = AppState::from_config(test_config(StorageMode::Memory, None))?;
    let response = router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn health_reports_storage_mode() -> Result<()> {
    let (status, body) = get("/health").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["storage"], "memory");
    assert!(body["data"]["timestamp"].is_string());

    Ok(())
}

#[tokio::test]
async fn ping_and_version_are_public() -> Result<()> {
    let (status, body) = get("/api/ping").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pong"], true);

    let (status, body) = get("/version").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "worksite-api");

    let (status, body) = get("/").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["endpoints"]["locations"].is_string());

    Ok(())
}

#[tokio::test]
async fn unknown_route_is_404() -> Result<()> {
    let state = AppState::from_config(test_config(StorageMode::Memory, None))?;
    let response = router(state)
        .oneshot(Request::builder().uri("/api/nowhere").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}
