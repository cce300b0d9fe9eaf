// handlers/public/system.rs - GET /, /health, /version, /api/ping

use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::middleware::{ApiResponse, ApiResult};

/// GET / - service name and route overview
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Worksite API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "/health, /version, /api/ping (public)",
                "auth": "/api/auth/register, /api/auth/login, /api/auth/verify-email (public)",
                "account": "/api/auth/me, /api/auth/change-password (protected)",
                "locations": "/api/locations[/:slug] (protected)",
                "job_categories": "/api/job-categories[/:slug] (protected)",
                "job_types": "/api/job-types[/:slug] (protected)",
                "product_groups": "/api/product-groups[/:slug] (protected)",
                "users": "/api/users[/:id] (Admin, Super Admin; PUT Super Admin only)",
            }
        }
    }))
}

/// GET /health - liveness plus the active storage mode
pub async fn health(State(config): State<Arc<AppConfig>>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "storage": config.storage.mode.as_str(),
    }))
    .with_message("Service is healthy"))
}

/// GET /version
pub async fn version() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

/// GET /api/ping
pub async fn ping() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({ "pong": true })).with_message("pong"))
}
