use axum::response::{IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Catalog API (Rust)",
            "version": version,
            "description": "Product catalog admin backend built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health, /ready (public)",
                "auth": "/api/auth/login, /api/auth/register (public), /api/auth/profile (protected)",
                "categories": "/api/categories[/tree|/:id] (protected)",
                "products": "/api/products[/:id|/sku/:sku] (protected)",
                "pricing": "/api/pricing[/product/:productId[/current]|/:id] (protected)",
                "attributes": "/api/attributes[/:id|/product/:productId] (protected)",
                "media": "/api/media[/product/:productId|/:id] (protected)",
            }
        }
    }))
}

/// GET /health - liveness plus a database ping
pub async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}

/// GET /ready - readiness probe
pub async fn ready() -> Json<Value> {
    Json(json!({ "ready": true }))
}
