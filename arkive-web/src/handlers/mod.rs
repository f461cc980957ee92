//! HTTP handlers

pub mod auth;
pub mod files;
pub mod groups;
pub mod nodes;

use axum::response::Json;
use serde_json::{json, Value};

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "arkive-web",
    }))
}
