//! Health handlers.

use axum::response::Json;
use serde_json::{json, Value};

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "Health"
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
