//! Liveness probe.

use axum::Json;

/// Always-OK health check for orchestration probes.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
