use axum::Json;
use chrono::Utc;

/// GET /
pub async fn root() -> &'static str {
    "Let's do this"
}

/// GET /heartbeat
pub async fn heartbeat() -> &'static str {
    "OK"
}

/// GET /health
/// Response: 200 OK with JSON
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
      "status": "healthy",
      "timestamp": Utc::now().timestamp()
    }))
}
