use axum::Json;
use axum::response::IntoResponse;

use slate_types::api::HealthResponse;

pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Social Media Scheduler API is running!"
    }))
}

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now(),
    })
}
