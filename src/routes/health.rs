use axum::{http::StatusCode, response::Json};
use serde_json::json;

pub async fn banner() -> &'static str {
    "filedesk submission service is running"
}

pub async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
