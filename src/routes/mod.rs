use axum::http::HeaderValue;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub mod deletion;
pub mod files;
pub mod health;
pub mod review;
pub mod submissions;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return None;
                }
                match trimmed.parse::<HeaderValue>() {
                    Ok(header) => Some(header),
                    Err(_) => {
                        warn!(origin = %trimmed, "ignoring invalid CORS allowed origin");
                        None
                    }
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
    };

    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(health::banner))
        .route("/api/health", get(health::health_check))
        .route("/submit-form", post(submissions::submit_form))
        .route("/get-files", get(submissions::list_files))
        .route("/file/:id", get(files::get_file_by_id))
        .route("/file/passkey/:passkey", get(files::get_file_by_passkey))
        .route("/update-status", post(review::update_status))
        .route("/submit-feedback", post(review::submit_feedback))
        .route("/get-feedback", post(review::get_feedback))
        .route("/delete-file/:id", delete(deletion::delete_file))
        .route("/delete-all-files", delete(deletion::delete_all_files))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

/// Unwraps a JSON body, turning extractor rejections into JSON error bodies.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    let Json(value) = payload.map_err(|rejection| {
        warn!(error = %rejection, "rejected malformed JSON body");
        AppError::from(rejection)
    })?;
    Ok(value)
}

/// Treats absent and blank strings alike.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Parses a client-supplied file id, reporting malformed ids as bad requests.
pub(crate) fn parse_file_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::bad_request("invalid file id"))
}

/// Exact passkey equality without an early exit on the first differing byte.
pub(crate) fn passkey_matches(stored: &str, supplied: &str) -> bool {
    stored.as_bytes().ct_eq(supplied.as_bytes()).into()
}
