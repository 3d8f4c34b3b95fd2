use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue};
use axum::response::Response;
use tracing::{debug, warn};

use super::parse_file_id;
use crate::error::{AppError, AppResult};
use crate::models::Submission;
use crate::state::AppState;

pub async fn get_file_by_id(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Response> {
    let file_id = parse_file_id(&raw_id)?;
    let submission = state.store.find_by_id(file_id).await?.ok_or_else(|| {
        debug!(file_id = %file_id, "file lookup by id matched nothing");
        AppError::not_found("file not found")
    })?;

    inline_file_response(submission)
}

pub async fn get_file_by_passkey(
    State(state): State<AppState>,
    Path(passkey): Path<String>,
) -> AppResult<Response> {
    let submission = state
        .store
        .find_by_passkey(&passkey)
        .await?
        .ok_or_else(|| {
            debug!(passkey_len = passkey.len(), "file lookup by passkey matched nothing");
            AppError::not_found("file not found")
        })?;

    inline_file_response(submission)
}

fn inline_file_response(submission: Submission) -> AppResult<Response> {
    let content_type = HeaderValue::from_str(&submission.content_type).map_err(|err| {
        warn!(file_id = %submission.id, error = %err, "stored content type is not a valid header");
        AppError::internal(err)
    })?;

    let mut builder = Response::builder().header(header::CONTENT_TYPE, content_type);
    if let Some(disposition) = inline_content_disposition(&submission.filename) {
        let value = HeaderValue::from_str(&disposition).map_err(AppError::internal)?;
        builder = builder.header(header::CONTENT_DISPOSITION, value);
    } else {
        builder = builder.header(header::CONTENT_DISPOSITION, HeaderValue::from_static("inline"));
    }

    builder
        .body(Body::from(submission.data))
        .map_err(AppError::internal)
}

pub(crate) fn inline_content_disposition(filename: &str) -> Option<String> {
    if filename.trim().is_empty() {
        return None;
    }

    let sanitized: String = filename
        .chars()
        .map(|ch| match ch {
            '"' | '\\' => '_',
            ch if ch.is_control() => '_',
            _ => ch,
        })
        .collect();

    let ascii_fallback: String = sanitized
        .chars()
        .map(|ch| if ch.is_ascii() { ch } else { '_' })
        .collect();
    let encoded =
        percent_encoding::utf8_percent_encode(&sanitized, percent_encoding::NON_ALPHANUMERIC);
    Some(format!(
        "inline; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_fallback, encoded
    ))
}
