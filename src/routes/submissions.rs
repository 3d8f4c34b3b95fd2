use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{Json, Multipart, State};
use axum::http::StatusCode;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewSubmission, SubmissionSummary, DEFAULT_CATEGORY};
use crate::state::AppState;
use crate::store::StoreError;
use crate::validation::{require_passkey, validate_content_type, UploadRejection};

pub const FILE_FIELD: &str = "resume";
const FALLBACK_FILENAME: &str = "upload.pdf";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub file_id: Uuid,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub id: Uuid,
    pub filename: String,
    pub status: String,
    pub passkey: String,
    pub feedback: Option<String>,
    pub category: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<SubmissionSummary> for FileSummary {
    fn from(value: SubmissionSummary) -> Self {
        Self {
            id: value.id,
            filename: value.filename,
            status: value.status,
            passkey: value.passkey,
            feedback: value.feedback,
            category: value
                .category
                .filter(|category| !category.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            uploaded_at: value.uploaded_at,
        }
    }
}

#[derive(Serialize)]
pub struct FileListResponse {
    pub success: bool,
    pub files: Vec<FileSummary>,
}

struct UploadedFile {
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

#[derive(Default)]
struct SubmissionForm {
    passkey: Option<String>,
    category: Option<String>,
    file: Option<UploadedFile>,
    file_count: usize,
}

pub async fn submit_form(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<SubmitResponse>> {
    let mut multipart = multipart.map_err(|err| {
        warn!(error = %err, "submission rejected: body is not multipart");
        AppError::bad_request(format!("invalid multipart data: {}", err.body_text()))
    })?;
    let form = read_submission_form(&mut multipart).await?;

    let passkey = require_passkey(form.passkey).map_err(|rejection| {
        warn!("submission rejected: missing passkey");
        AppError::from(rejection)
    })?;

    if state.store.passkey_exists(&passkey).await? {
        warn!(passkey_len = passkey.len(), "submission rejected: passkey already in use");
        return Err(AppError::conflict("passkey already in use"));
    }

    if form.file_count > 1 {
        warn!(file_count = form.file_count, "submission rejected: multiple files");
        return Err(UploadRejection::MultipleFiles.into());
    }
    let file = form.file.ok_or_else(|| {
        warn!("submission rejected: missing file");
        AppError::from(UploadRejection::MissingFile)
    })?;
    let declared_type = file.content_type.as_deref();
    let content_type =
        validate_content_type(declared_type, file.filename.as_deref()).map_err(|rejection| {
            warn!(
                declared = declared_type.unwrap_or("none"),
                "submission rejected: unsupported media type"
            );
            AppError::from(rejection)
        })?;

    let filename = file
        .filename
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string());
    let category = form
        .category
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let size_bytes = file.bytes.len();

    let submission = NewSubmission::pending(
        filename.clone(),
        content_type,
        file.bytes.to_vec(),
        passkey,
        category,
    );

    let file_id = state.store.insert(submission).await.map_err(|err| {
        if matches!(err, StoreError::DuplicatePasskey) {
            warn!(filename = %filename, "submission rejected: passkey claimed concurrently");
        }
        AppError::from(err)
    })?;
    info!(file_id = %file_id, filename = %filename, size_bytes, "submission stored");

    Ok(Json(SubmitResponse {
        success: true,
        file_id,
    }))
}

pub async fn list_files(State(state): State<AppState>) -> AppResult<Json<FileListResponse>> {
    let files = state
        .store
        .list()
        .await?
        .into_iter()
        .map(FileSummary::from)
        .collect();

    Ok(Json(FileListResponse {
        success: true,
        files,
    }))
}

async fn read_submission_form(multipart: &mut Multipart) -> AppResult<SubmissionForm> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(err, "invalid multipart data"))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some(FILE_FIELD) => {
                let filename = field.file_name().map(|n| n.to_string());
                let content_type = field.content_type().map(|mime| mime.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| multipart_error(err, "failed to read file bytes"))?;
                if bytes.is_empty() {
                    continue;
                }
                form.file_count += 1;
                if form.file.is_none() {
                    form.file = Some(UploadedFile {
                        filename,
                        content_type,
                        bytes,
                    });
                }
            }
            Some("passkey") => form.passkey = Some(read_text(field, "passkey").await?),
            Some("category") => form.category = Some(read_text(field, "category").await?),
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: Field<'_>, name: &str) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|err| multipart_error(err, &format!("invalid {name}")))
}

/// Keeps axum's status for the failure, so a body over the upload limit is a
/// 413 rather than a parse error.
fn multipart_error(err: MultipartError, context: &str) -> AppError {
    let status = err.status();
    error!(error = %err, status = %status, "{context}");
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::new(status, "upload exceeds the size limit")
    } else {
        AppError::new(status, format!("{context}: {err}"))
    }
}
