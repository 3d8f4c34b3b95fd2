use axum::extract::{Json, Path, State};
use bytes::Bytes;
use serde::Deserialize;
use tracing::{info, warn};

use super::{parse_file_id, passkey_matches, MessageResponse};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct DeleteFileRequest {
    pub passkey: Option<String>,
}

impl DeleteFileRequest {
    /// An empty body means an ungated delete.
    fn from_body(body: &[u8]) -> AppResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(body)?)
    }
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> AppResult<Json<MessageResponse>> {
    let file_id = parse_file_id(&raw_id)?;
    let request = DeleteFileRequest::from_body(&body)?;

    if let Some(passkey) = request.passkey {
        let submission = state
            .store
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::not_found("file not found"))?;
        if !passkey_matches(&submission.passkey, &passkey) {
            warn!(file_id = %file_id, "delete rejected: passkey mismatch");
            return Err(AppError::forbidden("invalid passkey"));
        }
    }

    if !state.store.delete(file_id).await? {
        return Err(AppError::not_found("file not found"));
    }

    info!(file_id = %file_id, "submission deleted");
    Ok(MessageResponse::ok("file deleted"))
}

pub async fn delete_all_files(State(state): State<AppState>) -> AppResult<Json<MessageResponse>> {
    let removed = state.store.delete_all().await?;
    if removed == 0 {
        return Err(AppError::not_found("no files to delete"));
    }

    info!(removed, "all submissions deleted");
    Ok(MessageResponse::ok(format!("deleted {removed} files")))
}
