use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{json_body, parse_file_id, passkey_matches, present, MessageResponse};
use crate::error::{AppError, AppResult};
use crate::models::ReviewUpdate;
use crate::state::AppState;

pub const NO_FEEDBACK_YET: &str = "No feedback yet";

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub id: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct SubmitFeedbackRequest {
    pub id: Option<String>,
    pub feedback: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFeedbackRequest {
    pub file_id: Option<String>,
    pub passkey: Option<String>,
}

#[derive(Serialize)]
pub struct FeedbackResponse {
    pub success: bool,
    pub feedback: String,
}

pub async fn update_status(
    State(state): State<AppState>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let request = json_body(payload)?;
    let (Some(raw_id), Some(status)) = (present(request.id), present(request.status)) else {
        return Err(AppError::bad_request("id and status are required"));
    };
    let file_id = parse_file_id(&raw_id)?;

    if !state
        .store
        .update(file_id, ReviewUpdate::Status(status.clone()))
        .await?
    {
        return Err(AppError::not_found("file not found"));
    }

    info!(file_id = %file_id, status = %status, "submission status updated");
    Ok(MessageResponse::ok("status updated"))
}

pub async fn submit_feedback(
    State(state): State<AppState>,
    payload: Result<Json<SubmitFeedbackRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let request = json_body(payload)?;
    let (Some(raw_id), Some(feedback)) = (present(request.id), present(request.feedback)) else {
        return Err(AppError::bad_request("id and feedback are required"));
    };
    let file_id = parse_file_id(&raw_id)?;
    let feedback_len = feedback.len();

    if !state
        .store
        .update(file_id, ReviewUpdate::Feedback(feedback))
        .await?
    {
        return Err(AppError::not_found("file not found"));
    }

    info!(file_id = %file_id, feedback_len, "submission feedback recorded");
    Ok(MessageResponse::ok("feedback submitted"))
}

pub async fn get_feedback(
    State(state): State<AppState>,
    payload: Result<Json<GetFeedbackRequest>, JsonRejection>,
) -> AppResult<Json<FeedbackResponse>> {
    let request = json_body(payload)?;
    let (Some(raw_id), Some(passkey)) = (present(request.file_id), present(request.passkey))
    else {
        return Err(AppError::bad_request("fileId and passkey are required"));
    };
    let file_id = parse_file_id(&raw_id)?;

    let submission = state
        .store
        .find_by_id(file_id)
        .await?
        .ok_or_else(|| AppError::not_found("file not found"))?;

    if !passkey_matches(&submission.passkey, &passkey) {
        warn!(file_id = %file_id, "feedback request rejected: passkey mismatch");
        return Err(AppError::forbidden("invalid passkey"));
    }

    Ok(Json(FeedbackResponse {
        success: true,
        feedback: submission
            .feedback
            .unwrap_or_else(|| NO_FEEDBACK_YET.to_string()),
    }))
}
