use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

pub const DEFAULT_STATUS: &str = "under_processing";
pub const DEFAULT_CATEGORY: &str = "Uncategorized";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = submissions)]
pub struct Submission {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
    pub status: String,
    pub passkey: String,
    pub category: Option<String>,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = submissions)]
pub struct NewSubmission {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
    pub status: String,
    pub passkey: String,
    pub category: Option<String>,
    pub feedback: Option<String>,
}

impl NewSubmission {
    /// A freshly uploaded submission: default status, no feedback yet.
    pub fn pending(
        filename: String,
        content_type: String,
        data: Vec<u8>,
        passkey: String,
        category: Option<String>,
    ) -> Self {
        Self {
            filename,
            content_type,
            data,
            uploaded_at: Utc::now(),
            status: DEFAULT_STATUS.to_string(),
            passkey,
            category: Some(category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string())),
            feedback: None,
        }
    }
}

/// Metadata-only projection of a submission; the payload column is never
/// selected for it.
#[derive(Debug, Clone, Queryable)]
pub struct SubmissionSummary {
    pub id: Uuid,
    pub filename: String,
    pub status: String,
    pub passkey: String,
    pub feedback: Option<String>,
    pub category: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&Submission> for SubmissionSummary {
    fn from(value: &Submission) -> Self {
        Self {
            id: value.id,
            filename: value.filename.clone(),
            status: value.status.clone(),
            passkey: value.passkey.clone(),
            feedback: value.feedback.clone(),
            category: value.category.clone(),
            uploaded_at: value.uploaded_at,
        }
    }
}

/// Field change applied by the review endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewUpdate {
    Status(String),
    Feedback(String),
}
