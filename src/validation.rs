//! Checks applied to an upload before anything reaches the store.

use crate::error::AppError;
use crate::models::PDF_CONTENT_TYPE;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("passkey is required")]
    MissingPasskey,
    #[error("a PDF file is required")]
    MissingFile,
    #[error("only one file may be attached")]
    MultipleFiles,
    #[error("unsupported media type {0}: only PDF files are accepted")]
    UnsupportedMediaType(String),
}

impl From<UploadRejection> for AppError {
    fn from(value: UploadRejection) -> Self {
        AppError::bad_request(value.to_string())
    }
}

/// Accepts a non-blank passkey and returns it exactly as submitted.
pub fn require_passkey(passkey: Option<String>) -> Result<String, UploadRejection> {
    match passkey {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(UploadRejection::MissingPasskey),
    }
}

/// Resolves the effective content type of an uploaded part and accepts it only
/// if it is PDF. Parts without a declared type fall back to the filename
/// extension.
pub fn validate_content_type(
    declared: Option<&str>,
    filename: Option<&str>,
) -> Result<String, UploadRejection> {
    let resolved = declared
        .map(mime_essence)
        .filter(|essence| !essence.is_empty())
        .or_else(|| {
            filename
                .and_then(|name| mime_guess::from_path(name).first())
                .map(|mime| mime.essence_str().to_ascii_lowercase())
        })
        .unwrap_or_default();

    if resolved == PDF_CONTENT_TYPE {
        Ok(resolved)
    } else if resolved.is_empty() {
        Err(UploadRejection::UnsupportedMediaType("unknown".to_string()))
    } else {
        Err(UploadRejection::UnsupportedMediaType(resolved))
    }
}

fn mime_essence(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
