use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, ensure, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use filedesk::config::AppConfig;
use filedesk::db;
use filedesk::models::{NewSubmission, ReviewUpdate, Submission, SubmissionSummary};
use filedesk::routes;
use filedesk::state::AppState;
use filedesk::store::{StoreError, StoreResult, SubmissionStore};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

#[allow(dead_code)]
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF\n";

/// In-memory store with the same passkey uniqueness rule as the database.
#[derive(Default)]
pub struct FakeStore {
    records: Mutex<HashMap<Uuid, Submission>>,
}

#[async_trait]
impl SubmissionStore for FakeStore {
    async fn insert(&self, submission: NewSubmission) -> StoreResult<Uuid> {
        let mut guard = self.records.lock().await;
        if guard
            .values()
            .any(|existing| existing.passkey == submission.passkey)
        {
            return Err(StoreError::DuplicatePasskey);
        }
        let id = Uuid::new_v4();
        guard.insert(
            id,
            Submission {
                id,
                filename: submission.filename,
                content_type: submission.content_type,
                data: submission.data,
                uploaded_at: submission.uploaded_at,
                status: submission.status,
                passkey: submission.passkey,
                category: submission.category,
                feedback: submission.feedback,
            },
        );
        Ok(id)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Submission>> {
        let guard = self.records.lock().await;
        Ok(guard.get(&id).cloned())
    }

    async fn find_by_passkey(&self, passkey: &str) -> StoreResult<Option<Submission>> {
        let guard = self.records.lock().await;
        Ok(guard
            .values()
            .find(|record| record.passkey == passkey)
            .cloned())
    }

    async fn passkey_exists(&self, passkey: &str) -> StoreResult<bool> {
        let guard = self.records.lock().await;
        Ok(guard.values().any(|record| record.passkey == passkey))
    }

    async fn list(&self) -> StoreResult<Vec<SubmissionSummary>> {
        let guard = self.records.lock().await;
        let mut rows: Vec<SubmissionSummary> =
            guard.values().map(SubmissionSummary::from).collect();
        rows.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(rows)
    }

    async fn update(&self, id: Uuid, change: ReviewUpdate) -> StoreResult<bool> {
        let mut guard = self.records.lock().await;
        let Some(record) = guard.get_mut(&id) else {
            return Ok(false);
        };
        match change {
            ReviewUpdate::Status(status) => record.status = status,
            ReviewUpdate::Feedback(feedback) => record.feedback = Some(feedback),
        }
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut guard = self.records.lock().await;
        Ok(guard.remove(&id).is_some())
    }

    async fn delete_all(&self) -> StoreResult<usize> {
        let mut guard = self.records.lock().await;
        let removed = guard.len();
        guard.clear();
        Ok(removed)
    }
}

impl FakeStore {
    #[allow(dead_code)]
    pub async fn get(&self, id: Uuid) -> Option<Submission> {
        let guard = self.records.lock().await;
        guard.get(&id).cloned()
    }

    #[allow(dead_code)]
    pub async fn record_count(&self) -> usize {
        let guard = self.records.lock().await;
        guard.len()
    }
}

/// Multipart form as sent by the upload page.
#[allow(dead_code)]
pub struct SubmissionForm<'a> {
    pub filename: &'a str,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
    pub passkey: Option<&'a str>,
    pub category: Option<&'a str>,
    pub file_parts: usize,
}

#[allow(dead_code)]
impl<'a> SubmissionForm<'a> {
    pub fn pdf(passkey: &'a str) -> Self {
        Self {
            filename: "resume.pdf",
            content_type: Some("application/pdf"),
            data: PDF_BYTES,
            passkey: Some(passkey),
            category: None,
            file_parts: 1,
        }
    }

    pub fn category(mut self, category: &'a str) -> Self {
        self.category = Some(category);
        self
    }
}

pub struct TestApp {
    router: Router,
    store: Arc<FakeStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let config = AppConfig {
            database_url: "postgres://localhost/filedesk_test".to_string(),
            database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            cors_allowed_origin: None,
            max_upload_bytes: 1024 * 1024,
        };

        let store = Arc::new(FakeStore::default());
        let store_for_state: Arc<dyn SubmissionStore> = store.clone();
        let state = AppState::new(config, store_for_state);
        let router = routes::create_router(state);

        Self { router, store }
    }

    #[allow(dead_code)]
    pub fn store(&self) -> Arc<FakeStore> {
        self.store.clone()
    }

    pub async fn send(&self, request: Request<Body>) -> Result<hyper::Response<Body>> {
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body))?;
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn get(&self, path: &str) -> Result<hyper::Response<Body>> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())?;
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str) -> Result<hyper::Response<Body>> {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri(path)
            .body(Body::empty())?;
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn delete_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let request = Request::builder()
            .method(Method::DELETE)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body))?;
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn submit_form(&self, form: &SubmissionForm<'_>) -> Result<hyper::Response<Body>> {
        let boundary = format!("boundary-{}", Uuid::new_v4());
        let mut body = Vec::new();

        if let Some(passkey) = form.passkey {
            push_text_field(&mut body, &boundary, "passkey", passkey);
        }
        if let Some(category) = form.category {
            push_text_field(&mut body, &boundary, "category", category);
        }

        for _ in 0..form.file_parts {
            body.extend(format!("--{boundary}\r\n").as_bytes());
            body.extend(
                format!(
                    "Content-Disposition: form-data; name=\"resume\"; filename=\"{}\"\r\n",
                    form.filename
                )
                .as_bytes(),
            );
            if let Some(content_type) = form.content_type {
                body.extend(format!("Content-Type: {content_type}\r\n").as_bytes());
            }
            body.extend(b"\r\n");
            body.extend(form.data);
            body.extend(b"\r\n");
        }
        body.extend(format!("--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/submit-form")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))?;
        self.send(request).await
    }

    /// Uploads a PDF and returns the new file id.
    #[allow(dead_code)]
    pub async fn upload(&self, form: &SubmissionForm<'_>) -> Result<Uuid> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct SubmitResponse {
            success: bool,
            file_id: Uuid,
        }

        let response = self.submit_form(form).await?;
        ensure!(
            response.status() == StatusCode::OK,
            "upload failed with status {}",
            response.status()
        );
        let parsed: SubmitResponse = read_json(response).await?;
        ensure!(parsed.success, "upload reported success=false");
        Ok(parsed.file_id)
    }
}

fn push_text_field(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    body.extend(format!("--{boundary}\r\n").as_bytes());
    body.extend(format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes());
    body.extend(value.as_bytes());
    body.extend(b"\r\n");
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

#[allow(dead_code)]
pub async fn read_json<T: DeserializeOwned>(response: hyper::Response<Body>) -> Result<T> {
    let body = body_to_vec(response.into_body()).await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Error bodies carry `success: false` and a message.
#[allow(dead_code)]
pub async fn error_message(response: hyper::Response<Body>) -> Result<String> {
    let body: serde_json::Value = read_json(response).await?;
    ensure!(
        body.get("success") == Some(&serde_json::Value::Bool(false)),
        "error body must report success=false: {body}"
    );
    body.get("message")
        .and_then(|message| message.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("error body has no message: {body}"))
}
