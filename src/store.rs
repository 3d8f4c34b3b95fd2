use anyhow::anyhow;
use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{prelude::*, select, PgConnection};
use uuid::Uuid;

use crate::db::PgPool;
use crate::models::{NewSubmission, ReviewUpdate, Submission, SubmissionSummary};
use crate::schema::submissions;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("passkey already in use")]
    DuplicatePasskey,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<DieselError> for StoreError {
    fn from(value: DieselError) -> Self {
        match value {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                StoreError::DuplicatePasskey
            }
            other => StoreError::Backend(anyhow::Error::new(other)),
        }
    }
}

/// Persistence for submission records.
///
/// Every method is a single store operation; callers compose them without
/// any surrounding transaction.
#[async_trait]
pub trait SubmissionStore: Send + Sync + 'static {
    /// Inserts the record and returns the identifier assigned by the store.
    /// Fails with [`StoreError::DuplicatePasskey`] when the passkey is taken.
    async fn insert(&self, submission: NewSubmission) -> StoreResult<Uuid>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Submission>>;

    async fn find_by_passkey(&self, passkey: &str) -> StoreResult<Option<Submission>>;

    async fn passkey_exists(&self, passkey: &str) -> StoreResult<bool>;

    async fn list(&self) -> StoreResult<Vec<SubmissionSummary>>;

    /// Returns `false` when no record matched `id`.
    async fn update(&self, id: Uuid, change: ReviewUpdate) -> StoreResult<bool>;

    /// Returns `false` when no record matched `id`.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Returns the number of removed records.
    async fn delete_all(&self) -> StoreResult<usize>;
}

pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("database pool error: {err}"))?;
            f(&mut conn)
        })
        .await
        .map_err(|err| anyhow!("database task failed: {err}"))?
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn insert(&self, submission: NewSubmission) -> StoreResult<Uuid> {
        self.with_conn(move |conn| {
            let id = diesel::insert_into(submissions::table)
                .values(&submission)
                .returning(submissions::id)
                .get_result(conn)?;
            Ok(id)
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Submission>> {
        self.with_conn(move |conn| {
            let found = submissions::table
                .find(id)
                .first::<Submission>(conn)
                .optional()?;
            Ok(found)
        })
        .await
    }

    async fn find_by_passkey(&self, passkey: &str) -> StoreResult<Option<Submission>> {
        let passkey = passkey.to_string();
        self.with_conn(move |conn| {
            let found = submissions::table
                .filter(submissions::passkey.eq(&passkey))
                .first::<Submission>(conn)
                .optional()?;
            Ok(found)
        })
        .await
    }

    async fn passkey_exists(&self, passkey: &str) -> StoreResult<bool> {
        let passkey = passkey.to_string();
        self.with_conn(move |conn| {
            let taken: bool = select(exists(
                submissions::table.filter(submissions::passkey.eq(&passkey)),
            ))
            .get_result(conn)?;
            Ok(taken)
        })
        .await
    }

    async fn list(&self) -> StoreResult<Vec<SubmissionSummary>> {
        self.with_conn(|conn| {
            let rows = submissions::table
                .select((
                    submissions::id,
                    submissions::filename,
                    submissions::status,
                    submissions::passkey,
                    submissions::feedback,
                    submissions::category,
                    submissions::uploaded_at,
                ))
                .order(submissions::uploaded_at.desc())
                .load::<SubmissionSummary>(conn)?;
            Ok(rows)
        })
        .await
    }

    async fn update(&self, id: Uuid, change: ReviewUpdate) -> StoreResult<bool> {
        self.with_conn(move |conn| {
            let target = diesel::update(submissions::table.find(id));
            let matched = match change {
                ReviewUpdate::Status(status) => {
                    target.set(submissions::status.eq(status)).execute(conn)?
                }
                ReviewUpdate::Feedback(feedback) => target
                    .set(submissions::feedback.eq(Some(feedback)))
                    .execute(conn)?,
            };
            Ok(matched > 0)
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        self.with_conn(move |conn| {
            let removed = diesel::delete(submissions::table.find(id)).execute(conn)?;
            Ok(removed > 0)
        })
        .await
    }

    async fn delete_all(&self) -> StoreResult<usize> {
        self.with_conn(|conn| {
            let removed = diesel::delete(submissions::table).execute(conn)?;
            Ok(removed)
        })
        .await
    }
}
