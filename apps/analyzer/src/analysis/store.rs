//! Result Store: append-only, per-user history of analyses.
//!
//! CRITICAL: rows are only ever INSERTed. Never UPDATE an existing analysis.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::analysis::result::AnalysisResult;
use crate::models::resume_score::ResumeScoreRow;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn append(&self, result: &AnalysisResult) -> Result<ResumeScoreRow, StoreError>;

    /// Newest first.
    async fn history(&self, owner_id: &str, limit: i64) -> Result<Vec<ResumeScoreRow>, StoreError>;
}

pub struct PgResultStore {
    pool: PgPool,
}

impl PgResultStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultStore for PgResultStore {
    async fn append(&self, result: &AnalysisResult) -> Result<ResumeScoreRow, StoreError> {
        let row = sqlx::query_as::<_, ResumeScoreRow>(
            r#"
            INSERT INTO resume_scores (id, user_id, file_url, ats_score, feedback, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, file_url, ats_score, feedback, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&result.owner_id)
        .bind(result.document_ref.as_str())
        .bind(result.ats_score.map(i32::from))
        .bind(&result.feedback)
        .bind(result.created_at)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Inserted resume score {} for user {}",
            row.id, row.user_id
        );
        Ok(row)
    }

    async fn history(&self, owner_id: &str, limit: i64) -> Result<Vec<ResumeScoreRow>, StoreError> {
        Ok(sqlx::query_as::<_, ResumeScoreRow>(
            r#"
            SELECT id, user_id, file_url, ats_score, feedback, created_at
            FROM resume_scores
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }
}
