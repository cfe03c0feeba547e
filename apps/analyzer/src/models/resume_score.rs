use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One row of `resume_scores`, the per-user, append-only analysis history.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeScoreRow {
    pub id: Uuid,
    pub user_id: String,
    pub file_url: String,
    pub ats_score: Option<i32>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}
