use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::reference::DocumentReference;

/// Outcome of one successful orchestration. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub ats_score: Option<u8>,
    pub feedback: Option<String>,
    pub owner_id: String,
    pub document_ref: DocumentReference,
    pub created_at: DateTime<Utc>,
}

/// Why an orchestration ended in `AnalysisState::Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    InvalidReference,
    UnsupportedFormat,
    DocumentNotFound,
    StorageUnavailable,
    NoExtractableText,
    ScoringUnavailable,
    PersistenceError,
    Timeout,
}

impl FailureReason {
    /// Failures caused by the request itself rather than a dependency.
    pub fn is_caller_error(self) -> bool {
        matches!(
            self,
            FailureReason::InvalidReference
                | FailureReason::UnsupportedFormat
                | FailureReason::DocumentNotFound
                | FailureReason::NoExtractableText
        )
    }
}

/// Received → Fetched → Extracted → Scored → Completed, or Failed from any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    Received,
    Fetched,
    Extracted,
    Scored,
    Completed,
    Failed(FailureReason),
}

impl AnalysisState {
    pub fn is_terminal(self) -> bool {
        matches!(self, AnalysisState::Completed | AnalysisState::Failed(_))
    }
}
