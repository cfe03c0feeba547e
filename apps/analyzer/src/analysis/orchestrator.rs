//! Analysis Orchestrator: drives one resume through the pipeline.
//!
//! Flow: parse reference → fetch bytes → extract text → score → persist.
//!
//! Each stage consumes the previous stage's output, so the pipeline is strictly
//! sequential and stops at the first failure. Nothing is retried here. Fetch and
//! scoring run under their own deadline. Dropping the returned future (client
//! disconnect) drops any in-flight fetch or scoring call with it.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::analysis::reference::{DocumentReference, ReferenceError};
use crate::analysis::result::{AnalysisResult, AnalysisState, FailureReason};
use crate::analysis::store::{ResultStore, StoreError};
use crate::extraction::{ExtractedText, ExtractionError, Extractors};
use crate::scoring::{AtsScore, AtsScorer, ScoringError};
use crate::storage::{DocumentFetcher, FetchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    pub fetch: Duration,
    pub scoring: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            fetch: Duration::from_secs(5),
            scoring: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("document contains no extractable text")]
    EmptyText,

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("failed to persist analysis: {0}")]
    Persistence(#[from] StoreError),

    #[error("{stage} exceeded its {}s deadline", .after.as_secs())]
    Timeout {
        stage: &'static str,
        after: Duration,
    },
}

impl AnalysisError {
    pub fn reason(&self) -> FailureReason {
        match self {
            AnalysisError::Reference(ReferenceError::UnsupportedFormat { .. }) => {
                FailureReason::UnsupportedFormat
            }
            AnalysisError::Reference(_) => FailureReason::InvalidReference,
            AnalysisError::Fetch(FetchError::NotFound(_)) => FailureReason::DocumentNotFound,
            AnalysisError::Fetch(FetchError::TransientIo(_)) => FailureReason::StorageUnavailable,
            AnalysisError::Extraction(_) | AnalysisError::EmptyText => {
                FailureReason::NoExtractableText
            }
            AnalysisError::Scoring(_) => FailureReason::ScoringUnavailable,
            AnalysisError::Persistence(_) => FailureReason::PersistenceError,
            AnalysisError::Timeout { .. } => FailureReason::Timeout,
        }
    }
}

/// Terminal `Failed` outcome of one orchestration.
///
/// `result` is only set for `PersistenceError`: scoring succeeded and the
/// caller still gets the score even though the write did not happen.
#[derive(Debug, Error)]
#[error("analysis of '{reference}' failed after {reached:?}: {error}")]
pub struct AnalysisFailure {
    pub reference: String,
    pub reached: AnalysisState,
    #[source]
    pub error: AnalysisError,
    pub result: Option<AnalysisResult>,
}

impl AnalysisFailure {
    pub fn reason(&self) -> FailureReason {
        self.error.reason()
    }

    pub fn state(&self) -> AnalysisState {
        AnalysisState::Failed(self.reason())
    }
}

/// Tracks the state machine for a single call.
struct Run<'a> {
    reference: &'a str,
    state: AnalysisState,
}

impl<'a> Run<'a> {
    fn new(reference: &'a str) -> Self {
        debug!("Analysis received for '{reference}'");
        Self {
            reference,
            state: AnalysisState::Received,
        }
    }

    fn advance(&mut self, next: AnalysisState) {
        debug_assert!(
            !self.state.is_terminal(),
            "advanced past terminal state {:?}",
            self.state
        );
        debug!("Analysis of '{}': {:?} -> {:?}", self.reference, self.state, next);
        self.state = next;
    }

    fn fail(&self, error: AnalysisError, result: Option<AnalysisResult>) -> AnalysisFailure {
        let failure = AnalysisFailure {
            reference: self.reference.to_string(),
            reached: self.state,
            error,
            result,
        };
        if failure.reason().is_caller_error() {
            warn!(
                "Analysis of '{}': {:?} -> {:?}: {}",
                self.reference,
                self.state,
                failure.state(),
                failure.error
            );
        } else {
            error!(
                "Analysis of '{}': {:?} -> {:?}: {}",
                self.reference,
                self.state,
                failure.state(),
                failure.error
            );
        }
        failure
    }
}

pub struct Analyzer {
    fetcher: Arc<dyn DocumentFetcher>,
    scorer: Arc<dyn AtsScorer>,
    store: Option<Arc<dyn ResultStore>>,
    extractors: Extractors,
    deadlines: Deadlines,
}

impl Analyzer {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        scorer: Arc<dyn AtsScorer>,
        extractors: Extractors,
        deadlines: Deadlines,
    ) -> Self {
        Self {
            fetcher,
            scorer,
            store: None,
            extractors,
            deadlines,
        }
    }

    /// Enables server-side persistence of every completed analysis.
    pub fn with_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn persists(&self) -> bool {
        self.store.is_some()
    }

    /// Runs the pipeline exactly once for `raw_reference`.
    pub async fn analyze(&self, raw_reference: &str) -> Result<AnalysisResult, AnalysisFailure> {
        let mut run = Run::new(raw_reference);

        // Format is validated before any I/O.
        let reference = DocumentReference::parse(raw_reference)
            .map_err(|e| run.fail(e.into(), None))?;

        let bytes = self
            .fetch(&reference)
            .await
            .map_err(|e| run.fail(e, None))?;
        run.advance(AnalysisState::Fetched);

        let text = self
            .extract(&reference, bytes)
            .await
            .map_err(|e| run.fail(e, None))?;
        run.advance(AnalysisState::Extracted);

        let score = self.score(&text).await.map_err(|e| run.fail(e, None))?;
        run.advance(AnalysisState::Scored);

        let result = AnalysisResult {
            ats_score: Some(score.ats_score),
            feedback: score.feedback,
            owner_id: reference.owner_id().to_string(),
            document_ref: reference,
            created_at: Utc::now(),
        };

        if let Some(store) = &self.store {
            if let Err(e) = store.append(&result).await {
                return Err(run.fail(e.into(), Some(result)));
            }
        }
        run.advance(AnalysisState::Completed);

        info!(
            "Analysis completed for user {}: ats_score={}",
            result.owner_id, score.ats_score
        );
        Ok(result)
    }

    async fn fetch(&self, reference: &DocumentReference) -> Result<Bytes, AnalysisError> {
        match timeout(self.deadlines.fetch, self.fetcher.fetch(reference)).await {
            Ok(fetched) => Ok(fetched?),
            Err(_) => Err(AnalysisError::Timeout {
                stage: "fetch",
                after: self.deadlines.fetch,
            }),
        }
    }

    /// CPU-bound parsing runs on the blocking pool; a parser panic becomes an
    /// `ExtractionError` instead of taking the worker down.
    async fn extract(
        &self,
        reference: &DocumentReference,
        bytes: Bytes,
    ) -> Result<ExtractedText, AnalysisError> {
        let extractors = self.extractors;
        let format = reference.format();
        let text = tokio::task::spawn_blocking(move || {
            extractors.for_format(format).extract_text(&bytes)
        })
        .await
        .map_err(|e| ExtractionError::Aborted(e.to_string()))??;

        if text.is_empty() {
            return Err(AnalysisError::EmptyText);
        }
        debug!(
            "Extracted {} chars of {format} from '{reference}'",
            text.char_count()
        );
        Ok(text)
    }

    async fn score(&self, text: &ExtractedText) -> Result<AtsScore, AnalysisError> {
        match timeout(self.deadlines.scoring, self.scorer.score(text)).await {
            Ok(scored) => Ok(scored?),
            Err(_) => Err(AnalysisError::Timeout {
                stage: "scoring",
                after: self.deadlines.scoring,
            }),
        }
    }
}
