//! In-memory collaborators for orchestrator and router tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::analysis::orchestrator::{Analyzer, Deadlines};
use crate::analysis::reference::DocumentReference;
use crate::analysis::result::AnalysisResult;
use crate::analysis::store::{ResultStore, StoreError};
use crate::extraction::{ExtractedText, Extractors};
use crate::models::resume_score::ResumeScoreRow;
use crate::scoring::{AtsScore, AtsScorer, ScoringError};
use crate::storage::{DocumentFetcher, FetchError};

pub fn analyzer(fetcher: Arc<CountingFetcher>, scorer: Arc<FixedScorer>) -> Analyzer {
    Analyzer::new(fetcher, scorer, Extractors::default(), Deadlines::default())
}

/// Serves the same bytes for every reference and counts calls.
pub struct CountingFetcher {
    bytes: Option<Bytes>,
    calls: AtomicUsize,
}

impl CountingFetcher {
    pub fn new(bytes: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            bytes: Some(Bytes::from(bytes)),
            calls: AtomicUsize::new(0),
        })
    }

    /// Every fetch reports the object as missing.
    pub fn missing() -> Arc<Self> {
        Arc::new(Self {
            bytes: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentFetcher for CountingFetcher {
    async fn fetch(&self, reference: &DocumentReference) -> Result<Bytes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bytes
            .clone()
            .ok_or_else(|| FetchError::NotFound(reference.to_string()))
    }
}

pub struct SlowFetcher(pub Duration);

#[async_trait]
impl DocumentFetcher for SlowFetcher {
    async fn fetch(&self, _reference: &DocumentReference) -> Result<Bytes, FetchError> {
        tokio::time::sleep(self.0).await;
        Ok(Bytes::new())
    }
}

/// Always returns the same score and records the text it was given.
pub struct FixedScorer {
    score: AtsScore,
    seen: Mutex<Vec<String>>,
}

impl FixedScorer {
    pub fn new(ats_score: u8, feedback: &str) -> Arc<Self> {
        Arc::new(Self {
            score: AtsScore {
                ats_score,
                feedback: Some(feedback.to_string()),
            },
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl AtsScorer for FixedScorer {
    async fn score(&self, text: &ExtractedText) -> Result<AtsScore, ScoringError> {
        self.seen.lock().unwrap().push(text.as_str().to_string());
        Ok(self.score.clone())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<ResumeScoreRow>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn append(&self, result: &AnalysisResult) -> Result<ResumeScoreRow, StoreError> {
        let row = ResumeScoreRow {
            id: Uuid::new_v4(),
            user_id: result.owner_id.clone(),
            file_url: result.document_ref.to_string(),
            ats_score: result.ats_score.map(i32::from),
            feedback: result.feedback.clone(),
            created_at: result.created_at,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn history(&self, owner_id: &str, limit: i64) -> Result<Vec<ResumeScoreRow>, StoreError> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

pub struct FailingStore;

#[async_trait]
impl ResultStore for FailingStore {
    async fn append(&self, _result: &AnalysisResult) -> Result<ResumeScoreRow, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn history(&self, _owner_id: &str, _limit: i64) -> Result<Vec<ResumeScoreRow>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}
