//! Scoring Client: rates extracted resume text against ATS heuristics.
//!
//! `AppState` carries the scorer as `Arc<dyn AtsScorer>` inside the
//! orchestrator so tests can swap in a fixed scorer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::extraction::ExtractedText;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{LlmClient, LlmError};

pub mod parse;
pub mod prompts;

pub use parse::{parse_score_response, ScoreParseError};
use prompts::{ATS_PROMPT_TEMPLATE, ATS_SYSTEM};

/// Longest resume text sent to the model, in characters.
pub const MAX_RESUME_CHARS: usize = 24_000;

/// The two fields the scoring contract allows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtsScore {
    pub ats_score: u8,
    pub feedback: Option<String>,
}

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("scoring service error: {0}")]
    Service(#[from] LlmError),

    #[error("could not parse score: {0}")]
    Parse(#[from] ScoreParseError),
}

#[async_trait]
pub trait AtsScorer: Send + Sync {
    async fn score(&self, text: &ExtractedText) -> Result<AtsScore, ScoringError>;
}

/// Scores through the chat-completion service. One call per invocation.
pub struct LlmAtsScorer {
    llm: LlmClient,
    system: String,
}

impl LlmAtsScorer {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            system: format!("{ATS_SYSTEM} {JSON_ONLY_INSTRUCTION}"),
        }
    }
}

#[async_trait]
impl AtsScorer for LlmAtsScorer {
    async fn score(&self, text: &ExtractedText) -> Result<AtsScore, ScoringError> {
        let prompt = build_prompt(text);
        let reply = self.llm.call_text(&prompt, &self.system).await.map_err(|e| {
            warn!(status = ?e.status(), "Scoring call failed: {e}");
            e
        })?;
        let score = parse_score_response(&reply).map_err(|e| {
            warn!("Unparseable scoring reply ({e}): {reply:.200}");
            e
        })?;
        debug!("Scored resume: ats_score={}", score.ats_score);
        Ok(score)
    }
}

/// Embeds the resume text, truncated to `MAX_RESUME_CHARS` on a char boundary.
pub fn build_prompt(text: &ExtractedText) -> String {
    let body = text.as_str();
    let body = match body.char_indices().nth(MAX_RESUME_CHARS) {
        Some((cut, _)) => {
            warn!(
                "Resume text truncated from {} to {} chars",
                text.char_count(),
                MAX_RESUME_CHARS
            );
            &body[..cut]
        }
        None => body,
    };
    ATS_PROMPT_TEMPLATE.replace("{resume_text}", body)
}
