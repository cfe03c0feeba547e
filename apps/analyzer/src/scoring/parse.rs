//! Resilient parsing of the scoring service's reply.
//!
//! The reply should be one JSON object. When the model wraps it in prose or
//! code fences, the first balanced `{...}` block is decoded instead. A reply
//! without a usable integer score is an error, never a default.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::AtsScore;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoreParseError {
    #[error("response contains no JSON object")]
    NoJsonObject,

    #[error("response JSON is invalid: {0}")]
    InvalidJson(String),

    #[error("response has no ats_score")]
    MissingScore,

    #[error("ats_score {0} is not an integer")]
    NotInteger(String),

    #[error("ats_score {0} is outside 0..=100")]
    OutOfRange(i64),
}

#[derive(Debug, Deserialize)]
struct RawScore {
    #[serde(default, alias = "score", alias = "atsScore")]
    ats_score: Option<Value>,
    #[serde(default)]
    feedback: Option<Value>,
}

pub fn parse_score_response(text: &str) -> Result<AtsScore, ScoreParseError> {
    let text = text.trim();
    let raw: RawScore = match serde_json::from_str(text) {
        Ok(raw) => raw,
        Err(_) => {
            let block = first_json_object(text).ok_or(ScoreParseError::NoJsonObject)?;
            serde_json::from_str(block).map_err(|e| ScoreParseError::InvalidJson(e.to_string()))?
        }
    };

    let ats_score = match raw.ats_score {
        Some(value) => score_from_value(&value)?,
        None => return Err(ScoreParseError::MissingScore),
    };

    Ok(AtsScore {
        ats_score,
        feedback: raw.feedback.as_ref().and_then(feedback_from_value),
    })
}

fn score_from_value(value: &Value) -> Result<u8, ScoreParseError> {
    let score = match value {
        Value::Null => return Err(ScoreParseError::MissingScore),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i,
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e9 => f as i64,
            _ => return Err(ScoreParseError::NotInteger(n.to_string())),
        },
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ScoreParseError::NotInteger(s.clone()))?,
        other => return Err(ScoreParseError::NotInteger(other.to_string())),
    };
    u8::try_from(score)
        .ok()
        .filter(|s| *s <= 100)
        .ok_or(ScoreParseError::OutOfRange(score))
}

fn feedback_from_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::trim))
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

/// The first `{` and its matching `}`, skipping braces inside JSON strings.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}
