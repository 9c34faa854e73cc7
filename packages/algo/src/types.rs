//! Common Types and Constants
//!
//! Shared data structures used across the scoring modules.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Logistic scaling constant approximating the normal-ogive model.
/// Must stay at 1.702 for comparability with external calibration data.
pub const SCALING_D: f64 = 1.702;

/// Responses faster than this are treated as rapid guesses
pub const RAPID_GUESS_MS: i64 = 3000;

/// Rapid-guess share above which the penalty activates
pub const RAPID_GUESS_SHARE: f64 = 0.30;

/// Discrimination floor applied to rapid-guessed responses
pub const RAPID_GUESS_DISCRIMINATION: f64 = 0.01;

/// Rubric-score fraction of max_score counted as a correct response
/// when constructed-response evidence is folded into ability estimation
pub const CR_PASS_RATIO: f64 = 0.6;

// ==================== Item Types ====================

/// Three-parameter-logistic item parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Irt3pl {
    /// Discrimination, typical range 0.5-2.5
    pub a: f64,
    /// Difficulty, typical range -3.0..+3.0
    pub b: f64,
    /// Pseudo-guessing floor: 0.25 for four-option multiple choice,
    /// 0.0 for open responses
    pub c: f64,
}

/// Stored correct answer for a selected-response item. Drag-order and
/// sentence-building items store an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    Parts(Vec<String>),
}

/// Speech-based constructed-response task family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechTask {
    Interview,
    Repeat,
}

/// Task payload, one variant per scoring family. Validated at item-bank
/// load time; scoring code never does dynamic key lookups into raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TaskKind {
    /// Deterministically matched answer
    Selected { correct_answer: Answer },
    /// LLM-rated speech task
    Speaking { task: SpeechTask, max_score: u32 },
    /// LLM-rated writing task; `target_words` comes from item metadata
    /// and may be absent
    Writing {
        max_score: u32,
        target_words: Option<u32>,
    },
}

/// A calibrated, scorable question instance. Immutable at scoring time:
/// the rapid-guess penalty overrides discrimination per likelihood term,
/// never by mutating the item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub params: Irt3pl,
    pub task: TaskKind,
}

impl Item {
    pub fn is_constructed(&self) -> bool {
        !matches!(self.task, TaskKind::Selected { .. })
    }

    pub fn max_score(&self) -> Option<u32> {
        match self.task {
            TaskKind::Selected { .. } => None,
            TaskKind::Speaking { max_score, .. } | TaskKind::Writing { max_score, .. } => {
                Some(max_score)
            }
        }
    }
}

/// Calibrated item bank keyed by item id
pub type ItemBank = HashMap<String, Item>;

// ==================== Response Types ====================

/// One examinee answer to one item within a single closed session.
/// Created at submission time and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub item_id: String,
    pub is_correct: bool,
    /// Elapsed response time in milliseconds
    pub response_time_ms: i64,
}

impl ResponseRecord {
    pub fn new(item_id: impl Into<String>, is_correct: bool, response_time_ms: i64) -> Self {
        Self {
            item_id: item_id.into(),
            is_correct,
            response_time_ms,
        }
    }

    /// Folds an externally obtained rubric score into the binary-correctness
    /// evidence the estimator understands.
    pub fn from_rubric(
        item_id: impl Into<String>,
        rubric_score: u32,
        max_score: u32,
        response_time_ms: i64,
    ) -> Self {
        let pass_mark = (max_score as f64 * CR_PASS_RATIO).ceil() as u32;
        Self::new(item_id, rubric_score >= pass_mark.max(1), response_time_ms)
    }

    pub fn is_rapid(&self) -> bool {
        self.response_time_ms < RAPID_GUESS_MS
    }
}
