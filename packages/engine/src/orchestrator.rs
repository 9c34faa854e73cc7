//! Response Scoring Orchestrator
//!
//! Splits a submission batch into selected-response items (matched
//! deterministically, no partial credit) and constructed-response items
//! (dispatched to the external rater concurrently, score capped to the
//! item's maximum). A failing rater call marks that item and never blocks
//! the rest of the batch.

use std::collections::HashMap;
use std::time::Duration;

use adaptest_algo::types::{Answer, Item, ItemBank, TaskKind};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::rater::{Rater, RaterError, RaterVerdict, SpeechRequest, WritingRequest};

/// Upper bound on in-flight rater calls per batch
const CR_CONCURRENCY: usize = 8;

/// Per-call rater deadline; a timeout counts as a rater failure
const CR_TIMEOUT_SECS: u64 = 45;

/// Target word count used when writing-item metadata is absent or malformed
const DEFAULT_TARGET_WORDS: u32 = 250;

/// Per-question scoring outcome, keyed by question id in the batch result.
/// Ordering across the map is insignificant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum QuestionScore {
    Selected {
        is_correct: bool,
    },
    Constructed {
        rubric_score: u32,
        max_score: u32,
        cefr_level: String,
        feedback: serde_json::Value,
        model_used: String,
    },
    /// Rater failure marker; other items in the batch still score
    Failed {
        reason: String,
    },
}

enum CrRequest {
    Speech(SpeechRequest),
    Writing(WritingRequest),
}

fn normalize(answer: &Answer) -> String {
    // drag-order / sentence-building answers compare as a joined phrase;
    // the join happens first, then the whole string is trimmed and lowercased
    let text = match answer {
        Answer::Text(text) => text.clone(),
        Answer::Parts(parts) => parts.join(" "),
    };
    text.trim().to_lowercase()
}

/// Exact match after normalization. An empty student answer is always
/// incorrect, even against an empty key; there is no fuzzy matching by
/// policy, so results stay auditable.
pub fn match_selected(correct_answer: &Answer, student_answer: &Answer) -> bool {
    let submitted = normalize(student_answer);
    if submitted.is_empty() {
        return false;
    }
    submitted == normalize(correct_answer)
}

fn answer_text(answer: &Answer) -> String {
    match answer {
        Answer::Text(text) => text.clone(),
        Answer::Parts(parts) => parts.join(" "),
    }
}

fn build_cr_request(item: &Item, answer: &Answer) -> Option<CrRequest> {
    match &item.task {
        TaskKind::Selected { .. } => None,
        TaskKind::Speaking { task, max_score } => Some(CrRequest::Speech(SpeechRequest {
            item_id: item.id.clone(),
            task: *task,
            max_score: *max_score,
            transcript: answer_text(answer),
        })),
        TaskKind::Writing {
            max_score,
            target_words,
        } => Some(CrRequest::Writing(WritingRequest {
            item_id: item.id.clone(),
            max_score: *max_score,
            target_words: target_words.unwrap_or(DEFAULT_TARGET_WORDS),
            essay: answer_text(answer),
        })),
    }
}

async fn dispatch<R: Rater + ?Sized>(
    rater: &R,
    request: &CrRequest,
) -> Result<RaterVerdict, RaterError> {
    match request {
        CrRequest::Speech(req) => rater.rate_speech(req).await,
        CrRequest::Writing(req) => rater.rate_writing(req).await,
    }
}

async fn grade_constructed<R: Rater + ?Sized>(
    rater: &R,
    item_id: &str,
    max_score: u32,
    request: CrRequest,
) -> QuestionScore {
    let deadline = Duration::from_secs(CR_TIMEOUT_SECS);
    match tokio::time::timeout(deadline, dispatch(rater, &request)).await {
        Ok(Ok(verdict)) => QuestionScore::Constructed {
            // never trust the rater to respect the cap
            rubric_score: verdict.raw_score.min(max_score),
            max_score,
            cefr_level: verdict.cefr_level,
            feedback: verdict.feedback,
            model_used: verdict.model_used,
        },
        Ok(Err(err)) => {
            warn!(item_id, error = %err, "rater call failed");
            QuestionScore::Failed {
                reason: err.to_string(),
            }
        }
        Err(_) => {
            warn!(item_id, "rater call timed out");
            QuestionScore::Failed {
                reason: format!("rater timed out after {CR_TIMEOUT_SECS}s"),
            }
        }
    }
}

/// Scores one submission batch against the item bank.
///
/// Unknown question ids are skipped without error; the item bank is allowed
/// to be partially inconsistent with in-flight sessions. All constructed
/// responses are rated concurrently, bounded by [`CR_CONCURRENCY`].
pub async fn score_submissions<R: Rater + ?Sized>(
    item_bank: &ItemBank,
    submissions: &HashMap<String, Answer>,
    rater: &R,
) -> HashMap<String, QuestionScore> {
    let mut results = HashMap::new();
    let mut pending = Vec::new();

    for (question_id, answer) in submissions {
        let Some(item) = item_bank.get(question_id) else {
            debug!(question_id = %question_id, "submission references unknown item, skipped");
            continue;
        };
        match &item.task {
            TaskKind::Selected { correct_answer } => {
                results.insert(
                    question_id.clone(),
                    QuestionScore::Selected {
                        is_correct: match_selected(correct_answer, answer),
                    },
                );
            }
            _ => {
                if let Some(request) = build_cr_request(item, answer) {
                    let max_score = item.max_score().unwrap_or(0);
                    pending.push((question_id.clone(), item.id.clone(), max_score, request));
                }
            }
        }
    }

    let graded: Vec<(String, QuestionScore)> = stream::iter(pending)
        .map(|(question_id, item_id, max_score, request)| async move {
            let score = grade_constructed(rater, &item_id, max_score, request).await;
            (question_id, score)
        })
        .buffer_unordered(CR_CONCURRENCY)
        .collect()
        .await;

    results.extend(graded);
    results
}
