//! # adaptest-engine - response scoring orchestration
//!
//! Service-side glue around [`adaptest_algo`]: splits a submission batch into
//! deterministically matched selected-response items and LLM-rated
//! constructed-response items, fans the rater calls out concurrently, and
//! enforces the scoring policies (answer normalization, max-score capping,
//! per-item failure markers).
//!
//! This crate is a library consumed by an HTTP layer; it owns no routes, no
//! persistence, and no tracing subscriber.

pub mod orchestrator;
pub mod rater;
pub mod throttle;

pub use orchestrator::{match_selected, score_submissions, QuestionScore};
pub use rater::{LlmRater, Rater, RaterError, RaterVerdict, SpeechRequest, WritingRequest};
pub use throttle::{Clock, SubmissionThrottle, SystemClock};
