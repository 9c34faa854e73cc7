//! External LLM rater client for constructed-response items.
//!
//! The orchestrator talks to raters through the [`Rater`] trait; [`LlmRater`]
//! is the production implementation over an OpenAI-compatible chat endpoint.
//! The rater's numeric output is advisory only: capping to `max_score`
//! happens in the orchestrator, never here.

use std::time::Duration;

use adaptest_algo::types::SpeechTask;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::sleep;
use tracing::warn;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_API_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_MS: u64 = 60_000;
const MAX_RETRIES: usize = 3;
const BASE_BACKOFF_MS: u64 = 200;

/// Speech rating request (interview / repeat tasks)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRequest {
    pub item_id: String,
    pub task: SpeechTask,
    pub max_score: u32,
    pub transcript: String,
}

/// Writing rating request; `target_words` is always resolved by the caller
/// (item metadata or the fixed default) before the request is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingRequest {
    pub item_id: String,
    pub max_score: u32,
    pub target_words: u32,
    pub essay: String,
}

/// What a rater reports back. `raw_score` is untrusted and may exceed the
/// item's maximum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaterVerdict {
    pub raw_score: u32,
    pub cefr_level: String,
    pub feedback: serde_json::Value,
    pub model_used: String,
}

#[derive(Debug, Error)]
pub enum RaterError {
    #[error("rater not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty response")]
    EmptyChoices,
    #[error("malformed verdict: {0}")]
    MalformedVerdict(String),
}

/// Seam between the orchestrator and concrete rater backends. Speech and
/// writing tasks are rated by different prompts, hence separate entry points.
#[async_trait]
pub trait Rater: Send + Sync {
    async fn rate_speech(&self, request: &SpeechRequest) -> Result<RaterVerdict, RaterError>;
    async fn rate_writing(&self, request: &WritingRequest) -> Result<RaterVerdict, RaterError>;
}

#[derive(Debug, Clone)]
struct RaterConfig {
    api_key: Option<String>,
    model: String,
    api_endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Shape the rubric prompts ask the model to emit
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireVerdict {
    raw_score: f64,
    cefr_level: Option<String>,
    #[serde(default)]
    feedback: serde_json::Value,
}

/// LLM-backed rater over an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct LlmRater {
    config: RaterConfig,
    client: reqwest::Client,
}

impl LlmRater {
    pub fn from_env() -> Self {
        let api_key = env_string("RATER_API_KEY");
        let model = env_string("RATER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_endpoint = normalize_endpoint(
            env_string("RATER_API_ENDPOINT").unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
        );
        let timeout =
            Duration::from_millis(env_u64("RATER_TIMEOUT_MS").unwrap_or(DEFAULT_TIMEOUT_MS));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            config: RaterConfig {
                api_key,
                model,
                api_endpoint,
            },
            client,
        }
    }

    pub fn is_available(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty())
    }

    async fn grade(&self, system: &str, user: &str) -> Result<RaterVerdict, RaterError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(RaterError::NotConfigured("RATER_API_KEY"))?;

        let url = format!(
            "{}/chat/completions",
            self.config.api_endpoint.trim_end_matches('/')
        );
        let messages = [
            ChatMessage {
                role: "system".into(),
                content: system.into(),
            },
            ChatMessage {
                role: "user".into(),
                content: user.into(),
            },
        ];
        let payload = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "stream": false
        });

        let response = self.post_with_retry(&url, api_key, &payload).await?;
        let content = response
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or(RaterError::EmptyChoices)?;
        let model_used = response
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone());
        parse_verdict(content, model_used)
    }

    async fn post_with_retry(
        &self,
        url: &str,
        api_key: &str,
        payload: &serde_json::Value,
    ) -> Result<ChatResponse, RaterError> {
        let mut last_error: Option<RaterError> = None;

        for retry in 0..=MAX_RETRIES {
            match self
                .client
                .post(url)
                .bearer_auth(api_key)
                .json(payload)
                .send()
                .await
            {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp.json::<ChatResponse>().await?);
                    }
                    let body = resp.text().await.unwrap_or_default();
                    let err = RaterError::HttpStatus { status, body };
                    if retry < MAX_RETRIES && is_retryable(status) {
                        let backoff = Duration::from_millis(BASE_BACKOFF_MS * (1 << retry));
                        warn!(retry, ?status, "rater request failed, retrying");
                        sleep(backoff).await;
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    let err = RaterError::Request(e);
                    if retry < MAX_RETRIES {
                        let backoff = Duration::from_millis(BASE_BACKOFF_MS * (1 << retry));
                        warn!(retry, "rater request error, retrying");
                        sleep(backoff).await;
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
            }
        }
        Err(last_error.unwrap_or(RaterError::NotConfigured("unknown")))
    }
}

#[async_trait]
impl Rater for LlmRater {
    async fn rate_speech(&self, request: &SpeechRequest) -> Result<RaterVerdict, RaterError> {
        let task_name = match request.task {
            SpeechTask::Interview => "an interview question",
            SpeechTask::Repeat => "a sentence-repetition task",
        };
        let system = format!(
            "You are an English speaking examiner grading the transcript of {task_name}. \
             Score 0..{max} and estimate a CEFR level. Respond with JSON only: \
             {{\"rawScore\": <int>, \"cefrLevel\": \"<A1..C2>\", \"feedback\": {{...}}}}",
            max = request.max_score
        );
        self.grade(&system, &request.transcript).await
    }

    async fn rate_writing(&self, request: &WritingRequest) -> Result<RaterVerdict, RaterError> {
        let system = format!(
            "You are an English writing examiner. The essay targets {words} words. \
             Score 0..{max} and estimate a CEFR level. Respond with JSON only: \
             {{\"rawScore\": <int>, \"cefrLevel\": \"<A1..C2>\", \"feedback\": {{...}}}}",
            words = request.target_words,
            max = request.max_score
        );
        self.grade(&system, &request.essay).await
    }
}

/// Models wrap JSON in markdown fences often enough that stripping them is
/// cheaper than re-prompting.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

fn parse_verdict(content: &str, model_used: String) -> Result<RaterVerdict, RaterError> {
    let body = strip_code_fences(content);
    let wire: WireVerdict = serde_json::from_str(body)
        .map_err(|e| RaterError::MalformedVerdict(format!("{e}: {body}")))?;
    if !wire.raw_score.is_finite() || wire.raw_score < 0.0 {
        return Err(RaterError::MalformedVerdict(format!(
            "rawScore out of range: {}",
            wire.raw_score
        )));
    }
    Ok(RaterVerdict {
        raw_score: wire.raw_score.round() as u32,
        cefr_level: wire.cefr_level.unwrap_or_else(|| "unknown".to_string()),
        feedback: wire.feedback,
        model_used,
    })
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.parse().ok()
}

fn normalize_endpoint(endpoint: String) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.ends_with("/v1") || trimmed.contains("/v1/") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v1")
    }
}

fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}
