//! JSON-mode scoring call and the single repair call

use crate::config::LlmConfig;
use crate::error::ResumeFitError;
use crate::llm::client::{ChatClient, ChatMessage, ChatRequest, LlmError};
use crate::llm::prompts::build_repair_prompt;
use log::debug;
use serde_json::Value;
use thiserror::Error;

const SCORING_SYSTEM_MESSAGE: &str =
    "You return one JSON object that validates against the given schema. No extra text.";
const REPAIR_SYSTEM_MESSAGE: &str = "You return one corrected JSON object. No extra text.";

const CONTENT_PREVIEW_CHARS: usize = 200;

/// Sampling parameters for every call in one run
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub seed: Option<u64>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            top_p: 1.0,
            seed: Some(42),
        }
    }
}

impl From<&LlmConfig> for LlmSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            seed: config.seed,
        }
    }
}

impl LlmSettings {
    fn request(&self, system: &str, user: String) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
            seed: self.seed,
            json_mode: true,
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        }
    }
}

/// Why an LLM stage produced no JSON value
#[derive(Debug, Error)]
pub enum LlmFailure {
    #[error("LLM call failed: {0}")]
    Transport(#[from] LlmError),

    #[error("LLM returned non-JSON content: {preview}...")]
    Parse { preview: String },
}

impl From<LlmFailure> for ResumeFitError {
    fn from(failure: LlmFailure) -> Self {
        match failure {
            LlmFailure::Transport(e) => ResumeFitError::LlmCall(e.to_string()),
            LlmFailure::Parse { preview } => ResumeFitError::LlmParse(format!("{}...", preview)),
        }
    }
}

/// Ask for scores in JSON mode and parse the reply into a JSON value
pub async fn generate_scores(
    client: &dyn ChatClient,
    settings: &LlmSettings,
    prompt: &str,
) -> Result<Value, LlmFailure> {
    debug!("[llm] scoring call (model={}, seed={:?})", settings.model, settings.seed);
    let request = settings.request(SCORING_SYSTEM_MESSAGE, prompt.to_string());
    let content = client.complete(&request).await?;
    parse_content(&content)
}

/// One repair call quoting the invalid JSON and its validation errors
pub async fn repair_json(
    client: &dyn ChatClient,
    settings: &LlmSettings,
    bad_json: &str,
    errors: &[String],
) -> Result<Value, LlmFailure> {
    debug!("[llm] repair call ({} errors)", errors.len());
    let request = settings.request(REPAIR_SYSTEM_MESSAGE, build_repair_prompt(bad_json, errors));
    let content = client.complete(&request).await?;
    parse_content(&content)
}

/// Empty content reads as `{}`; whitespace alone is not JSON
fn parse_content(content: &str) -> Result<Value, LlmFailure> {
    let text = if content.is_empty() { "{}" } else { content };
    serde_json::from_str(text).map_err(|_| LlmFailure::Parse {
        preview: content.chars().take(CONTENT_PREVIEW_CHARS).collect(),
    })
}
