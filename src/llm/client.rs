//! Chat completion seam and the OpenAI-compatible HTTP client behind it

use crate::error::{Result, ResumeFitError};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM response carried no choices")]
    EmptyContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Provider-neutral chat completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub seed: Option<u64>,
    /// Ask the provider for a single JSON object
    pub json_mode: bool,
    pub messages: Vec<ChatMessage>,
}

/// Anything that can answer a chat completion with raw text
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> std::result::Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Client for `POST {api_base}/chat/completions` with bearer auth
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(api_base: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResumeFitError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> std::result::Result<String, LlmError> {
        let body = CompletionBody {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            top_p: request.top_p,
            seed: request.seed,
            response_format: request.json_mode.then_some(ResponseFormat { kind: "json_object" }),
        };

        debug!("[llm] POST {} model={}", self.endpoint(), request.model);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        let choice = completion.choices.into_iter().next().ok_or(LlmError::EmptyContent)?;

        // A null content is read as an empty object
        Ok(choice.message.content.unwrap_or_else(|| "{}".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_json_mode_and_seed() {
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let body = CompletionBody {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.0,
            top_p: 1.0,
            seed: Some(42),
            response_format: Some(ResponseFormat { kind: "json_object" }),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["response_format"], json!({ "type": "json_object" }));
        assert_eq!(value["seed"], json!(42));
        assert_eq!(value["messages"][0]["role"], json!("system"));
        assert_eq!(value["messages"][1]["content"], json!("u"));
    }

    #[test]
    fn test_body_omits_absent_seed() {
        let body = CompletionBody {
            model: "m",
            messages: &[],
            temperature: 0.0,
            top_p: 1.0,
            seed: None,
            response_format: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("seed").is_none());
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn test_response_with_null_content_parses() {
        let parsed: CompletionResponse =
            serde_json::from_value(json!({ "choices": [{ "message": { "role": "assistant", "content": null } }] }))
                .unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = OpenAiClient::new("http://localhost:8080/v1/", "k", Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }
}
