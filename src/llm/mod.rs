//! LLM integration: chat client seam, prompt builder, scoring and repair calls

pub mod client;
pub mod evaluator;
pub mod prompts;

pub use client::{ChatClient, ChatMessage, ChatRequest, LlmError, OpenAiClient};
pub use evaluator::{generate_scores, repair_json, LlmFailure, LlmSettings};
