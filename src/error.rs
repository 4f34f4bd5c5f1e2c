//! Error handling for the resume fit evaluator

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResumeFitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("LLM call failed: {0}")]
    LlmCall(String),

    #[error("LLM returned non-JSON content: {0}")]
    LlmParse(String),

    #[error("Schema validation failed: {}", .0.join("; "))]
    SchemaValidation(Vec<String>),

    #[error("Rule-based scorer produced an invalid report: {}", .0.join("; "))]
    ScorerDefect(Vec<String>),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, ResumeFitError>;

/// Convert anyhow errors (surfaced by the Model2Vec loader) to our error type
impl From<anyhow::Error> for ResumeFitError {
    fn from(err: anyhow::Error) -> Self {
        ResumeFitError::Embedding(err.to_string())
    }
}
