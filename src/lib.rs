//! Resume fit evaluator library
//!
//! Scores a resume against a job description and always yields an
//! [`output::AssignmentOutput`] that validates against the fixed output schema.

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod processing;

pub use config::Config;
pub use error::{Result, ResumeFitError};
