//! Resume parsing, evidence retrieval and rule-based scoring

pub mod document;
pub mod embeddings;
pub mod resume_parser;
pub mod retriever;
pub mod scorer;
