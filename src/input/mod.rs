//! Input processing module
//! Handles file detection, text extraction, and job description / resume loading

pub mod file_detector;
pub mod job_text;
pub mod manager;
pub mod text_extractor;

pub use job_text::{HeuristicJdParser, TextJdParser};
pub use manager::InputManager;
