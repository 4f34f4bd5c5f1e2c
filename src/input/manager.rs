//! Input manager: loads job descriptions and resumes from disk

use crate::error::{Result, ResumeFitError};
use crate::input::file_detector::FileType;
use crate::input::job_text::TextJdParser;
use crate::input::text_extractor::{MarkdownExtractor, PlainTextExtractor, TextExtractor};
use crate::processing::document::JobDescription;
use log::info;
use std::path::Path;
use tokio::fs;

#[derive(Default)]
pub struct InputManager {
    text_parser: Option<Box<dyn TextJdParser>>,
}

impl InputManager {
    /// Manager without plain-text JD support
    pub fn new() -> Self {
        Self { text_parser: None }
    }

    pub fn with_text_parser(parser: Box<dyn TextJdParser>) -> Self {
        Self {
            text_parser: Some(parser),
        }
    }

    pub fn supports_text_jd(&self) -> bool {
        self.text_parser.is_some()
    }

    /// Load a JD object, or a `{"job": {...}}` record, from a JSON file
    pub async fn load_job_json(&self, path: &Path) -> Result<JobDescription> {
        ensure_exists(path)?;
        info!("Reading job description JSON: {}", path.display());
        let content = fs::read_to_string(path).await?;
        JobDescription::from_json_str(&content)
    }

    /// Parse a plain-text JD with the configured parser
    pub async fn load_job_text(&self, path: &Path) -> Result<JobDescription> {
        let parser = self.text_parser.as_deref().ok_or_else(|| {
            ResumeFitError::InvalidInput("plain-text job descriptions are not enabled".to_string())
        })?;
        ensure_exists(path)?;
        info!("Parsing plain-text job description: {}", path.display());
        let content = fs::read_to_string(path).await?;
        parser.parse(&content)
    }

    /// Resume text: markdown flattened to plain lines, anything else verbatim
    pub async fn read_resume(&self, path: &Path) -> Result<String> {
        ensure_exists(path)?;

        match FileType::from_path(path) {
            FileType::Markdown => {
                info!("Processing markdown resume: {}", path.display());
                MarkdownExtractor.extract(path).await
            }
            FileType::Text | FileType::Json | FileType::Unknown => {
                info!("Reading plain text resume: {}", path.display());
                PlainTextExtractor.extract(path).await
            }
        }
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ResumeFitError::InvalidInput(format!(
            "File does not exist: {}",
            path.display()
        )))
    }
}
