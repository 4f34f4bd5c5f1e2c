//! Configuration management for the resume fit evaluator

use crate::error::{Result, ResumeFitError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_base: String,
    /// Falls back to `OPENAI_API_KEY` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub embedding: EmbeddingBackend,
    pub model2vec_model: String,
    pub hashing_dimensions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    Hashing,
    Model2vec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Console,
    Markdown,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                model: "gpt-4o-mini".to_string(),
                api_base: "https://api.openai.com/v1".to_string(),
                api_key: None,
                temperature: 0.0,
                top_p: 1.0,
                seed: Some(42),
                timeout_secs: 60,
            },
            retrieval: RetrievalConfig {
                top_k: 3,
                embedding: EmbeddingBackend::Hashing,
                model2vec_model: "minishlab/potion-base-8M".to_string(),
                hashing_dimensions: 512,
            },
            output: OutputConfig {
                format: OutputFormat::Json,
                color_output: true,
            },
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults on first use
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ResumeFitError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ResumeFitError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-fit")
            .join("config.toml")
    }

    fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(ResumeFitError::Configuration(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if self.retrieval.hashing_dimensions == 0 {
            return Err(ResumeFitError::Configuration(
                "retrieval.hashing_dimensions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
