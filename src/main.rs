//! resume-fit: score a resume against a job description and emit schema-valid JSON

use clap::Parser;
use log::{debug, error, info, warn};
use resume_fit::cli::{self, Cli, Commands, ConfigAction};
use resume_fit::config::{Config, LlmConfig};
use resume_fit::error::{Result, ResumeFitError};
use resume_fit::input::{HeuristicJdParser, InputManager};
use resume_fit::llm::{ChatClient, LlmSettings, OpenAiClient};
use resume_fit::output::{get_schema, save_report_to_file, ReportGenerator, SchemaValidator};
use resume_fit::pipeline::{Pipeline, PipelineSettings, ReportSource, ScoringMode};
use resume_fit::processing::embeddings::{embedder_from_config, Embedder};
use resume_fit::processing::retriever::InMemoryIndex;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

const EXIT_ERROR: i32 = 1;
const EXIT_INVALID_RESULT: i32 = 2;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Load configuration
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(EXIT_ERROR);
        }
    };

    // Execute command
    if let Err(e) = run_command(cli.command, config, cli.config).await {
        error!("{}", e);
        let code = match e {
            ResumeFitError::ScorerDefect(_) | ResumeFitError::SchemaValidation(_) => EXIT_INVALID_RESULT,
            _ => EXIT_ERROR,
        };
        process::exit(code);
    }
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) if path.exists() => Config::load_from(path),
        Some(path) => {
            warn!("Config file {} not found; using defaults", path.display());
            Ok(Config::default())
        }
        None => Config::load(),
    }
}

async fn run_command(command: Commands, config: Config, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Evaluate {
            jd,
            jd_txt,
            resume,
            out,
            mode,
            k,
            model,
            seed,
            print_prompt,
            format,
        } => {
            let input_manager = InputManager::with_text_parser(Box::new(HeuristicJdParser::new()));

            let job = match (jd, jd_txt) {
                (Some(path), _) => input_manager.load_job_json(&path).await?,
                (None, Some(path)) => input_manager.load_job_text(&path).await?,
                (None, None) => {
                    return Err(ResumeFitError::InvalidInput(
                        "one of --jd or --jd-txt is required".to_string(),
                    ))
                }
            };
            let resume_text = input_manager.read_resume(&resume).await?;

            let output_format = match format {
                Some(f) => cli::parse_output_format(&f).map_err(ResumeFitError::InvalidInput)?,
                None => config.output.format,
            };

            let top_k = k.unwrap_or(config.retrieval.top_k);
            if top_k == 0 {
                return Err(ResumeFitError::InvalidInput("--k must be at least 1".to_string()));
            }

            let mut llm = LlmSettings::from(&config.llm);
            if let Some(model) = model {
                llm.model = model;
            }
            if seed.is_some() {
                llm.seed = seed;
            }

            let settings = PipelineSettings {
                top_k,
                mode: mode.into(),
                llm,
                print_prompt,
            };

            let embedder = embedder_from_config(&config.retrieval)?;
            debug!("Using embedder: {}", embedder.name());
            let index = Box::new(InMemoryIndex::new(embedder));

            let client = match settings.mode {
                ScoringMode::Llm => build_client(&config.llm)?,
                ScoringMode::Rules => None,
            };

            info!("Evaluating {} against \"{}\"", resume.display(), job.title);
            let mut pipeline = Pipeline::new(settings, index, client)?;
            let report = pipeline.run(&job, &resume_text).await?;

            match report.source {
                ReportSource::Llm => info!("Result source: LLM"),
                ReportSource::Repaired => info!("Result source: LLM (repaired)"),
                ReportSource::RuleBased(reason) => info!("Result source: rule-based ({})", reason),
            }
            debug!("Pipeline trace: {:?}", report.trace);

            let validation = SchemaValidator::new()?.validate(&serde_json::to_value(&report.output)?);
            if !validation.is_valid() {
                return Err(ResumeFitError::SchemaValidation(validation.errors));
            }

            let generator = ReportGenerator::new(config.output.color_output && out.is_none());
            let rendered = generator.generate_report(&report.output, output_format)?;

            match out {
                Some(path) => {
                    save_report_to_file(&rendered, &path)?;
                    info!("Report written to {}", path.display());
                }
                None => println!("{}", rendered),
            }
        }

        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&get_schema())?);
        }

        Commands::Config { action } => {
            let path = config_path.unwrap_or_else(Config::config_path);
            match action {
                Some(ConfigAction::Show) | None => {
                    let mut shown = config.clone();
                    if shown.llm.api_key.is_some() {
                        shown.llm.api_key = Some("********".to_string());
                    }
                    let text = toml::to_string_pretty(&shown).map_err(|e| {
                        ResumeFitError::Configuration(format!("Failed to serialize config: {}", e))
                    })?;
                    println!("# {}\n{}", path.display(), text);
                }

                Some(ConfigAction::Reset) => {
                    Config::default().save_to(&path)?;
                    info!("Configuration reset to defaults at {}", path.display());
                }

                Some(ConfigAction::Path) => {
                    println!("{}", path.display());
                }
            }
        }
    }

    Ok(())
}

/// Chat client for LLM mode; `None` when no API key is available
fn build_client(config: &LlmConfig) -> Result<Option<Box<dyn ChatClient>>> {
    let api_key = config
        .api_key
        .clone()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .filter(|key| !key.trim().is_empty());

    match api_key {
        Some(key) => {
            let client = OpenAiClient::new(&config.api_base, key, Duration::from_secs(config.timeout_secs))?;
            Ok(Some(Box::new(client)))
        }
        None => {
            warn!("OPENAI_API_KEY is not set; the rule-based scorer will be used");
            Ok(None)
        }
    }
}
