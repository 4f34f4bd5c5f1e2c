//! CLI interface for the resume fit evaluator

use crate::config::OutputFormat;
use crate::pipeline::ScoringMode;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "resume-fit")]
#[command(about = "Score a resume against a job description and emit schema-valid JSON")]
#[command(long_about = "Parse a resume, retrieve supporting evidence per requirement, score it with an LLM \
(one schema repair attempt) and fall back to a deterministic rule-based scorer whenever the LLM path fails")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true, visible_alias = "debug")]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate a resume against a job description
    #[command(group(ArgGroup::new("job").required(true).args(["jd", "jd_txt"])))]
    Evaluate {
        /// Path to job JSON (a full record with "job" or the job object itself)
        #[arg(long)]
        jd: Option<PathBuf>,

        /// Path to a plain-text job description
        #[arg(long = "jd-txt")]
        jd_txt: Option<PathBuf>,

        /// Path to resume file (markdown is flattened, anything else read verbatim)
        #[arg(short, long)]
        resume: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Scoring mode
        #[arg(long, value_enum, default_value_t = ModeArg::Llm)]
        mode: ModeArg,

        /// Top-k evidence lines per requirement
        #[arg(short, long)]
        k: Option<usize>,

        /// LLM model name (LLM mode only)
        #[arg(short, long)]
        model: Option<String>,

        /// Sampling seed, if the provider supports it
        #[arg(long)]
        seed: Option<u64>,

        /// Echo the assembled prompt to stderr
        #[arg(long)]
        print_prompt: bool,

        /// Output format: json, console, markdown
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Print the output JSON schema
    Schema,

    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Llm,
    Rules,
}

impl From<ModeArg> for ScoringMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Llm => ScoringMode::Llm,
            ModeArg::Rules => ScoringMode::Rules,
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "json" => Ok(OutputFormat::Json),
        "console" => Ok(OutputFormat::Console),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        _ => Err(format!(
            "Invalid output format: {}. Supported: json, console, markdown",
            format
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_format() {
        assert_eq!(parse_output_format("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(parse_output_format("md").unwrap(), OutputFormat::Markdown);
        assert!(parse_output_format("pdf").is_err());
    }

    #[test]
    fn test_evaluate_requires_one_job_source() {
        assert!(Cli::try_parse_from(["resume-fit", "evaluate", "--resume", "r.txt"]).is_err());
        assert!(Cli::try_parse_from([
            "resume-fit", "evaluate", "--jd", "j.json", "--jd-txt", "j.txt", "--resume", "r.txt"
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "resume-fit", "--debug", "evaluate", "--jd-txt", "j.txt", "--resume", "r.txt", "--mode", "rules", "--k", "5",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Evaluate { jd, jd_txt, mode, k, .. } => {
                assert!(jd.is_none());
                assert_eq!(jd_txt, Some(PathBuf::from("j.txt")));
                assert_eq!(mode, ModeArg::Rules);
                assert_eq!(k, Some(5));
            }
            _ => panic!("expected evaluate"),
        }
    }
}
