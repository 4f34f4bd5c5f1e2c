//! Scoring pipeline: PARSE → RETRIEVE → PROMPT → LLM_CALL → VALIDATE → (REPAIR → VALIDATE2) → RESULT
//!
//! Every path that cannot produce a valid LLM report ends in FALLBACK, where the
//! rule-based scorer supplies the result. The returned report is always schema-valid.

use crate::error::{Result, ResumeFitError};
use crate::llm::client::ChatClient;
use crate::llm::evaluator::{generate_scores, repair_json, LlmFailure, LlmSettings};
use crate::llm::prompts::build_prompt;
use crate::output::report::AssignmentOutput;
use crate::output::schema::{get_schema, SchemaValidator};
use crate::processing::document::{JobDescription, ParsedResume};
use crate::processing::resume_parser::{split_lines, ResumeParser};
use crate::processing::retriever::{
    build_collection, retrieve, unique_collection_name, RetrievalMap, SimilarityIndex,
};
use crate::processing::scorer::RuleBasedScorer;
use log::{debug, info, warn};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    /// LLM scoring with repair and rule-based fallback
    Llm,
    /// Rule-based scoring only
    Rules,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub top_k: usize,
    pub mode: ScoringMode,
    pub llm: LlmSettings,
    /// Echo the scoring prompt to stderr
    pub print_prompt: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            mode: ScoringMode::Llm,
            llm: LlmSettings::default(),
            print_prompt: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parse,
    Retrieve,
    Prompt,
    LlmCall,
    Validate,
    Repair,
    Validate2,
    Fallback,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    RulesMode,
    NoClient,
    RetrievalFailed,
    LlmCallFailed,
    LlmParseFailed,
    RepairCallFailed,
    RepairInvalid,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FallbackReason::RulesMode => "rules mode requested",
            FallbackReason::NoClient => "no LLM client configured",
            FallbackReason::RetrievalFailed => "evidence retrieval failed",
            FallbackReason::LlmCallFailed => "LLM call failed",
            FallbackReason::LlmParseFailed => "LLM returned non-JSON content",
            FallbackReason::RepairCallFailed => "repair call failed",
            FallbackReason::RepairInvalid => "repaired JSON still invalid",
        };
        f.write_str(text)
    }
}

/// Where the final report came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSource {
    Llm,
    Repaired,
    RuleBased(FallbackReason),
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub output: AssignmentOutput,
    pub source: ReportSource,
    /// States visited, in order
    pub trace: Vec<Stage>,
}

pub struct Pipeline {
    settings: PipelineSettings,
    parser: ResumeParser,
    index: Box<dyn SimilarityIndex>,
    client: Option<Box<dyn ChatClient>>,
    validator: SchemaValidator,
    scorer: RuleBasedScorer,
}

/// Parse and retrieval results shared by every later state
struct Evidence {
    parsed: ParsedResume,
    hits: RetrievalMap,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        index: Box<dyn SimilarityIndex>,
        client: Option<Box<dyn ChatClient>>,
    ) -> Result<Self> {
        Ok(Self {
            settings,
            parser: ResumeParser::new(),
            index,
            client,
            validator: SchemaValidator::new()?,
            scorer: RuleBasedScorer::new()?,
        })
    }

    /// Run one evaluation of `resume_text` against `jd`
    pub async fn run(&mut self, jd: &JobDescription, resume_text: &str) -> Result<PipelineReport> {
        let mut trace = vec![Stage::Parse];
        let parsed = self.parser.parse(resume_text, &jd.requirements);
        debug!(
            "[pipeline] parsed: {} skills, {:.1} years, {} evidence lines",
            parsed.skills.len(),
            parsed.experience_years,
            parsed.evidence_lines.len()
        );

        trace.push(Stage::Retrieve);
        let hits = match self.retrieve_evidence(jd, resume_text, &parsed) {
            Ok(hits) => hits,
            Err(e) => {
                warn!("[pipeline] retrieval failed: {}; falling back to rule-based scorer", e);
                let evidence = Evidence {
                    parsed,
                    hits: RetrievalMap::new(),
                };
                return self.fallback(jd, &evidence, FallbackReason::RetrievalFailed, trace);
            }
        };
        let evidence = Evidence { parsed, hits };

        if self.settings.mode == ScoringMode::Rules {
            return self.fallback(jd, &evidence, FallbackReason::RulesMode, trace);
        }

        trace.push(Stage::Prompt);
        let prompt = build_prompt(jd, &evidence.parsed, &evidence.hits, &get_schema());
        debug!("[pipeline] prompt length: {} chars", prompt.chars().count());
        if self.settings.print_prompt {
            eprintln!("----- BEGIN PROMPT -----");
            eprintln!("{}", prompt);
            eprintln!("----- END PROMPT -----");
        }

        let client = match self.client.as_deref() {
            Some(client) => client,
            None => {
                warn!("[pipeline] no LLM client configured; falling back to rule-based scorer");
                return self.fallback(jd, &evidence, FallbackReason::NoClient, trace);
            }
        };

        trace.push(Stage::LlmCall);
        debug!(
            "[pipeline] LLM call: model={} seed={:?}",
            self.settings.llm.model, self.settings.llm.seed
        );
        let first = match generate_scores(client, &self.settings.llm, &prompt).await {
            Ok(value) => value,
            Err(failure) => {
                let reason = match failure {
                    LlmFailure::Transport(_) => FallbackReason::LlmCallFailed,
                    LlmFailure::Parse { .. } => FallbackReason::LlmParseFailed,
                };
                warn!("[pipeline] {}; falling back to rule-based scorer", ResumeFitError::from(failure));
                return self.fallback(jd, &evidence, reason, trace);
            }
        };

        trace.push(Stage::Validate);
        let errors = match self.validator.decode(&first) {
            Ok(output) => {
                debug!("[pipeline] LLM result valid; returning LLM output");
                return self.finish(output, ReportSource::Llm, trace);
            }
            Err(report) => report.errors,
        };

        trace.push(Stage::Repair);
        debug!("[pipeline] schema invalid; attempting repair (errors={})", errors.len());
        let bad_json = serde_json::to_string(&first)?;
        let repaired = match repair_json(client, &self.settings.llm, &bad_json, &errors).await {
            Ok(value) => value,
            Err(failure) => {
                warn!("[pipeline] repair attempt failed: {}", ResumeFitError::from(failure));
                return self.fallback(jd, &evidence, FallbackReason::RepairCallFailed, trace);
            }
        };

        trace.push(Stage::Validate2);
        match self.validator.decode(&repaired) {
            Ok(output) => {
                debug!("[pipeline] repair succeeded; returning LLM(repaired) result");
                self.finish(output, ReportSource::Repaired, trace)
            }
            Err(report) => {
                debug!(
                    "[pipeline] repair failed validation (errors={}); falling back to rule-based scorer",
                    report.errors.len()
                );
                self.fallback(jd, &evidence, FallbackReason::RepairInvalid, trace)
            }
        }
    }

    /// Index evidence lines in a fresh collection, query skill requirements, drop the collection
    fn retrieve_evidence(
        &mut self,
        jd: &JobDescription,
        resume_text: &str,
        parsed: &ParsedResume,
    ) -> Result<RetrievalMap> {
        let lines = index_lines(resume_text, parsed);
        let name = unique_collection_name();
        let handle = build_collection(&mut *self.index, &name, &lines)?;

        let count = self.index.count(&handle).unwrap_or(lines.len());
        debug!("[pipeline] collection built: name={:?} vectors={}", handle.name(), count);

        let requirements = jd.skill_requirements();
        let result = retrieve(&*self.index, &handle, &requirements, self.settings.top_k);

        if let Err(e) = self.index.delete_collection(&handle) {
            warn!("[pipeline] could not delete collection {}: {}", handle.name(), e);
        }
        result
    }

    fn fallback(
        &self,
        jd: &JobDescription,
        evidence: &Evidence,
        reason: FallbackReason,
        mut trace: Vec<Stage>,
    ) -> Result<PipelineReport> {
        info!("Using rule-based scorer ({})", reason);
        trace.push(Stage::Fallback);
        let output = self.scorer.score(jd, &evidence.parsed, &evidence.hits)?;
        self.finish(output, ReportSource::RuleBased(reason), trace)
    }

    fn finish(
        &self,
        output: AssignmentOutput,
        source: ReportSource,
        mut trace: Vec<Stage>,
    ) -> Result<PipelineReport> {
        self.validator.assert_valid(&output)?;
        trace.push(Stage::Result);
        Ok(PipelineReport { output, source, trace })
    }
}

/// Parsed evidence lines, or every non-blank resume line when fewer than two
pub fn index_lines(resume_text: &str, parsed: &ParsedResume) -> Vec<String> {
    if parsed.evidence_lines.len() >= 2 {
        parsed.evidence_lines.clone()
    } else {
        split_lines(resume_text)
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }
}
