//! Integration tests for input loading and rule-based evaluation

use resume_fit::error::ResumeFitError;
use resume_fit::input::{HeuristicJdParser, InputManager};
use resume_fit::output::{ReportGenerator, SchemaValidator};
use resume_fit::config::OutputFormat;
use resume_fit::pipeline::{FallbackReason, Pipeline, PipelineSettings, ReportSource, ScoringMode, Stage};
use resume_fit::processing::embeddings::HashingEmbedder;
use resume_fit::processing::retriever::InMemoryIndex;
use std::path::Path;

fn manager() -> InputManager {
    InputManager::with_text_parser(Box::new(HeuristicJdParser::new()))
}

fn rules_pipeline() -> Pipeline {
    let settings = PipelineSettings {
        mode: ScoringMode::Rules,
        ..PipelineSettings::default()
    };
    Pipeline::new(settings, Box::new(InMemoryIndex::new(HashingEmbedder::default())), None).unwrap()
}

#[tokio::test]
async fn test_load_job_json_direct_and_wrapped() {
    let manager = manager();
    let direct = manager.load_job_json(Path::new("tests/fixtures/job.json")).await.unwrap();
    let wrapped = manager
        .load_job_json(Path::new("tests/fixtures/job_wrapped.json"))
        .await
        .unwrap();

    assert_eq!(direct, wrapped);
    assert_eq!(direct.title, "Program Manager");
    assert_eq!(direct.requirements.len(), 3);
}

#[tokio::test]
async fn test_load_job_json_missing_keys() {
    let result = manager()
        .load_job_json(Path::new("tests/fixtures/job_missing_keys.json"))
        .await;

    match result {
        Err(ResumeFitError::InvalidInput(message)) => {
            assert!(message.contains("location, description, requirements"), "{message}");
        }
        other => panic!("expected InvalidInput, got {:?}", other.map(|jd| jd.title)),
    }
}

#[tokio::test]
async fn test_load_job_text() {
    let jd = manager().load_job_text(Path::new("tests/fixtures/job.txt")).await.unwrap();
    assert_eq!(jd.title, "Program Manager");
    assert_eq!(jd.location, "Hybrid – Cairo");
    assert!(jd.requirements.contains(&"Proficiency in Lean".to_string()));
    assert!(jd.requirements.contains(&"1+ years of relevant experience".to_string()));
}

#[tokio::test]
async fn test_text_jd_requires_parser() {
    let manager = InputManager::new();
    assert!(!manager.supports_text_jd());
    let result = manager.load_job_text(Path::new("tests/fixtures/job.txt")).await;
    assert!(matches!(result, Err(ResumeFitError::InvalidInput(_))));
}

#[tokio::test]
async fn test_read_resume_txt_and_md() {
    let manager = manager();
    let txt = manager.read_resume(Path::new("tests/fixtures/resume.txt")).await.unwrap();
    assert!(txt.contains("Six Sigma exposure."));

    let md = manager.read_resume(Path::new("tests/fixtures/resume.md")).await.unwrap();
    assert!(md.contains("Delivered 5 projects using Project Planning, SAP, Lean with measurable KPIs."));
    assert!(!md.contains("**"));
    assert!(!md.contains("##"));
}

#[tokio::test]
async fn test_other_resume_types_read_verbatim() {
    let manager = manager();
    let unknown = manager
        .read_resume(Path::new("tests/fixtures/unsupported.xyz"))
        .await
        .unwrap();
    assert_eq!(unknown, "binary-ish content\n");

    let dir = tempfile::tempdir().unwrap();
    let bare = dir.path().join("resume");
    let json = dir.path().join("resume.json");
    std::fs::write(&bare, "Lean lead (2019-01 to 2020-01)\n").unwrap();
    std::fs::write(&json, "{\"not\": \"parsed\"}").unwrap();

    assert_eq!(
        manager.read_resume(&bare).await.unwrap(),
        "Lean lead (2019-01 to 2020-01)\n"
    );
    assert_eq!(manager.read_resume(&json).await.unwrap(), "{\"not\": \"parsed\"}");
}

#[tokio::test]
async fn test_nonexistent_file() {
    let result = manager()
        .read_resume(Path::new("tests/fixtures/nonexistent.txt"))
        .await;
    assert!(matches!(result, Err(ResumeFitError::InvalidInput(_))));
}

#[tokio::test]
async fn test_rules_mode_end_to_end() {
    let manager = manager();
    let jd = manager.load_job_json(Path::new("tests/fixtures/job.json")).await.unwrap();
    let resume = manager.read_resume(Path::new("tests/fixtures/resume.txt")).await.unwrap();

    let report = rules_pipeline().run(&jd, &resume).await.unwrap();

    assert_eq!(report.source, ReportSource::RuleBased(FallbackReason::RulesMode));
    assert_eq!(
        report.trace,
        vec![Stage::Parse, Stage::Retrieve, Stage::Fallback, Stage::Result]
    );
    assert_eq!(report.output.technical_skills_score, 100);
    assert_eq!(report.output.experience_score, 90);
    assert_eq!(report.output.cultural_fit_score, 70);
    assert_eq!(report.output.overall_score, 90);
    assert!(report.output.match_summary.contains("experience ≈4.2 vs 1+"));

    let validator = SchemaValidator::new().unwrap();
    let value = serde_json::to_value(&report.output).unwrap();
    assert!(validator.validate(&value).is_valid());
}

#[tokio::test]
async fn test_markdown_resume_scores_like_text() {
    let manager = manager();
    let jd = manager.load_job_json(Path::new("tests/fixtures/job.json")).await.unwrap();
    let txt = manager.read_resume(Path::new("tests/fixtures/resume.txt")).await.unwrap();
    let md = manager.read_resume(Path::new("tests/fixtures/resume.md")).await.unwrap();

    let from_txt = rules_pipeline().run(&jd, &txt).await.unwrap();
    let from_md = rules_pipeline().run(&jd, &md).await.unwrap();
    assert_eq!(from_txt.output, from_md.output);
}

#[tokio::test]
async fn test_rules_mode_is_byte_identical_across_runs() {
    let manager = manager();
    let jd = manager.load_job_text(Path::new("tests/fixtures/job.txt")).await.unwrap();
    let resume = manager.read_resume(Path::new("tests/fixtures/resume.txt")).await.unwrap();

    let generator = ReportGenerator::new(false);
    let first = rules_pipeline().run(&jd, &resume).await.unwrap();
    let second = rules_pipeline().run(&jd, &resume).await.unwrap();
    assert_eq!(
        generator.generate_report(&first.output, OutputFormat::Json).unwrap(),
        generator.generate_report(&second.output, OutputFormat::Json).unwrap()
    );
}
