//! The fixed Draft-07 schema for AssignmentOutput and its validator

use crate::error::{Result, ResumeFitError};
use crate::output::report::AssignmentOutput;
use jsonschema::Validator;
use serde_json::{json, Value};

/// The strict output schema; no additional properties anywhere
pub fn get_schema() -> Value {
    let score = json!({ "type": "integer", "minimum": 0, "maximum": 100 });
    let highlights = json!({
        "type": "array",
        "items": { "type": "string" },
        "minItems": 0,
        "maxItems": 3
    });
    let requirement_item = json!({
        "type": "object",
        "properties": {
            "requirement": { "type": "string", "minLength": 1 },
            "present": { "type": "boolean" },
            "evidence": { "type": "string" },
            "gapPercentage": { "type": "integer", "minimum": 0, "maximum": 100 },
            "missingDetail": { "type": "string" }
        },
        "required": ["requirement", "present", "evidence", "gapPercentage", "missingDetail"],
        "additionalProperties": false
    });
    let items = json!({ "type": "array", "items": requirement_item });

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "AssignmentOutput",
        "type": "object",
        "properties": {
            "overallScore": score,
            "technicalSkillsScore": score,
            "experienceScore": score,
            "culturalFitScore": score,
            "matchSummary": { "type": "string" },
            "strengthsHighlights": highlights,
            "improvementAreas": highlights,
            "detailedBreakdown": {
                "type": "object",
                "properties": {
                    "technicalSkills": items,
                    "experience": items,
                    "educationAndCertifications": items,
                    "culturalFitAndSoftSkills": items
                },
                "required": [
                    "technicalSkills",
                    "experience",
                    "educationAndCertifications",
                    "culturalFitAndSoftSkills"
                ],
                "additionalProperties": false
            },
            "redFlags": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "issue": { "type": "string" },
                        "evidence": { "type": "string" },
                        "reason": { "type": "string" }
                    },
                    "required": ["issue", "evidence", "reason"],
                    "additionalProperties": false
                }
            }
        },
        "required": [
            "overallScore",
            "technicalSkillsScore",
            "experienceScore",
            "culturalFitScore",
            "matchSummary",
            "strengthsHighlights",
            "improvementAreas",
            "detailedBreakdown"
        ],
        "additionalProperties": false
    })
}

/// Outcome of validating one payload; errors are sorted for stable output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Compiled schema, built once per pipeline
pub struct SchemaValidator {
    validator: Validator,
}

impl SchemaValidator {
    pub fn new() -> Result<Self> {
        let validator = jsonschema::draft7::new(&get_schema()).map_err(|e| {
            ResumeFitError::Configuration(format!("invalid JSON Schema document: {}", e))
        })?;
        Ok(Self { validator })
    }

    pub fn validate(&self, payload: &Value) -> ValidationReport {
        let mut errors: Vec<String> = self
            .validator
            .iter_errors(payload)
            .map(|error| {
                let path = error.instance_path.to_string();
                if path.is_empty() {
                    error.to_string()
                } else {
                    format!("{}: {}", path, error)
                }
            })
            .collect();
        errors.sort();
        ValidationReport { errors }
    }

    /// Validate and decode into the typed report.
    ///
    /// The schema is the only gate. Draft-07 counts `80.0` as an integer, so
    /// integral floats are rewritten as integers before decoding.
    pub fn decode(&self, payload: &Value) -> std::result::Result<AssignmentOutput, ValidationReport> {
        let report = self.validate(payload);
        if !report.is_valid() {
            return Err(report);
        }
        serde_json::from_value(integral_numbers(payload)).map_err(|e| ValidationReport {
            errors: vec![format!("payload does not decode as AssignmentOutput: {}", e)],
        })
    }

    /// Hard check for payloads this crate produced itself
    pub fn assert_valid(&self, output: &AssignmentOutput) -> Result<()> {
        let payload = serde_json::to_value(output)?;
        let report = self.validate(&payload);
        if report.is_valid() {
            Ok(())
        } else {
            Err(ResumeFitError::ScorerDefect(report.errors))
        }
    }
}

/// Copy of `value` with every float that has no fractional part turned into an integer
fn integral_numbers(value: &Value) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() <= MAX_EXACT)
            .map(|f| Value::from(f as i64))
            .unwrap_or_else(|| value.clone()),
        Value::Array(items) => Value::Array(items.iter().map(integral_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), integral_numbers(item)))
                .collect(),
        ),
        other => other.clone(),
    }
}
