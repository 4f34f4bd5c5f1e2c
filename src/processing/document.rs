//! Document records shared across the pipeline: the job description and the parsed resume

use crate::error::{Result, ResumeFitError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys a job description object must carry, in reporting order
pub const REQUIRED_JD_KEYS: [&str; 5] = ["title", "sector", "location", "description", "requirements"];

const PROFICIENCY_PREFIX: &str = "proficiency in ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescription {
    pub title: String,
    pub sector: String,
    pub location: String,
    pub description: String,
    pub requirements: Vec<String>,
}

/// Facts extracted deterministically from resume text against JD requirements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    pub skills: Vec<String>,
    pub experience_years: f64,
    pub evidence_lines: Vec<String>,
}

impl JobDescription {
    pub fn new(
        title: impl Into<String>,
        sector: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
        requirements: Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            sector: sector.into(),
            location: location.into(),
            description: description.into(),
            requirements,
        }
    }

    /// Build from a JSON value holding either the JD object itself or `{"job": {...}}`
    pub fn from_json_value(value: Value) -> Result<Self> {
        let object = match value {
            Value::Object(mut map) => match map.remove("job") {
                Some(Value::Object(job)) => job,
                Some(other) => {
                    map.insert("job".to_string(), other);
                    map
                }
                None => map,
            },
            _ => {
                return Err(ResumeFitError::InvalidInput(
                    "JD file must be a JSON object or contain a 'job' object".to_string(),
                ))
            }
        };

        let missing: Vec<&str> = REQUIRED_JD_KEYS
            .iter()
            .copied()
            .filter(|key| !object.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(ResumeFitError::InvalidInput(format!(
                "JD JSON missing keys: {}",
                missing.join(", ")
            )));
        }

        serde_json::from_value(Value::Object(object))
            .map_err(|e| ResumeFitError::InvalidInput(format!("Malformed JD field: {}", e)))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ResumeFitError::InvalidInput(format!("JD file is not valid JSON: {}", e)))?;
        Self::from_json_value(value)
    }

    /// Requirements of the "Proficiency in X" shape, verbatim, in JD order
    pub fn skill_requirements(&self) -> Vec<&str> {
        self.requirements
            .iter()
            .map(String::as_str)
            .filter(|r| is_skill_requirement(r))
            .collect()
    }
}

/// True when the requirement starts with "Proficiency in " (case-insensitive)
pub fn is_skill_requirement(requirement: &str) -> bool {
    strip_proficiency_prefix(requirement).is_some()
}

/// Remainder of a "Proficiency in X" requirement, untrimmed
pub fn strip_proficiency_prefix(requirement: &str) -> Option<&str> {
    let head = requirement.get(..PROFICIENCY_PREFIX.len())?;
    if head.eq_ignore_ascii_case(PROFICIENCY_PREFIX) {
        Some(&requirement[PROFICIENCY_PREFIX.len()..])
    } else {
        None
    }
}

/// Stable case-insensitive ordering used everywhere requirements are listed
pub fn sort_case_insensitive(items: &mut [String]) {
    items.sort_by_cached_key(|s| s.to_lowercase());
}
