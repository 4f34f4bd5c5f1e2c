//! Typed form of the AssignmentOutput wire contract

use serde::{Deserialize, Serialize};

pub const MAX_HIGHLIGHTS: usize = 3;

/// The fitness report handed to consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AssignmentOutput {
    pub overall_score: u8,
    pub technical_skills_score: u8,
    pub experience_score: u8,
    pub cultural_fit_score: u8,
    pub match_summary: String,
    pub strengths_highlights: Vec<String>,
    pub improvement_areas: Vec<String>,
    pub detailed_breakdown: DetailedBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red_flags: Option<Vec<RedFlag>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DetailedBreakdown {
    pub technical_skills: Vec<RequirementItem>,
    pub experience: Vec<RequirementItem>,
    pub education_and_certifications: Vec<RequirementItem>,
    pub cultural_fit_and_soft_skills: Vec<RequirementItem>,
}

/// One requirement judged present or absent, with its estimated gap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RequirementItem {
    pub requirement: String,
    pub present: bool,
    pub evidence: String,
    pub gap_percentage: u8,
    pub missing_detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedFlag {
    pub issue: String,
    pub evidence: String,
    pub reason: String,
}

impl RequirementItem {
    pub fn new(
        requirement: impl Into<String>,
        present: bool,
        evidence: impl Into<String>,
        gap_percentage: u8,
        missing_detail: impl Into<String>,
    ) -> Self {
        Self {
            requirement: requirement.into(),
            present,
            evidence: evidence.into(),
            gap_percentage: gap_percentage.min(100),
            missing_detail: missing_detail.into(),
        }
    }
}

impl AssignmentOutput {
    /// Every item across the four breakdown categories
    pub fn breakdown_items(&self) -> impl Iterator<Item = &RequirementItem> {
        let b = &self.detailed_breakdown;
        b.technical_skills
            .iter()
            .chain(&b.experience)
            .chain(&b.education_and_certifications)
            .chain(&b.cultural_fit_and_soft_skills)
    }
}

/// Round half to even and clamp into the 0..=100 score range
pub fn clamp_score(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round_ties_even().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names_are_camel_case() {
        let item = RequirementItem::new("Proficiency in Lean", true, "Skills list includes Lean", 0, "0% gap.");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["gapPercentage"], json!(0));
        assert_eq!(value["missingDetail"], json!("0% gap."));
    }

    #[test]
    fn test_red_flags_omitted_when_absent() {
        let output = AssignmentOutput {
            overall_score: 1,
            technical_skills_score: 2,
            experience_score: 3,
            cultural_fit_score: 4,
            match_summary: String::new(),
            strengths_highlights: vec![],
            improvement_areas: vec![],
            detailed_breakdown: DetailedBreakdown {
                technical_skills: vec![],
                experience: vec![],
                education_and_certifications: vec![],
                cultural_fit_and_soft_skills: vec![],
            },
            red_flags: None,
        };
        let value = serde_json::to_value(&output).unwrap();
        assert!(value.get("redFlags").is_none());
        assert_eq!(value["culturalFitScore"], json!(4));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<RedFlag, _> = serde_json::from_value(json!({
            "issue": "x", "evidence": "y", "reason": "z", "severity": "high"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(50.0), 50);
        assert_eq!(clamp_score(62.5), 62);
        assert_eq!(clamp_score(63.5), 64);
        assert_eq!(clamp_score(130.0), 100);
        assert_eq!(clamp_score(-4.0), 0);
        assert_eq!(clamp_score(f64::NAN), 0);
    }
}
