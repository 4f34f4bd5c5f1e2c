//! Rule-based scorer: the deterministic path that always yields a schema-valid report
//!
//! Weights: overall = 0.4 technical + 0.4 experience + 0.2 cultural. All rounding
//! is half-to-even.

use crate::error::{Result, ResumeFitError};
use crate::output::report::{
    clamp_score, AssignmentOutput, DetailedBreakdown, RedFlag, RequirementItem, MAX_HIGHLIGHTS,
};
use crate::output::schema::SchemaValidator;
use crate::processing::document::{sort_case_insensitive, JobDescription, ParsedResume};
use crate::processing::retriever::RetrievalMap;
use aho_corasick::AhoCorasick;
use regex::Regex;

const SOFT_POSITIVE: [&str; 11] = [
    "collaborated",
    "stakeholder",
    "stakeholders",
    "ownership",
    "owned",
    "mentor",
    "mentored",
    "lead",
    "led",
    "leadership",
    "cross-functional",
];
const IMPACT_TOKENS: [&str; 5] = ["%", "kpi", "kpis", "improved", "delivered"];
const COLLABORATION_TOKENS: [&str; 3] = ["collaborated", "cross-functional", "stakeholder"];
const LEADERSHIP_TOKENS: [&str; 5] = ["lead", "led", "owned", "mentored", "ownership"];

const TECH_ITEM_LIMIT: usize = 4;
const TECH_MISSING_GAP: u8 = 20;
const NEUTRAL_TECH_SCORE: u8 = 50;

/// Case-insensitive substring scan over evidence lines
struct KeywordSet {
    matcher: AhoCorasick,
}

impl KeywordSet {
    fn new(keywords: &[&str]) -> Result<Self> {
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(keywords)
            .map_err(|e| ResumeFitError::ScorerDefect(vec![format!("Failed to build keyword matcher: {}", e)]))?;
        Ok(Self { matcher })
    }

    fn any_in(&self, normalized_text: &str) -> bool {
        self.matcher.is_match(normalized_text)
    }
}

pub struct RuleBasedScorer {
    soft_signals: KeywordSet,
    impact: KeywordSet,
    collaboration: KeywordSet,
    leadership: KeywordSet,
    skill_regex: Regex,
    years_regex: Regex,
    whitespace_regex: Regex,
    validator: SchemaValidator,
}

/// Experience score plus its breakdown item
struct ExperienceAssessment {
    score: u8,
    item: RequirementItem,
}

impl RuleBasedScorer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            soft_signals: KeywordSet::new(&SOFT_POSITIVE)?,
            impact: KeywordSet::new(&IMPACT_TOKENS)?,
            collaboration: KeywordSet::new(&COLLABORATION_TOKENS)?,
            leadership: KeywordSet::new(&LEADERSHIP_TOKENS)?,
            skill_regex: Regex::new(r"(?i)^\s*Proficiency in\s+(.+?)\s*$")
                .expect("Invalid skill requirement regex"),
            years_regex: Regex::new(r"(?i)(\d+)\+\s*years\s+of\s+relevant\s+experience")
                .expect("Invalid years regex"),
            whitespace_regex: Regex::new(r"\s+").expect("Invalid whitespace regex"),
            validator: SchemaValidator::new()?,
        })
    }

    /// Score a parsed resume against the JD.
    ///
    /// The result is checked against the schema before it is returned; a failure
    /// there is a defect in this scorer, reported as [`ResumeFitError::ScorerDefect`].
    pub fn score(
        &self,
        jd: &JobDescription,
        parsed: &ParsedResume,
        _hits: &RetrievalMap,
    ) -> Result<AssignmentOutput> {
        let tech_reqs = self.tech_requirements(&jd.requirements);
        let years_req = self.years_required(&jd.requirements);
        let candidate_years = parsed.experience_years.max(0.0);

        let evidence_text = self.normalize(&parsed.evidence_lines.join("\n"));

        // technical
        let missing: Vec<&String> = tech_reqs
            .iter()
            .filter(|t| !self.present_in_skills(t, &parsed.skills))
            .collect();
        let matched = tech_reqs.len() - missing.len();
        let tech_score = if tech_reqs.is_empty() {
            NEUTRAL_TECH_SCORE
        } else {
            clamp_score(matched as f64 / tech_reqs.len() as f64 * 100.0)
        };

        let experience = self.assess_experience(candidate_years, years_req);

        let cultural_present = self.soft_signals.any_in(&evidence_text);
        let cultural_score: u8 = if cultural_present { 70 } else { 55 };

        let overall = clamp_score(
            0.4 * f64::from(tech_score) + 0.4 * f64::from(experience.score) + 0.2 * f64::from(cultural_score),
        );

        let technical_items = tech_reqs
            .iter()
            .take(TECH_ITEM_LIMIT)
            .map(|t| self.technical_item(t, self.present_in_skills(t, &parsed.skills)))
            .collect();

        let scope_present = self.impact.any_in(&evidence_text);
        let experience_items = vec![experience.item, scope_item(scope_present)];

        let education_items = vec![RequirementItem::new(
            "Formal education or equivalent experience",
            true,
            "Experience considered sufficient",
            0,
            "0% gap.",
        )];

        let soft_items = vec![
            collaboration_item(self.collaboration.any_in(&evidence_text)),
            leadership_item(self.leadership.any_in(&evidence_text)),
        ];

        let mut strengths = Vec::new();
        if tech_score >= 60 && !tech_reqs.is_empty() {
            strengths.push("Coverage across key tools with explicit skill evidence.".to_string());
        }
        if candidate_years >= f64::from(years_req) {
            strengths.push(format!(
                "Meets experience bar (≈{:.1} vs {}+).",
                candidate_years, years_req
            ));
        }
        if cultural_present {
            strengths.push("Collaboration/ownership evidenced via stakeholder work.".to_string());
        }
        if strengths.is_empty() {
            strengths.push("Adequate baseline with growth potential.".to_string());
        }
        strengths.truncate(MAX_HIGHLIGHTS);

        let mut improvements: Vec<String> = missing
            .iter()
            .take(MAX_HIGHLIGHTS)
            .map(|t| format!("{t} missing – 20% gap because it is a core requirement; resume has no {t}."))
            .collect();
        if candidate_years < f64::from(years_req) && improvements.len() < MAX_HIGHLIGHTS {
            let shortfall = f64::from(years_req) - candidate_years;
            improvements.push(format!(
                "Years short by ≈{:.1} – {}% gap vs {}+; resume totals ≈{:.1}.",
                shortfall,
                tenure_gap(shortfall),
                years_req,
                candidate_years
            ));
        }
        if improvements.is_empty() {
            improvements.push("Increase quantification of impact to strengthen seniority signal.".to_string());
        }

        let match_summary = {
            let mut summary = format!(
                "Alignment on {}/{} core tools; experience ≈{:.1} vs {}+ requirement. ",
                matched,
                tech_reqs.len(),
                candidate_years,
                years_req
            );
            if cultural_present {
                summary.push_str("Strengths include collaboration and ownership; ");
            }
            if missing.is_empty() {
                summary.push_str("minor scope signals.");
            } else {
                let focus: Vec<&str> = missing.iter().take(2).map(|s| s.as_str()).collect();
                summary.push_str(&format!("gaps focus on {}.", focus.join(", ")));
            }
            summary
        };

        let red_flags = if years_req > 0 && candidate_years + 2.0 < f64::from(years_req) {
            Some(vec![RedFlag {
                issue: "Seniority mismatch".to_string(),
                evidence: format!("Years ≈ {:.1} (< {}+ req)", candidate_years, years_req),
                reason: "Limited autonomy risk.".to_string(),
            }])
        } else {
            None
        };

        let output = AssignmentOutput {
            overall_score: overall,
            technical_skills_score: tech_score,
            experience_score: experience.score,
            cultural_fit_score: cultural_score,
            match_summary,
            strengths_highlights: strengths,
            improvement_areas: improvements,
            detailed_breakdown: DetailedBreakdown {
                technical_skills: technical_items,
                experience: experience_items,
                education_and_certifications: education_items,
                cultural_fit_and_soft_skills: soft_items,
            },
            red_flags,
        };

        self.validator.assert_valid(&output)?;
        Ok(output)
    }

    /// Skills named by "Proficiency in X" requirements, sorted case-insensitively (not deduplicated)
    pub fn tech_requirements(&self, requirements: &[String]) -> Vec<String> {
        let mut out: Vec<String> = requirements
            .iter()
            .filter_map(|r| self.skill_regex.captures(r))
            .map(|caps| caps[1].trim().to_string())
            .collect();
        sort_case_insensitive(&mut out);
        out
    }

    /// N from the first "N+ years of relevant experience" requirement, else 0
    pub fn years_required(&self, requirements: &[String]) -> u32 {
        requirements
            .iter()
            .filter_map(|r| self.years_regex.captures(r))
            .find_map(|caps| caps[1].parse::<u32>().ok())
            .unwrap_or(0)
    }

    fn assess_experience(&self, candidate_years: f64, years_req: u32) -> ExperienceAssessment {
        let evidence = format!("Total years ≈ {:.1} via roles listed", candidate_years);

        if years_req == 0 {
            let score = clamp_score((60.0 + (candidate_years * 5.0).min(40.0)).min(100.0));
            return ExperienceAssessment {
                score,
                item: RequirementItem::new(
                    "Years of relevant experience",
                    true,
                    evidence,
                    0,
                    "0% gap because requirement satisfied.",
                ),
            };
        }

        let required = f64::from(years_req);
        let ratio = candidate_years / required.max(1.0);
        let score = clamp_score((55.0 + (ratio * 25.0).min(35.0)).min(96.0));
        let present = candidate_years >= required;
        let gap = if present {
            0
        } else {
            tenure_gap(required - candidate_years)
        };
        let missing_detail = if gap == 0 {
            "0% gap because requirement satisfied.".to_string()
        } else {
            format!(
                "{}% gap because role expects {}+ years; resume totals ≈ {:.1}.",
                gap, years_req, candidate_years
            )
        };

        ExperienceAssessment {
            score,
            item: RequirementItem::new(
                format!("{}+ years of relevant experience", years_req),
                present,
                evidence,
                gap,
                missing_detail,
            ),
        }
    }

    fn technical_item(&self, skill: &str, present: bool) -> RequirementItem {
        if present {
            RequirementItem::new(
                format!("Proficiency in {}", skill),
                true,
                format!("Skills list includes {}", skill),
                0,
                "0% gap because requirement fully met with explicit evidence.",
            )
        } else {
            RequirementItem::new(
                format!("Proficiency in {}", skill),
                false,
                "No mention or usage evidence in resume",
                TECH_MISSING_GAP,
                format!(
                    "{}% gap because {} is required; resume lists no {} evidence.",
                    TECH_MISSING_GAP, skill, skill
                ),
            )
        }
    }

    fn present_in_skills(&self, skill: &str, skills: &[String]) -> bool {
        let target = self.normalize(skill);
        skills.iter().any(|s| self.normalize(s) == target)
    }

    fn normalize(&self, text: &str) -> String {
        self.whitespace_regex
            .replace_all(text.trim(), " ")
            .to_lowercase()
    }
}

/// Tenure shortfall in years to a gap percentage, capped at 40
fn tenure_gap(shortfall: f64) -> u8 {
    clamp_score(shortfall * 10.0).min(40)
}

fn scope_item(present: bool) -> RequirementItem {
    if present {
        RequirementItem::new(
            "Demonstrated scope and measurable impact",
            true,
            "Bullets quantify outcomes (%, KPIs)",
            0,
            "0% gap because KPIs/metrics present.",
        )
    } else {
        RequirementItem::new(
            "Demonstrated scope and measurable impact",
            false,
            "Bullets lack metrics",
            15,
            "15% gap because measurable impact required.",
        )
    }
}

fn collaboration_item(present: bool) -> RequirementItem {
    if present {
        RequirementItem::new(
            "Cross-functional collaboration",
            true,
            "Worked with stakeholders / cross-functional teams",
            0,
            "0% gap because collaboration evidenced.",
        )
    } else {
        RequirementItem::new(
            "Cross-functional collaboration",
            false,
            "No collaboration examples",
            15,
            "15% gap because cross-functional work is critical.",
        )
    }
}

fn leadership_item(present: bool) -> RequirementItem {
    if present {
        RequirementItem::new(
            "Leadership/ownership behaviors",
            true,
            "Owned initiatives or mentored juniors",
            0,
            "0% gap because ownership signals present.",
        )
    } else {
        RequirementItem::new(
            "Leadership/ownership behaviors",
            false,
            "Ownership not evidenced",
            10,
            "10% gap because role expects initiative ownership.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jd() -> JobDescription {
        JobDescription::new(
            "Program Manager",
            "Operations & Supply Chain",
            "Hybrid – Cairo",
            "We are hiring a PM...",
            vec![
                "Proficiency in Six Sigma".to_string(),
                "Proficiency in Lean".to_string(),
                "1+ years of relevant experience".to_string(),
            ],
        )
    }

    fn parsed_has_both() -> ParsedResume {
        ParsedResume {
            skills: vec!["Six Sigma".to_string(), "Lean".to_string()],
            experience_years: 4.2,
            evidence_lines: vec![
                "Collaborated with 7 stakeholders to ship on schedule. Six Sigma exposure.".to_string(),
                "Delivered 5 projects using SAP, Lean with measurable KPIs.".to_string(),
            ],
        }
    }

    fn parsed_missing_one() -> ParsedResume {
        ParsedResume {
            skills: vec!["Six Sigma".to_string()],
            experience_years: 4.2,
            evidence_lines: vec!["Collaborated with stakeholders; delivered projects with measurable KPIs.".to_string()],
        }
    }

    fn score(jd: &JobDescription, parsed: &ParsedResume) -> AssignmentOutput {
        RuleBasedScorer::new()
            .unwrap()
            .score(jd, parsed, &RetrievalMap::new())
            .unwrap()
    }

    #[test]
    fn test_both_skills_present() {
        let out = score(&jd(), &parsed_has_both());
        assert_eq!(out.technical_skills_score, 100);
        // ratio 4.2 -> 55 + 35 = 90
        assert_eq!(out.experience_score, 90);
        assert_eq!(out.cultural_fit_score, 70);
        // 40 + 36 + 14
        assert_eq!(out.overall_score, 90);
        assert!(out.red_flags.is_none());
        assert_eq!(
            out.improvement_areas,
            vec!["Increase quantification of impact to strengthen seniority signal."]
        );
    }

    #[test]
    fn test_tech_score_halves_when_one_skill_missing() {
        let out = score(&jd(), &parsed_missing_one());
        assert_eq!(out.technical_skills_score, 50);

        let tech = &out.detailed_breakdown.technical_skills;
        assert_eq!(tech[0].requirement, "Proficiency in Lean");
        assert!(!tech[0].present);
        assert_eq!(tech[0].gap_percentage, 20);
        assert!(tech[1].present);
        assert_eq!(tech[1].gap_percentage, 0);

        assert_eq!(
            out.improvement_areas[0],
            "Lean missing – 20% gap because it is a core requirement; resume has no Lean."
        );
        assert!(out.match_summary.ends_with("gaps focus on Lean."));
    }

    #[test]
    fn test_no_tech_requirements_is_neutral() {
        let jd = JobDescription::new("t", "s", "l", "d", vec!["Strong communicator".to_string()]);
        let parsed = ParsedResume {
            skills: vec![],
            experience_years: 2.0,
            evidence_lines: vec![],
        };
        let out = score(&jd, &parsed);
        assert_eq!(out.technical_skills_score, 50);
        // no tenure requirement: 60 + min(40, 10)
        assert_eq!(out.experience_score, 70);
        assert_eq!(out.cultural_fit_score, 55);
        assert!(out.detailed_breakdown.technical_skills.is_empty());
        assert_eq!(out.detailed_breakdown.experience[0].requirement, "Years of relevant experience");
    }

    #[test]
    fn test_tenure_shortfall_and_red_flag() {
        let jd = JobDescription::new(
            "t",
            "s",
            "l",
            "d",
            vec!["5+ years of relevant experience".to_string()],
        );
        let parsed = ParsedResume {
            skills: vec![],
            experience_years: 1.5,
            evidence_lines: vec![],
        };
        let out = score(&jd, &parsed);

        let tenure = &out.detailed_breakdown.experience[0];
        assert!(!tenure.present);
        assert_eq!(tenure.gap_percentage, 35);
        // ratio 0.3 -> 55 + 7.5 = 62.5 -> 62
        assert_eq!(out.experience_score, 62);

        let flags = out.red_flags.as_ref().unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].issue, "Seniority mismatch");
        assert_eq!(flags[0].evidence, "Years ≈ 1.5 (< 5+ req)");
        assert!(out.improvement_areas[0].starts_with("Years short by ≈3.5 – 35% gap vs 5+"));
    }

    #[test]
    fn test_tenure_gap_capped_at_forty() {
        let jd = JobDescription::new("t", "s", "l", "d", vec!["10+ years of relevant experience".to_string()]);
        let parsed = ParsedResume {
            skills: vec![],
            experience_years: 0.0,
            evidence_lines: vec![],
        };
        let out = score(&jd, &parsed);
        assert_eq!(out.detailed_breakdown.experience[0].gap_percentage, 40);
        assert_eq!(out.experience_score, 55);
    }

    #[test]
    fn test_improvements_capped_at_three() {
        let reqs = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|s| format!("Proficiency in {}", s))
            .chain(std::iter::once("3+ years of relevant experience".to_string()))
            .collect();
        let jd = JobDescription::new("t", "s", "l", "d", reqs);
        let parsed = ParsedResume {
            skills: vec![],
            experience_years: 0.0,
            evidence_lines: vec![],
        };
        let out = score(&jd, &parsed);
        assert_eq!(out.improvement_areas.len(), 3);
        assert_eq!(out.detailed_breakdown.technical_skills.len(), 4);
        assert_eq!(out.technical_skills_score, 0);
        assert_eq!(out.strengths_highlights, vec!["Adequate baseline with growth potential."]);
    }

    #[test]
    fn test_soft_skill_items() {
        let parsed = ParsedResume {
            skills: vec!["Lean".to_string()],
            experience_years: 3.0,
            evidence_lines: vec!["Led a cross-functional Lean rollout".to_string()],
        };
        let out = score(&jd(), &parsed);
        let soft = &out.detailed_breakdown.cultural_fit_and_soft_skills;
        assert!(soft[0].present);
        assert!(soft[1].present);
        let scope = &out.detailed_breakdown.experience[1];
        assert!(!scope.present);
        assert_eq!(scope.gap_percentage, 15);
    }

    #[test]
    fn test_years_required_first_match() {
        let scorer = RuleBasedScorer::new().unwrap();
        let reqs = vec![
            "Proficiency in Lean".to_string(),
            "At least 3+ Years of Relevant Experience".to_string(),
            "7+ years of relevant experience".to_string(),
        ];
        assert_eq!(scorer.years_required(&reqs), 3);
        assert_eq!(scorer.years_required(&[]), 0);
    }

    #[test]
    fn test_deterministic_same_inputs_same_output() {
        let a = serde_json::to_string(&score(&jd(), &parsed_has_both())).unwrap();
        let b = serde_json::to_string(&score(&jd(), &parsed_has_both())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_breakdown_gap_zero_when_present() {
        let out = score(&jd(), &parsed_missing_one());
        for item in out.breakdown_items() {
            assert_eq!(item.present, item.gap_percentage == 0, "{:?}", item);
        }
    }
}
