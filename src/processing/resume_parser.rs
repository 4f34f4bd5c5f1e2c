//! Deterministic resume parsing against job requirements
//!
//! Skills come only from "Proficiency in <Skill>" requirements. A resume line is
//! evidence for a skill when its normalized text contains the normalized skill
//! (plain substring containment, not word boundaries). Experience is the sum of
//! all `YYYY-MM to YYYY-MM` style ranges found anywhere in the text.

use crate::processing::document::ParsedResume;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};

/// Parser holding the compiled patterns; parsing itself is a pure function of its inputs
pub struct ResumeParser {
    skill_regex: Regex,
    date_range_regex: Regex,
    whitespace_regex: Regex,
}

impl Default for ResumeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResumeParser {
    pub fn new() -> Self {
        let skill_regex = Regex::new(r"(?i)^\s*Proficiency in\s+(.+?)\s*$")
            .expect("Invalid skill requirement regex");

        let date_range_regex = Regex::new(r"(?i)([0-9]{4})-([0-9]{2})\s*(?:to|–|-|—)\s*([0-9]{4})-([0-9]{2})")
            .expect("Invalid date range regex");

        let whitespace_regex = Regex::new(r"\s+").expect("Invalid whitespace regex");

        Self {
            skill_regex,
            date_range_regex,
            whitespace_regex,
        }
    }

    /// Parse resume text against the JD requirement list
    pub fn parse(&self, text: &str, requirements: &[String]) -> ParsedResume {
        let required_skills = self.extract_required_skills(requirements);
        let targets: Vec<(String, &str)> = required_skills
            .iter()
            .map(|skill| (self.normalize(skill), skill.as_str()))
            .collect();

        let mut evidence_lines = Vec::new();
        let mut present: BTreeSet<&str> = BTreeSet::new();

        for line in split_lines(text).map(str::trim).filter(|l| !l.is_empty()) {
            let line_norm = self.normalize(line);
            // first matching skill claims the line
            if let Some((key, _)) = targets.iter().find(|(key, _)| line_norm.contains(key.as_str())) {
                evidence_lines.push(line.to_string());
                present.insert(key.as_str());
            }
        }

        let by_key: HashMap<&str, &str> = targets.iter().map(|(k, s)| (k.as_str(), *s)).collect();
        let mut skills: Vec<String> = present
            .iter()
            .filter_map(|key| by_key.get(key).map(|s| s.to_string()))
            .collect();
        skills.sort_by_cached_key(|s| self.normalize(s));

        let months = self.experience_months(text);

        ParsedResume {
            skills,
            experience_years: months_to_years(months),
            evidence_lines,
        }
    }

    /// Canonical skill names from "Proficiency in X" requirements.
    ///
    /// Deduplicated on the normalized form (first occurrence wins), then sorted
    /// case-insensitively.
    pub fn extract_required_skills(&self, requirements: &[String]) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut skills = Vec::new();

        for requirement in requirements {
            if let Some(caps) = self.skill_regex.captures(requirement) {
                let skill = caps[1].trim().to_string();
                if seen.insert(self.normalize(&skill)) {
                    skills.push(skill);
                }
            }
        }

        skills.sort_by_cached_key(|s| self.normalize(s));
        skills
    }

    /// Total months across every date range; reversed ranges contribute zero
    pub fn experience_months(&self, text: &str) -> u64 {
        self.date_range_regex
            .captures_iter(text)
            .map(|caps| {
                let field = |i: usize| caps[i].parse::<i64>().unwrap_or(0);
                let months = (field(3) - field(1)) * 12 + (field(4) - field(2));
                months.max(0) as u64
            })
            .fold(0u64, u64::saturating_add)
    }

    /// Lowercase, trim and collapse internal whitespace
    pub fn normalize(&self, text: &str) -> String {
        self.whitespace_regex
            .replace_all(text.trim(), " ")
            .to_lowercase()
    }
}

/// Split on every line boundary: `\n`, bare `\r`, form feeds, record separators and U+2028/U+2029.
///
/// A `\r\n` pair yields an extra empty piece; callers skip blank lines anyway.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split([
        '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}', '\u{2029}',
    ])
}

/// Convert months to years rounded to one decimal, ties to even.
///
/// Works on exact integer tenths (months * 10 / 12) so that 51 months, which is
/// 4.25 years, lands on 4.2.
pub fn months_to_years(months: u64) -> f64 {
    let numerator = months.saturating_mul(5);
    let (mut tenths, remainder) = (numerator / 6, numerator % 6);
    if remainder * 2 > 6 || (remainder * 2 == 6 && tenths % 2 == 1) {
        tenths += 1;
    }
    tenths as f64 / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirements() -> Vec<String> {
        vec![
            "Proficiency in Six Sigma".to_string(),
            "Proficiency in Lean".to_string(),
            "1+ years of relevant experience".to_string(),
            "Evidence of ownership and collaboration with stakeholders".to_string(),
        ]
    }

    #[test]
    fn test_extract_required_skills_sorted() {
        let parser = ResumeParser::new();
        assert_eq!(parser.extract_required_skills(&requirements()), vec!["Lean", "Six Sigma"]);
    }

    #[test]
    fn test_extract_required_skills_dedup_keeps_first_spelling() {
        let parser = ResumeParser::new();
        let reqs = vec![
            "Proficiency in  SQL".to_string(),
            "proficiency in sql ".to_string(),
            "Proficiency in Excel".to_string(),
        ];
        assert_eq!(parser.extract_required_skills(&reqs), vec!["Excel", "SQL"]);
    }

    #[test]
    fn test_parse_matches_skills_and_evidence() {
        let parser = ResumeParser::new();
        let resume = "Program Manager at Crestel Systems (2017-05 to 2019-11)
    Delivered 5 projects using Scheduling, ERP, Oracle with measurable KPIs.
    Improved reliability by 30%.
    Collaborated with 10 stakeholders to ship on schedule.

    Associate Program Manager at Lumena Group (2019-06 to 2021-03)
    Delivered 5 projects using Project Planning, SAP, Lean with measurable KPIs.
    Improved process efficiency by 24%.
    Collaborated with 7 stakeholders to ship on schedule. Six Sigma exposure.";

        let parsed = parser.parse(resume, &requirements());

        assert_eq!(parsed.skills, vec!["Lean", "Six Sigma"]);
        assert_eq!(
            parsed.evidence_lines,
            vec![
                "Delivered 5 projects using Project Planning, SAP, Lean with measurable KPIs.",
                "Collaborated with 7 stakeholders to ship on schedule. Six Sigma exposure.",
            ]
        );
    }

    #[test]
    fn test_line_attributed_to_one_skill_only() {
        let parser = ResumeParser::new();
        let parsed = parser.parse("Lean and Six Sigma black belt", &requirements());
        assert_eq!(parsed.evidence_lines.len(), 1);
        // "lean" is checked first, so six sigma is never credited from this line
        assert_eq!(parsed.skills, vec!["Lean"]);
    }

    #[test]
    fn test_substring_containment_is_intentional() {
        let parser = ResumeParser::new();
        let parsed = parser.parse("Worked at Leanware Inc.", &requirements());
        assert_eq!(parsed.skills, vec!["Lean"]);
    }

    #[test]
    fn test_experience_years_from_date_ranges() {
        let parser = ResumeParser::new();
        let resume = "Program Manager (2017-05 to 2019-11)\nAssociate Program Manager (2019-06 to 2021-03)";
        assert_eq!(parser.experience_months(resume), 51);
        let parsed = parser.parse(resume, &requirements());
        assert!((parsed.experience_years - 4.2).abs() < 1e-9);
    }

    #[test]
    fn test_date_separators_and_reversed_ranges() {
        let parser = ResumeParser::new();
        assert_eq!(parser.experience_months("2020-01 – 2020-07"), 6);
        assert_eq!(parser.experience_months("2020-01—2021-01"), 12);
        assert_eq!(parser.experience_months("2020-01-2020-04"), 3);
        assert_eq!(parser.experience_months("2020-01 TO 2020-02"), 1);
        assert_eq!(parser.experience_months("2021-05 to 2019-01"), 0);
        assert_eq!(parser.experience_months("since 2019 until now"), 0);
    }

    #[test]
    fn test_months_to_years_rounds_half_to_even() {
        assert_eq!(months_to_years(51), 4.2); // 4.25
        assert_eq!(months_to_years(3), 0.2); // 0.25
        assert_eq!(months_to_years(9), 0.8); // 0.75
        assert_eq!(months_to_years(12), 1.0);
        assert_eq!(months_to_years(0), 0.0);
        assert_eq!(months_to_years(7), 0.6); // 0.5833
    }

    #[test]
    fn test_deterministic_output_for_same_input() {
        let parser = ResumeParser::new();
        let resume = "Program Manager (2017-05 to 2019-11)\nLean initiatives; Six Sigma projects.";
        assert_eq!(parser.parse(resume, &requirements()), parser.parse(resume, &requirements()));
    }

    #[test]
    fn test_many_ranges_saturate_instead_of_overflowing() {
        let parser = ResumeParser::new();
        let resume = "0000-01 to 9999-12\n".repeat(36_000);
        let months = parser.experience_months(&resume);
        assert_eq!(months, 36_000 * 119_999);
        assert!(parser.parse(&resume, &requirements()).experience_years > 0.0);
    }

    #[test]
    fn test_non_ascii_digits_are_not_dates() {
        let parser = ResumeParser::new();
        assert_eq!(parser.experience_months("٢٠١٧-٠٥ to ٢٠١٩-١١"), 0);
        assert_eq!(parser.experience_months("٢٠١٧-٠٥ to ٢٠١٩-١١; 2020-01 to 2020-03"), 2);
    }

    #[test]
    fn test_bare_carriage_returns_split_lines() {
        let parser = ResumeParser::new();
        let parsed = parser.parse("Lean rollout\rSix Sigma audit\r\nOther work", &requirements());
        assert_eq!(parsed.evidence_lines, vec!["Lean rollout", "Six Sigma audit"]);
        assert_eq!(parsed.skills, vec!["Lean", "Six Sigma"]);
    }
}
