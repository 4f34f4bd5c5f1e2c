//! Plain-text job descriptions
//!
//! [`TextJdParser`] is the capability the input manager is given at construction
//! when plain-text JDs are supported. [`HeuristicJdParser`] is the bundled
//! keyword-table implementation.

use crate::error::Result;
use crate::processing::document::{sort_case_insensitive, JobDescription};
use regex::Regex;
use std::collections::HashSet;

const UNKNOWN_ROLE: &str = "Unknown Role";
const UNKNOWN: &str = "Unknown";
const DEGREE_REQUIREMENT: &str = "Bachelor's degree or equivalent experience";

pub trait TextJdParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<JobDescription>;
}

pub struct HeuristicJdParser {
    sector_rules: Vec<(Regex, &'static str)>,
    city_rules: Vec<(Regex, &'static str)>,
    requirement_line_regex: Regex,
    years_regex: Regex,
    degree_regex: Regex,
    hybrid_regex: Regex,
    remote_regex: Regex,
}

impl Default for HeuristicJdParser {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicJdParser {
    pub fn new() -> Self {
        // first match wins, in this order
        let sector_rules = vec![
            (r"(?i)operations|supply\s*chain", "Operations & Supply Chain"),
            (r"(?i)data|analytics", "Data & Analytics"),
            (r"(?i)software|engineering|developer", "Software Engineering"),
            (r"(?i)product\s+manager|product\s+management", "Product Management"),
        ]
        .into_iter()
        .map(|(pattern, name)| (Regex::new(pattern).expect("Invalid sector regex"), name))
        .collect();

        let city_rules = vec![
            (r"(?i)\bcairo\b", "Cairo"),
            (r"(?i)\bgiza\b", "Giza"),
            (r"(?i)\balexandria\b", "Alexandria"),
        ]
        .into_iter()
        .map(|(pattern, city)| (Regex::new(pattern).expect("Invalid city regex"), city))
        .collect();

        Self {
            sector_rules,
            city_rules,
            requirement_line_regex: Regex::new(r"(?i)^\s*[-•*]?\s*(Proficiency in\s+.+?)\s*$")
                .expect("Invalid requirement line regex"),
            years_regex: Regex::new(r"(?i)(\d+)\+\s*years\s+of\s+relevant\s+experience")
                .expect("Invalid years regex"),
            degree_regex: Regex::new(r"(?i)bachelor\w*|mba|degree").expect("Invalid degree regex"),
            hybrid_regex: Regex::new(r"(?i)hybrid").expect("Invalid hybrid regex"),
            remote_regex: Regex::new(r"(?i)remote").expect("Invalid remote regex"),
        }
    }

    fn requirements(&self, lines: &[&str], full_text: &str) -> Vec<String> {
        let mut found: Vec<String> = lines
            .iter()
            .filter_map(|line| self.requirement_line_regex.captures(line))
            .map(|caps| caps[1].trim().to_string())
            .collect();

        if let Some(caps) = self.years_regex.captures(full_text) {
            found.push(format!("{}+ years of relevant experience", &caps[1]));
        }
        if self.degree_regex.is_match(full_text) {
            found.push(DEGREE_REQUIREMENT.to_string());
        }

        let mut seen = HashSet::new();
        let mut requirements: Vec<String> = found
            .into_iter()
            .filter(|r| !r.is_empty() && seen.insert(r.clone()))
            .collect();
        sort_case_insensitive(&mut requirements);
        requirements
    }

    fn sector(&self, full_text: &str) -> &'static str {
        self.sector_rules
            .iter()
            .find(|(regex, _)| regex.is_match(full_text))
            .map(|(_, name)| *name)
            .unwrap_or(UNKNOWN)
    }

    fn location(&self, full_text: &str) -> String {
        let city = self
            .city_rules
            .iter()
            .find(|(regex, _)| regex.is_match(full_text))
            .map(|(_, city)| *city);

        if self.hybrid_regex.is_match(full_text) {
            return match city {
                Some(city) => format!("Hybrid – {}", city),
                None => "Hybrid".to_string(),
            };
        }
        if self.remote_regex.is_match(full_text) {
            return "Remote – EMEA".to_string();
        }
        match city {
            Some(city) => format!("{}, Egypt", city),
            None => UNKNOWN.to_string(),
        }
    }
}

impl TextJdParser for HeuristicJdParser {
    fn parse(&self, text: &str) -> Result<JobDescription> {
        let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
        let full_text = lines.join("\n");

        let first_index = lines.iter().position(|l| !l.trim().is_empty());
        let title = lines
            .iter()
            .map(|l| l.trim().trim_start_matches(|c| matches!(c, '-' | '•' | '*' | ' ')))
            .find(|l| !l.is_empty())
            .unwrap_or(UNKNOWN_ROLE)
            .to_string();

        let description = match first_index {
            Some(i) => lines[i + 1..].join("\n").trim().to_string(),
            None => String::new(),
        };
        let description = if description.is_empty() { title.clone() } else { description };

        Ok(JobDescription::new(
            title,
            self.sector(&full_text),
            self.location(&full_text),
            description,
            self.requirements(&lines, &full_text),
        ))
    }
}
