//! Output formatters: the JSON wire format plus console and markdown renderings

use crate::config::OutputFormat;
use crate::error::{Result, ResumeFitError};
use crate::output::report::{AssignmentOutput, RequirementItem};
use colored::{Color, Colorize};
use std::path::Path;

/// Trait for rendering a fitness report
pub trait OutputFormatter {
    fn format_report(&self, report: &AssignmentOutput) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Console formatter with colors and score badges
pub struct ConsoleFormatter {
    use_colors: bool,
}

/// JSON formatter; pretty output is the wire format consumers read
pub struct JsonFormatter {
    pretty: bool,
}

/// Markdown formatter for sharing reports
pub struct MarkdownFormatter;

/// Report generator that coordinates the formatters
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

const BREAKDOWN_TITLES: [&str; 4] = [
    "Technical Skills",
    "Experience",
    "Education & Certifications",
    "Cultural Fit & Soft Skills",
];

fn breakdown_sections(report: &AssignmentOutput) -> [(&'static str, &[RequirementItem]); 4] {
    let b = &report.detailed_breakdown;
    [
        (BREAKDOWN_TITLES[0], b.technical_skills.as_slice()),
        (BREAKDOWN_TITLES[1], b.experience.as_slice()),
        (BREAKDOWN_TITLES[2], b.education_and_certifications.as_slice()),
        (BREAKDOWN_TITLES[3], b.cultural_fit_and_soft_skills.as_slice()),
    ]
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            _ => "▒",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            _ => Color::Yellow,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: u8) -> String {
        let (badge, color) = match score {
            90..=100 => ("EXCELLENT", Color::Green),
            80..=89 => ("VERY GOOD", Color::BrightGreen),
            70..=79 => ("GOOD", Color::Yellow),
            60..=69 => ("FAIR", Color::BrightYellow),
            50..=59 => ("BELOW AVG", Color::Red),
            _ => ("POOR", Color::BrightRed),
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_item(&self, item: &RequirementItem) -> String {
        let mark = if item.present {
            self.colorize("✓", Color::Green)
        } else {
            self.colorize("✗", Color::Red)
        };
        format!(
            "  {} {} {}\n      {}\n      {}\n",
            mark,
            item.requirement,
            self.colorize(&format!("(gap {}%)", item.gap_percentage), Color::BrightBlack),
            item.evidence,
            self.colorize(&item.missing_detail, Color::BrightBlack)
        )
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &AssignmentOutput) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("RESUME FIT REPORT", 1));
        output.push_str(&format!(
            "Overall Score: {}% {}\n",
            report.overall_score,
            self.format_score_badge(report.overall_score)
        ));
        output.push_str(&format!(
            "{}\n",
            self.colorize(&report.match_summary, Color::Cyan)
        ));

        output.push_str(&self.format_header("Score Breakdown", 2));
        output.push_str(&format!("Technical Skills: {}%\n", report.technical_skills_score));
        output.push_str(&format!("Experience:       {}%\n", report.experience_score));
        output.push_str(&format!("Cultural Fit:     {}%\n", report.cultural_fit_score));

        if !report.strengths_highlights.is_empty() {
            output.push_str(&self.format_header("Strengths", 3));
            for strength in &report.strengths_highlights {
                output.push_str(&format!("  • {}\n", self.colorize(strength, Color::Green)));
            }
        }

        if !report.improvement_areas.is_empty() {
            output.push_str(&self.format_header("Improvement Areas", 3));
            for area in &report.improvement_areas {
                output.push_str(&format!("  • {}\n", self.colorize(area, Color::Yellow)));
            }
        }

        output.push_str(&self.format_header("Detailed Breakdown", 2));
        for (title, items) in breakdown_sections(report) {
            if items.is_empty() {
                continue;
            }
            output.push_str(&self.format_header(title, 3));
            for item in items {
                output.push_str(&self.format_item(item));
            }
        }

        if let Some(flags) = report.red_flags.as_ref().filter(|f| !f.is_empty()) {
            output.push_str(&self.format_header("Red Flags", 2));
            for flag in flags {
                output.push_str(&format!(
                    "• {} {}\n  {}\n",
                    self.colorize(&flag.issue, Color::Red),
                    self.colorize(&format!("({})", flag.evidence), Color::BrightBlack),
                    flag.reason
                ));
            }
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &AssignmentOutput) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    fn markdown_score_badge(score: u8) -> &'static str {
        match score {
            90..=100 => "🟢 Excellent",
            80..=89 => "🟡 Very Good",
            70..=79 => "🟠 Good",
            60..=69 => "🔴 Fair",
            50..=59 => "🔴 Below Average",
            _ => "🔴 Poor",
        }
    }

    /// Pipes would break the table
    fn cell(text: &str) -> String {
        text.replace('|', "\\|")
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &AssignmentOutput) -> Result<String> {
        let mut md = String::new();

        md.push_str("# Resume Fit Report\n\n");
        md.push_str(&format!(
            "**Overall Score:** {}% ({})\n\n",
            report.overall_score,
            Self::markdown_score_badge(report.overall_score)
        ));
        md.push_str(&format!("{}\n\n", report.match_summary));

        md.push_str("## Scores\n\n| Category | Score |\n|---|---|\n");
        md.push_str(&format!("| Technical Skills | {}% |\n", report.technical_skills_score));
        md.push_str(&format!("| Experience | {}% |\n", report.experience_score));
        md.push_str(&format!("| Cultural Fit | {}% |\n\n", report.cultural_fit_score));

        md.push_str("## Strengths\n\n");
        for strength in &report.strengths_highlights {
            md.push_str(&format!("- {}\n", strength));
        }
        md.push_str("\n## Improvement Areas\n\n");
        for area in &report.improvement_areas {
            md.push_str(&format!("- {}\n", area));
        }

        md.push_str("\n## Detailed Breakdown\n");
        for (title, items) in breakdown_sections(report) {
            md.push_str(&format!("\n### {}\n\n", title));
            if items.is_empty() {
                md.push_str("_No items._\n");
                continue;
            }
            md.push_str("| Requirement | Present | Gap | Evidence | Detail |\n|---|---|---|---|---|\n");
            for item in items {
                md.push_str(&format!(
                    "| {} | {} | {}% | {} | {} |\n",
                    Self::cell(&item.requirement),
                    if item.present { "✅" } else { "❌" },
                    item.gap_percentage,
                    Self::cell(&item.evidence),
                    Self::cell(&item.missing_detail)
                ));
            }
        }

        if let Some(flags) = report.red_flags.as_ref().filter(|f| !f.is_empty()) {
            md.push_str("\n## Red Flags\n\n");
            for flag in flags {
                md.push_str(&format!("- **{}**: {} ({})\n", flag.issue, flag.evidence, flag.reason));
            }
        }

        Ok(md)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl ReportGenerator {
    pub fn new(use_colors: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors),
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter,
        }
    }

    pub fn generate_report(&self, report: &AssignmentOutput, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report),
            OutputFormat::Json => self.json_formatter.format_report(report),
            OutputFormat::Markdown => self.markdown_formatter.format_report(report),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Write rendered output with a single trailing newline
pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut text = content.trim_end_matches('\n').to_string();
    text.push('\n');
    fs::write(file_path, text).map_err(|e| {
        ResumeFitError::OutputFormatting(format!("Failed to write {}: {}", file_path.display(), e))
    })
}
