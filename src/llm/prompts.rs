//! Deterministic prompt construction for the scoring and repair calls

use crate::processing::document::{sort_case_insensitive, JobDescription, ParsedResume};
use crate::processing::retriever::{RetrievalHit, RetrievalMap};
use serde_json::{json, Map, Value};

/// Repair requests quote at most this many validation errors
pub const MAX_REPAIR_ERRORS: usize = 10;

const SYSTEM_BLOCK: &str = "You are an evaluation service.
Return a SINGLE JSON object ONLY that strictly validates against the provided JSON_SCHEMA.
Do not include explanations, markdown, or any extra text before or after the JSON.
If uncertain, make the best deterministic judgment using only the provided evidence.";

const TASK_BLOCK: &str = "Using JOB, PARSED_RESUME, and RETRIEVAL, produce scores and explanations that match JSON_SCHEMA.
- Be faithful to the evidence.
- Scores are integers 0..100.
- All arrays and fields required by the schema must be present.
- If an item is missing, explain the gap in missingDetail.
- No extra keys.";

/// Build the six-section scoring prompt.
///
/// Pure function of its inputs: requirements, skills and evidence lines are sorted
/// case-insensitively, retrieval hits by `(distance rounded to 8 dp, id)`, and every
/// JSON block is written with sorted keys.
pub fn build_prompt(
    jd: &JobDescription,
    parsed: &ParsedResume,
    hits: &RetrievalMap,
    schema: &Value,
) -> String {
    let requirements = stable_sorted(&jd.requirements);

    let job = json!({
        "title": jd.title,
        "sector": jd.sector,
        "location": jd.location,
        "description": jd.description,
        "requirements": requirements,
    });

    let parsed_resume = json!({
        "skills": stable_sorted(&parsed.skills),
        "experience_years": parsed.experience_years,
        "evidence_lines": stable_sorted(&parsed.evidence_lines),
    });

    let mut retrieval = Map::new();
    for requirement in &requirements {
        let ranked = hits
            .get(requirement)
            .map(|h| sorted_hits(h))
            .unwrap_or_default();
        retrieval.insert(requirement.clone(), Value::Array(ranked));
    }

    let sections = [
        ("SYSTEM", SYSTEM_BLOCK.to_string()),
        ("JSON_SCHEMA", canonical_json(schema)),
        ("JOB", canonical_json(&job)),
        ("PARSED_RESUME", canonical_json(&parsed_resume)),
        ("RETRIEVAL", canonical_json(&Value::Object(retrieval))),
        ("TASK", TASK_BLOCK.to_string()),
    ];

    sections
        .iter()
        .map(|(label, body)| format!("{}:\n{}", label, body))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Follow-up prompt quoting the invalid JSON and up to ten validation errors
pub fn build_repair_prompt(bad_json: &str, errors: &[String]) -> String {
    let bullets = errors
        .iter()
        .take(MAX_REPAIR_ERRORS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n- ");

    format!(
        "Your previous JSON did not validate against the schema.\n\
         Here is your last JSON:\n{}\n\n\
         Here are validation errors (bulleted):\n- {}\n\n\
         Return a corrected JSON object ONLY that fixes these issues.",
        bad_json, bullets
    )
}

/// Serialize with object keys in codepoint order and `", "` / `": "` separators.
///
/// Independent of whether `serde_json` maps preserve insertion order.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push_str(": ");
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        leaf => out.push_str(&leaf.to_string()),
    }
}

fn stable_sorted(items: &[String]) -> Vec<String> {
    let mut out: Vec<String> = items.iter().filter(|s| !s.trim().is_empty()).cloned().collect();
    sort_case_insensitive(&mut out);
    out
}

fn sorted_hits(hits: &[RetrievalHit]) -> Vec<Value> {
    let mut ranked: Vec<&RetrievalHit> = hits.iter().collect();
    ranked.sort_by(|a, b| {
        round8(a.distance)
            .total_cmp(&round8(b.distance))
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked
        .into_iter()
        .map(|hit| {
            json!({
                "id": hit.id,
                "text": hit.text,
                "distance": hit.distance,
                "metadata": hit.metadata,
            })
        })
        .collect()
}

fn round8(value: f64) -> f64 {
    (value * 1e8).round_ties_even() / 1e8
}
