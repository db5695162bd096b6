use crate::markdown::{lazy_end, marked_runs, section, truncate_chars, truncate_ellipsis};
use crate::paths;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const BACKGROUND_MAX: usize = 400;
pub const MAX_GOALS: usize = 6;
pub const GOAL_MAX: usize = 150;
pub const MAX_CONCEPTS: usize = 5;
pub const CONCEPT_MAX: usize = 200;

/// Concept name to definition, in document order.
pub type CoreConcepts = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// PrdContext
// ---------------------------------------------------------------------------

/// Summary of one change document, stored under `prdContext[<doc id>]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrdContext {
    pub name: String,
    pub overview: String,
    pub background: String,
    pub goals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_concepts: Option<CoreConcepts>,
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

static TITLE_RE: OnceLock<Regex> = OnceLock::new();
static PROBLEM_RE: OnceLock<Regex> = OnceLock::new();
static PROPOSED_RE: OnceLock<Regex> = OnceLock::new();
static NUMBERED_ITEM_RE: OnceLock<Regex> = OnceLock::new();
static FEATURE_HEADING_RE: OnceLock<Regex> = OnceLock::new();
static CONCEPTS_RE: OnceLock<Regex> = OnceLock::new();
static CONCEPT_TERM_RE: OnceLock<Regex> = OnceLock::new();

fn title_re() -> &'static Regex {
    TITLE_RE.get_or_init(|| Regex::new(r"(?m)^# CHANGE:\s*(.+)$").unwrap())
}

fn problem_re() -> &'static Regex {
    PROBLEM_RE.get_or_init(|| Regex::new(r"## Problem\s*\n\n").unwrap())
}

fn proposed_re() -> &'static Regex {
    PROPOSED_RE.get_or_init(|| Regex::new(r"## Proposed Change\s*\n\n").unwrap())
}

fn numbered_item_re() -> &'static Regex {
    NUMBERED_ITEM_RE.get_or_init(|| Regex::new(r"(?m)^\d+\.\s+(.+)$").unwrap())
}

fn feature_heading_re() -> &'static Regex {
    FEATURE_HEADING_RE.get_or_init(|| Regex::new(r"### \d+\.\s+").unwrap())
}

fn concepts_re() -> &'static Regex {
    CONCEPTS_RE.get_or_init(|| Regex::new(r"## (?:Core )?Concepts\s*\n\n").unwrap())
}

fn concept_term_re() -> &'static Regex {
    CONCEPT_TERM_RE.get_or_init(|| Regex::new(r"\*\*(\w+)\*\*:\s*").unwrap())
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Build the context record for one document. Every field has a fallback,
/// so this never fails.
pub fn extract_context(content: &str, doc_id: &str) -> PrdContext {
    let name = title_re()
        .captures(content)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_else(|| paths::document_slug(doc_id));

    let problem = section(content, problem_re(), &["\n\n", "\n###", "\n##"]).map(str::trim);

    let overview = match problem {
        Some(p) => overview_from(p),
        None => format!("Implements {name} feature"),
    };
    let background = match problem {
        Some(p) => truncate_ellipsis(p, BACKGROUND_MAX),
        None => format!("Adds {name} functionality to the platform"),
    };

    let mut goals = extract_goals(content);
    if goals.is_empty() {
        goals.push(format!("Implement {name} feature"));
    }

    PrdContext {
        core_concepts: extract_concepts(content),
        name,
        overview,
        background,
        goals,
    }
}

/// First sentence of the problem paragraph, ending in a period. Never
/// truncated.
fn overview_from(problem: &str) -> String {
    let first = problem.split(". ").next().unwrap_or(problem);
    if first.ends_with('.') {
        first.to_string()
    } else {
        format!("{first}.")
    }
}

/// Numbered items under "Proposed Change", else the first `### N. ` feature
/// heading. Empty when neither exists.
fn extract_goals(content: &str) -> Vec<String> {
    let mut goals: Vec<String> = section(content, proposed_re(), &["\n\n## "])
        .map(|body| {
            numbered_item_re()
                .captures_iter(body)
                .take(MAX_GOALS)
                .map(|c| truncate_chars(c[1].trim(), GOAL_MAX))
                .collect()
        })
        .unwrap_or_default();

    if goals.is_empty() {
        if let Some(m) = feature_heading_re().find(content) {
            if let Some(end) = lazy_end(content, m.end(), &["\n\n###", "\n##"]) {
                goals.push(truncate_chars(content[m.end()..end].trim(), GOAL_MAX));
            }
        }
    }
    goals
}

fn extract_concepts(content: &str) -> Option<CoreConcepts> {
    let body = section(content, concepts_re(), &["\n\n## "])?;
    let mut concepts = CoreConcepts::new();
    for (caps, definition) in marked_runs(body, concept_term_re(), &["\n\n", "**"])
        .into_iter()
        .take(MAX_CONCEPTS)
    {
        concepts.insert(
            caps[1].to_string(),
            serde_json::Value::String(truncate_chars(definition.trim(), CONCEPT_MAX)),
        );
    }
    (!concepts.is_empty()).then_some(concepts)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
