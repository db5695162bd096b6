use crate::allocator::IdAllocator;
use crate::error::Result;
use crate::markdown::{lazy_end, marked_runs, truncate_chars};
use crate::paths;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const MAX_STORIES_PER_DOCUMENT: usize = 20;
pub const MAX_SECTION_STORIES: usize = 10;
pub const MAX_EXTRACTED_CRITERIA: usize = 15;
pub const MAX_CRITERIA: usize = 20;
pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 300;

pub const TYPECHECK_CRITERION: &str = "Typecheck passes";
pub const BROWSER_CRITERION: &str = "Verify in browser using dev-browser skill";

/// Second-level headings that structure a document rather than describe a
/// feature.
pub const STRUCTURAL_SECTIONS: &[&str] = &[
    "Problem",
    "Proposed Change",
    "Entities",
    "API Requirements",
    "UI Specifications",
    "Acceptance Criteria",
    "Implementation Notes",
    "Future Enhancements",
];

/// Substrings that mark a story as user-facing.
pub const UI_KEYWORDS: &[&str] = &[
    "ui", "component", "page", "view", "button", "dialog", "modal", "form", "display", "render",
    "show", "visible",
];

// ---------------------------------------------------------------------------
// UserStory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStory {
    pub id: String,
    pub title: String,
    pub description: String,
    pub acceptance_criteria: Vec<String>,
    /// 1-based position within the originating document.
    pub priority: u32,
    pub passes: bool,
    /// `<doc id>: <story id in the document>`
    pub notes: String,
}

/// A story-shaped slice of a document before conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryBlock {
    /// `US-...` from the heading, or the section heading for implicit stories.
    pub source_id: String,
    pub content: String,
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

static STORY_HEADING_RE: OnceLock<Regex> = OnceLock::new();
static SECTION_HEADING_RE: OnceLock<Regex> = OnceLock::new();
static WANT_RE: OnceLock<Regex> = OnceLock::new();
static NARRATIVE_RE: OnceLock<Regex> = OnceLock::new();
static CRITERIA_BLOCK_RE: OnceLock<Regex> = OnceLock::new();
static CHECKBOX_RE: OnceLock<Regex> = OnceLock::new();

fn story_heading_re() -> &'static Regex {
    STORY_HEADING_RE.get_or_init(|| Regex::new(r"### (US-[A-Z0-9-]+):\s*").unwrap())
}

fn section_heading_re() -> &'static Regex {
    SECTION_HEADING_RE.get_or_init(|| Regex::new(r"(?m)^## (.+)$").unwrap())
}

fn want_re() -> &'static Regex {
    WANT_RE.get_or_init(|| {
        Regex::new(r"(?s)\*\*As a\*\*.*?\*\*I want to\*\*\s*(.+?)\s*\*\*So that\*\*").unwrap()
    })
}

fn narrative_re() -> &'static Regex {
    NARRATIVE_RE.get_or_init(|| {
        Regex::new(r"(?s)\*\*As a\*\*\s*(.+?)\s*\*\*I want to\*\*\s*(.+?)\s*\*\*So that\*\*\s*")
            .unwrap()
    })
}

fn criteria_block_re() -> &'static Regex {
    CRITERIA_BLOCK_RE.get_or_init(|| {
        Regex::new(r"\*\*Acceptance Criteria:\*\*\s*\n((?:- \[ \].*\n?)+)").unwrap()
    })
}

fn checkbox_re() -> &'static Regex {
    CHECKBOX_RE.get_or_init(|| Regex::new(r"- \[ \]\s*").unwrap())
}

// ---------------------------------------------------------------------------
// Candidate discovery
// ---------------------------------------------------------------------------

/// Story blocks in source order: explicit `### US-...:` headings, else
/// non-structural `## ` sections. At most
/// [`MAX_STORIES_PER_DOCUMENT`] are returned.
pub fn find_story_blocks(content: &str) -> Vec<StoryBlock> {
    let mut blocks: Vec<StoryBlock> =
        marked_runs(content, story_heading_re(), &["\n\n### ", "\n\n## "])
            .into_iter()
            .map(|(caps, body)| StoryBlock {
                source_id: caps[1].to_string(),
                content: body.to_string(),
            })
            .collect();

    if blocks.is_empty() {
        blocks = section_heading_re()
            .captures_iter(content)
            .map(|c| c.get(1).map_or("", |m| m.as_str()))
            .filter(|heading| !STRUCTURAL_SECTIONS.contains(heading))
            .take(MAX_SECTION_STORIES)
            .map(|heading| StoryBlock {
                source_id: heading.to_string(),
                content: format!(
                    "**As a** user\n**I want to** {}\n**So that** I can use this feature.",
                    heading.to_lowercase()
                ),
            })
            .collect();
    }

    blocks.truncate(MAX_STORIES_PER_DOCUMENT);
    blocks
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Extract every story from one document, drawing ids from `ids` in order.
/// A document with no story blocks yields a single default story.
pub fn extract_stories(
    content: &str,
    doc_id: &str,
    ids: &mut IdAllocator,
) -> Result<Vec<UserStory>> {
    let blocks = find_story_blocks(content);
    if blocks.is_empty() {
        let story = default_story(doc_id, ids.allocate()?);
        tracing::debug!(doc = doc_id, id = %story.id, "no story blocks; using default story");
        return Ok(vec![story]);
    }

    blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            let story = convert_block(block, doc_id, i as u32 + 1, ids.allocate()?);
            tracing::debug!(
                doc = doc_id,
                id = %story.id,
                source = %block.source_id,
                criteria = story.acceptance_criteria.len(),
                "extracted story"
            );
            Ok(story)
        })
        .collect()
}

pub fn convert_block(block: &StoryBlock, doc_id: &str, priority: u32, id: String) -> UserStory {
    let content = block.content.as_str();
    let title = story_title(content, doc_id);
    let description = story_description(content, &title);
    let acceptance_criteria = story_criteria(content);

    UserStory {
        id,
        title,
        description,
        acceptance_criteria,
        priority,
        passes: false,
        notes: format!("{doc_id}: {}", block.source_id),
    }
}

/// The "I want to" clause, else the first line of the block.
fn story_title(content: &str, doc_id: &str) -> String {
    if let Some(c) = want_re().captures(content) {
        return truncate_chars(c[1].trim(), TITLE_MAX);
    }
    match content.trim().lines().next() {
        Some(line) => truncate_chars(line.trim(), TITLE_MAX),
        None => format!("Implement {doc_id} feature"),
    }
}

fn story_description(content: &str, title: &str) -> String {
    let description = narrative(content).unwrap_or_else(|| {
        format!(
            "As a user, I want {} so that I can use this feature.",
            title.to_lowercase()
        )
    });
    truncate_chars(&description, DESCRIPTION_MAX)
}

/// "As a X, I want Y so that Z" from a `**As a** / **I want to** / **So that**`
/// block. The "so that" clause ends at a blank line or the next bold marker.
fn narrative(content: &str) -> Option<String> {
    let caps = narrative_re().captures(content)?;
    let start = caps.get(0)?.end();
    let end = lazy_end(content, start, &["\n\n", "**"])?;
    Some(format!(
        "As a {}, I want {} so that {}",
        caps[1].trim(),
        caps[2].trim(),
        content[start..end].trim()
    ))
}

fn story_criteria(content: &str) -> Vec<String> {
    let mut criteria: Vec<String> = criteria_block_re()
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|block| {
            marked_runs(block.as_str(), checkbox_re(), &["\n- [ ]", "\n\n"])
                .into_iter()
                .take(MAX_EXTRACTED_CRITERIA)
                .map(|(_, item)| item.trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    if criteria.is_empty() {
        criteria = vec![
            "Feature implemented as specified".to_string(),
            TYPECHECK_CRITERION.to_string(),
        ];
    } else if !criteria.iter().any(|c| mentions_typecheck(c)) {
        criteria.push(TYPECHECK_CRITERION.to_string());
    }

    if is_ui_content(content) && !criteria.iter().any(|c| mentions_browser_check(c)) {
        criteria.push(BROWSER_CRITERION.to_string());
    }

    criteria.truncate(MAX_CRITERIA);
    criteria
}

fn default_story(doc_id: &str, id: String) -> UserStory {
    let feature = paths::document_slug(doc_id).replace('-', " ").to_lowercase();
    UserStory {
        id,
        title: format!("Implement {doc_id}"),
        description: format!("As a user, I want {feature} so that I can use this feature."),
        acceptance_criteria: vec![
            "Feature implemented as specified in PRD".to_string(),
            TYPECHECK_CRITERION.to_string(),
            BROWSER_CRITERION.to_string(),
        ],
        priority: 1,
        passes: false,
        notes: format!("{doc_id}: Initial implementation"),
    }
}

// ---------------------------------------------------------------------------
// Keyword classification (case-insensitive substring matches)
// ---------------------------------------------------------------------------

pub fn mentions_typecheck(criterion: &str) -> bool {
    criterion.to_lowercase().contains("typecheck")
}

pub fn mentions_browser_check(criterion: &str) -> bool {
    let lower = criterion.to_lowercase();
    lower.contains("browser") || lower.contains("verify")
}

pub fn is_ui_content(content: &str) -> bool {
    let lower = content.to_lowercase();
    UI_KEYWORDS.iter().any(|k| lower.contains(k))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT_DOC: &str = "\
# CHANGE: Add Export

## User Stories

### US-001: Export Button

**As a** analyst
**I want to** download my report as CSV
**So that** I can share it offline

**Acceptance Criteria:**
- [ ] Export button appears on report page
- [ ] CSV contains all visible rows

### US-002: Export API

**As a** integrator
**I want to** fetch exports over HTTP
**So that** scripts can pull data

**Acceptance Criteria:**
- [ ] Endpoint returns text/csv
- [ ] Typecheck passes

## Implementation Notes

Nothing special.
";

    fn extract(content: &str, start: u64) -> (Vec<UserStory>, IdAllocator) {
        let mut ids = IdAllocator::starting_at(start);
        let stories = extract_stories(content, "CHANGE-add-export", &mut ids).unwrap();
        (stories, ids)
    }

    #[test]
    fn explicit_story_block() {
        let (stories, ids) = extract(EXPORT_DOC, 10);
        assert_eq!(stories.len(), 2);
        assert_eq!(ids.peek(), 12);

        let s = &stories[0];
        assert_eq!(s.id, "US-10");
        assert_eq!(s.title, "download my report as CSV");
        assert_eq!(
            s.description,
            "As a analyst, I want download my report as CSV so that I can share it offline"
        );
        assert_eq!(
            s.acceptance_criteria,
            vec![
                "Export button appears on report page",
                "CSV contains all visible rows",
                TYPECHECK_CRITERION,
                BROWSER_CRITERION,
            ]
        );
        assert_eq!(s.priority, 1);
        assert!(!s.passes);
        assert_eq!(s.notes, "CHANGE-add-export: US-001");
    }

    #[test]
    fn existing_typecheck_is_not_duplicated() {
        let (stories, _) = extract(EXPORT_DOC, 1);
        let s = &stories[1];
        assert_eq!(s.id, "US-2");
        assert_eq!(s.priority, 2);
        assert_eq!(
            s.acceptance_criteria,
            vec!["Endpoint returns text/csv", "Typecheck passes"]
        );
    }

    #[test]
    fn non_ui_story_gets_only_typecheck() {
        let doc = "### US-7: Nightly job\n\n**Acceptance Criteria:**\n- [ ] Job runs at 2am\n- [ ] Failures are logged\n";
        let (stories, _) = extract(doc, 1);
        assert_eq!(
            stories[0].acceptance_criteria,
            vec!["Job runs at 2am", "Failures are logged", TYPECHECK_CRITERION]
        );
        assert_eq!(stories[0].title, "Nightly job");
        assert_eq!(
            stories[0].description,
            "As a user, I want nightly job so that I can use this feature."
        );
    }

    #[test]
    fn missing_criteria_use_defaults() {
        let doc = "### US-7: Nightly job\n\nRuns at 2am.\n";
        let (stories, _) = extract(doc, 1);
        assert_eq!(
            stories[0].acceptance_criteria,
            vec!["Feature implemented as specified", TYPECHECK_CRITERION]
        );
    }

    #[test]
    fn existing_verification_suppresses_browser_criterion() {
        let doc = "### US-8: Settings page\n\n**Acceptance Criteria:**\n- [ ] Verify layout on mobile\n";
        let (stories, _) = extract(doc, 1);
        assert_eq!(
            stories[0].acceptance_criteria,
            vec!["Verify layout on mobile", TYPECHECK_CRITERION]
        );
    }

    #[test]
    fn criteria_are_capped() {
        let items: String = (1..=18).map(|i| format!("- [ ] Item {i}\n")).collect();
        let doc = format!("### US-9: Batch job\n\n**Acceptance Criteria:**\n{items}");
        let (stories, _) = extract(&doc, 1);
        let criteria = &stories[0].acceptance_criteria;
        assert_eq!(criteria.len(), 16);
        assert_eq!(criteria[14], "Item 15");
        assert_eq!(criteria[15], TYPECHECK_CRITERION);
    }

    #[test]
    fn checked_items_are_ignored() {
        let doc = "### US-9: Batch job\n\n**Acceptance Criteria:**\n- [ ] First item\n- [ ] Second item\n- [x] Done item\n";
        let (stories, _) = extract(doc, 1);
        assert_eq!(
            stories[0].acceptance_criteria,
            vec!["First item", "Second item", TYPECHECK_CRITERION]
        );
    }

    #[test]
    fn alternate_story_ids_are_recognized() {
        let doc = "### US-AUTH-1: Sign in\n\nBody\n\n### US-AUTH-2: Sign out\n\nBody\n";
        let (stories, _) = extract(doc, 5);
        let notes: Vec<&str> = stories.iter().map(|s| s.notes.as_str()).collect();
        assert_eq!(
            notes,
            vec!["CHANGE-add-export: US-AUTH-1", "CHANGE-add-export: US-AUTH-2"]
        );
    }

    #[test]
    fn sections_become_implicit_stories() {
        let doc = "# CHANGE: Search\n\n## Problem\n\nSlow.\n\n## Fuzzy Matching\n\nText.\n\n## Implementation Notes\n\nNone.\n\n## Saved Queries\n\nText.\n";
        let (stories, _) = extract(doc, 1);
        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].title, "fuzzy matching");
        assert_eq!(
            stories[0].description,
            "As a user, I want fuzzy matching so that I can use this feature."
        );
        assert_eq!(stories[0].notes, "CHANGE-add-export: Fuzzy Matching");
        assert_eq!(stories[1].title, "saved queries");
        assert_eq!(stories[1].priority, 2);
    }

    #[test]
    fn implicit_stories_are_capped_at_ten() {
        let doc: String = (1..=12).map(|i| format!("## Area {i}\n\ntext\n\n")).collect();
        assert_eq!(find_story_blocks(&doc).len(), MAX_SECTION_STORIES);
    }

    #[test]
    fn explicit_stories_are_capped_at_twenty() {
        let doc: String = (1..=25)
            .map(|i| format!("### US-{i}: Story {i}\n\ntext\n\n"))
            .collect();
        let (stories, ids) = extract(&doc, 1);
        assert_eq!(stories.len(), MAX_STORIES_PER_DOCUMENT);
        assert_eq!(stories[19].title, "Story 20");
        assert_eq!(ids.peek(), 21);
    }

    #[test]
    fn running_out_of_ids_is_an_error() {
        let doc = "## Alpha\n\ntext\n\n## Beta\n\ntext\n";
        let mut ids = IdAllocator::starting_at(u64::MAX - 1);
        let err = extract_stories(doc, "CHANGE-b", &mut ids).unwrap_err();
        assert!(matches!(err, crate::error::RalphError::IdOverflow(_)));
    }

    #[test]
    fn document_without_stories_gets_default() {
        let doc = "# CHANGE: Add Export\n\n## Problem\n\nSlow.\n\n## Proposed Change\n\nFix it.\n";
        let (stories, ids) = extract(doc, 3);
        assert_eq!(stories.len(), 1);
        let s = &stories[0];
        assert_eq!(s.id, "US-3");
        assert_eq!(s.priority, 1);
        assert_eq!(s.title, "Implement CHANGE-add-export");
        assert_eq!(
            s.description,
            "As a user, I want add export so that I can use this feature."
        );
        assert_eq!(s.acceptance_criteria.len(), 3);
        assert_eq!(s.notes, "CHANGE-add-export: Initial implementation");
        assert_eq!(ids.peek(), 4);
    }

    #[test]
    fn title_and_description_are_truncated() {
        let want = "w".repeat(150);
        let doc = format!(
            "### US-1: Long\n\n**As a** user\n**I want to** {want}\n**So that** {}\n",
            "z".repeat(300)
        );
        let (stories, _) = extract(&doc, 1);
        assert_eq!(stories[0].title.chars().count(), TITLE_MAX);
        assert_eq!(stories[0].description.chars().count(), DESCRIPTION_MAX);
        assert!(stories[0].description.starts_with("As a user, I want www"));
    }

    #[test]
    fn every_story_has_typecheck() {
        for doc in [EXPORT_DOC, "", "## Dashboard\n", "### US-1: X\n\nplain\n"] {
            let (stories, _) = extract(doc, 1);
            assert!(!stories.is_empty());
            for s in &stories {
                assert!(
                    s.acceptance_criteria.iter().any(|c| mentions_typecheck(c)),
                    "missing typecheck in {s:?}"
                );
            }
        }
    }

    #[test]
    fn ui_keywords_are_substring_matches() {
        assert!(is_ui_content("Build the thing"));
        assert!(is_ui_content("A MODAL appears"));
        assert!(!is_ui_content("Nightly batch job"));
    }

    #[test]
    fn serializes_in_camel_case() {
        let (stories, _) = extract("", 1);
        let value = serde_json::to_value(&stories[0]).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "id",
                "title",
                "description",
                "acceptanceCriteria",
                "priority",
                "passes",
                "notes"
            ]
        );
    }
}
