use crate::allocator::{self, IdAllocator};
use crate::context::PrdContext;
use crate::error::{RalphError, Result};
use crate::story::UserStory;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The prd.json document. Existing entries are kept as raw JSON so fields
/// written by other tools survive a rewrite untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Store {
    /// Top-level keys this tool does not own (project, branchName, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(rename = "prdContext", default)]
    pub prd_context: Map<String, Value>,
    #[serde(rename = "userStories", default)]
    pub user_stories: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub contexts: usize,
    pub stories: usize,
    pub passing: usize,
    pub max_id: u64,
    pub next_id: u64,
}

impl Store {
    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RalphError::StoreNotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        let store: Store = serde_json::from_str(&data)?;
        Ok(store)
    }

    /// Overwrite `path` with the whole store, 2-space indented.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        crate::io::atomic_write(path, data.as_bytes())?;
        tracing::info!(
            path = %path.display(),
            contexts = self.prd_context.len(),
            stories = self.user_stories.len(),
            "store written"
        );
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    /// Set the context for `doc_id`, replacing any earlier entry in place.
    pub fn set_context(&mut self, doc_id: &str, context: &PrdContext) -> Result<()> {
        self.prd_context
            .insert(doc_id.to_string(), serde_json::to_value(context)?);
        Ok(())
    }

    /// Append stories after every existing one. Never deduplicates.
    pub fn append_stories(&mut self, stories: &[UserStory]) -> Result<()> {
        for story in stories {
            self.user_stories.push(serde_json::to_value(story)?);
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------

    /// String ids of every stored story, in order. Stories without a string
    /// `id` are skipped.
    pub fn story_ids(&self) -> impl Iterator<Item = &str> {
        self.user_stories
            .iter()
            .filter_map(|s| s.get("id").and_then(Value::as_str))
    }

    pub fn id_allocator(&self) -> Result<IdAllocator> {
        IdAllocator::after(self.story_ids())
    }

    pub fn summary(&self) -> Result<StoreSummary> {
        let max_id = allocator::max_story_number(self.story_ids());
        Ok(StoreSummary {
            contexts: self.prd_context.len(),
            stories: self.user_stories.len(),
            passing: self
                .user_stories
                .iter()
                .filter(|s| s.get("passes").and_then(Value::as_bool) == Some(true))
                .count(),
            max_id,
            next_id: allocator::next_story_number(max_id)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
