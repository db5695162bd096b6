use crate::error::{RalphError, Result};
use crate::paths;
use std::path::{Path, PathBuf};

/// One `CHANGE-<slug>.md` file, read whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeDocument {
    /// File stem, e.g. `CHANGE-add-export`.
    pub id: String,
    pub path: PathBuf,
    pub content: String,
}

impl ChangeDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let id = paths::document_id(path)?;
        let content = std::fs::read_to_string(path)?;
        Ok(Self {
            id,
            path: path.to_path_buf(),
            content,
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.md", self.id))
    }
}

/// Paths of every `CHANGE-*.md` file in `dir`, in lexical filename order.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(RalphError::DocumentsDirNotFound(dir.to_path_buf()));
    }
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if paths::is_document_name(&name) && entry.file_type()?.is_file() {
            found.push(entry.path());
        }
    }
    found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(found)
}

/// Read every document in `dir`. Any unreadable file aborts the whole read.
pub fn read_documents(dir: &Path) -> Result<Vec<ChangeDocument>> {
    list_documents(dir)?
        .iter()
        .map(|p| ChangeDocument::load(p))
        .collect()
}
