use crate::error::{RalphError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const RALPH_DIR: &str = ".ralph";
pub const CONFIG_FILE: &str = ".ralph/config.yaml";

pub const PRDS_DIR: &str = "PRDs/Pending";
pub const STORE_FILE: &str = "scripts/ralph/prd.json";

/// Every change document is named `CHANGE-<slug>.md`; its id keeps the prefix.
pub const DOCUMENT_PREFIX: &str = "CHANGE-";
pub const DOCUMENT_EXT: &str = "md";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn default_prds_dir(root: &Path) -> PathBuf {
    root.join(PRDS_DIR)
}

pub fn default_store_path(root: &Path) -> PathBuf {
    root.join(STORE_FILE)
}

// ---------------------------------------------------------------------------
// Document names
// ---------------------------------------------------------------------------

static DOCUMENT_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn document_name_re() -> &'static Regex {
    DOCUMENT_NAME_RE.get_or_init(|| Regex::new(r"^CHANGE-[^/]*\.md$").unwrap())
}

/// True when `file_name` matches the `CHANGE-*.md` convention.
pub fn is_document_name(file_name: &str) -> bool {
    document_name_re().is_match(file_name)
}

/// Document id for a path: the file stem, e.g. `CHANGE-add-export`.
pub fn document_id(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !is_document_name(&name) {
        return Err(RalphError::InvalidDocumentName(name));
    }
    Ok(name[..name.len() - DOCUMENT_EXT.len() - 1].to_string())
}

/// The slug part of a document id (`CHANGE-add-export` -> `add-export`).
pub fn document_slug(id: &str) -> String {
    id.replace(DOCUMENT_PREFIX, "")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_names() {
        for name in ["CHANGE-add-export.md", "CHANGE-.md", "CHANGE-v1.2.md"] {
            assert!(is_document_name(name), "expected match: {name}");
        }
        for name in [
            "change-add-export.md",
            "CHANGE-add-export.txt",
            "CHANGE-add-export.md.bak",
            "README.md",
        ] {
            assert!(!is_document_name(name), "expected no match: {name}");
        }
    }

    #[test]
    fn document_id_strips_extension_only() {
        let id = document_id(Path::new("/tmp/PRDs/Pending/CHANGE-v1.2.md")).unwrap();
        assert_eq!(id, "CHANGE-v1.2");
        assert_eq!(document_slug(&id), "v1.2");
    }

    #[test]
    fn document_id_rejects_other_files() {
        assert!(document_id(Path::new("notes.md")).is_err());
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.ralph/config.yaml")
        );
        assert_eq!(
            default_prds_dir(root),
            PathBuf::from("/tmp/proj/PRDs/Pending")
        );
        assert_eq!(
            default_store_path(root),
            PathBuf::from("/tmp/proj/scripts/ralph/prd.json")
        );
    }
}
