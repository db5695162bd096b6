use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RalphError {
    #[error("documents directory not found: {}", .0.display())]
    DocumentsDirNotFound(PathBuf),

    #[error("store not found: {} (expected a prd.json with prdContext and userStories)", .0.display())]
    StoreNotFound(PathBuf),

    #[error("invalid document name '{0}': expected CHANGE-<slug>.md")]
    InvalidDocumentName(String),

    #[error("story id space exhausted after US-{0}")]
    IdOverflow(u64),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RalphError>;
