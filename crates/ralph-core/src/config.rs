use crate::error::Result;
use crate::paths;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Optional `.ralph/config.yaml`. Every key may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    /// Directory holding the `CHANGE-*.md` documents.
    #[serde(default)]
    pub prds_dir: Option<PathBuf>,
    /// The prd.json store.
    #[serde(default)]
    pub store: Option<PathBuf>,
}

/// The two locations a conversion run works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub prds_dir: PathBuf,
    pub store: PathBuf,
}

impl Config {
    /// Load the config file if present; a missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Resolve run paths. Explicit overrides win, then this config, then the
    /// default layout. Relative config paths are taken from `root`.
    pub fn resolve(
        &self,
        root: &Path,
        prds_override: Option<&Path>,
        store_override: Option<&Path>,
    ) -> RunPaths {
        let prds_dir = match (prds_override, &self.prds_dir) {
            (Some(p), _) => p.to_path_buf(),
            (None, Some(p)) => root.join(p),
            (None, None) => paths::default_prds_dir(root),
        };
        let store = match (store_override, &self.store) {
            (Some(p), _) => p.to_path_buf(),
            (None, Some(p)) => root.join(p),
            (None, None) => paths::default_store_path(root),
        };
        RunPaths { prds_dir, store }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
