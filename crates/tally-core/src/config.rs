use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ErrorCode;
use crate::model::{ClassificationError, ClassificationSet};

/// Environment variable that overrides the classification file location.
pub const CLASSIFICATIONS_ENV: &str = "TALLY_CLASSIFICATIONS";

/// Default location of the classification file under a project root.
pub const DEFAULT_CLASSIFICATIONS_PATH: &str = ".tally/classifications.toml";

/// Why a classification file was rejected.
///
/// Returned as the root cause inside the `anyhow` chain, so callers can
/// recover the code with `err.downcast_ref::<ConfigError>()`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid classification TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("project '{project}': {source}")]
    Invalid {
        project: String,
        source: ClassificationError,
    },
}

impl ConfigError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Parse(_) => ErrorCode::ConfigParseError,
            Self::Invalid { .. } => ErrorCode::InvalidClassification,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// Pick the classification file: explicit path, then
/// `$TALLY_CLASSIFICATIONS`, then `<root>/.tally/classifications.toml`.
#[must_use]
pub fn resolve_classifications_path(explicit: Option<&Path>, project_root: &Path) -> PathBuf {
    resolve_path(explicit, env::var(CLASSIFICATIONS_ENV).ok(), project_root)
}

fn resolve_path(explicit: Option<&Path>, env_path: Option<String>, project_root: &Path) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Some(path) = env_path.filter(|raw| !raw.trim().is_empty()) {
        return PathBuf::from(path.trim());
    }

    project_root.join(DEFAULT_CLASSIFICATIONS_PATH)
}

/// Load and validate a classification file.
///
/// A missing file is not an error: it yields an empty set, and every
/// project then passes through with no rules applied.
pub fn load_classifications(path: &Path) -> Result<ClassificationSet> {
    if !path.exists() {
        debug!(path = %path.display(), "no classification file; using empty set");
        return Ok(ClassificationSet::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    parse_classifications(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parse classification TOML and validate every project.
pub fn parse_classifications(content: &str) -> Result<ClassificationSet> {
    let set = toml::from_str::<ClassificationSet>(content).map_err(ConfigError::from)?;
    set.validate()
        .map_err(|(project, source)| ConfigError::Invalid { project, source })?;
    debug!(projects = set.projects.len(), "loaded field classifications");
    Ok(set)
}
