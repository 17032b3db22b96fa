//! Scenario file loader.

use std::path::{Path, PathBuf};

use routediff_domain::{Scenario, ScenarioFile};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

/// Error type for scenario file loading.
#[derive(Debug, Error)]
pub enum ScenarioFileError {
    /// The file does not exist.
    #[error("scenario file not found: {0}")]
    NotFound(PathBuf),

    /// The file could not be read.
    #[error("failed to read scenario file {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not a valid scenario list.
    #[error("invalid scenario file {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// YAML error, with location.
        source: serde_yaml::Error,
    },

    /// Two scenarios share a name.
    #[error("duplicate scenario name in {path}: {name}")]
    DuplicateName {
        /// File path.
        path: PathBuf,
        /// Repeated name.
        name: String,
    },
}

/// Parses scenarios from YAML text.
///
/// # Errors
///
/// Returns an error if the text is not a valid scenario file or if two
/// scenarios share a name. `path` is only used in error messages.
pub fn parse_scenarios(yaml: &str, path: &Path) -> Result<Vec<Scenario>, ScenarioFileError> {
    let file: ScenarioFile =
        serde_yaml::from_str(yaml).map_err(|source| ScenarioFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut names = std::collections::HashSet::new();
    for scenario in &file.scenarios {
        if !names.insert(scenario.name.as_str()) {
            return Err(ScenarioFileError::DuplicateName {
                path: path.to_path_buf(),
                name: scenario.name.clone(),
            });
        }
    }

    Ok(file.scenarios)
}

/// Reads and parses a scenario file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub async fn load_scenarios(path: &Path) -> Result<Vec<Scenario>, ScenarioFileError> {
    let yaml = fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ScenarioFileError::NotFound(path.to_path_buf())
        } else {
            ScenarioFileError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let scenarios = parse_scenarios(&yaml, path)?;
    debug!(path = %path.display(), count = scenarios.len(), "scenarios loaded");
    Ok(scenarios)
}
