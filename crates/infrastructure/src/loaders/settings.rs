//! Harness settings loader.
//!
//! Layers an optional configuration file under `ROUTEDIFF__*` environment
//! variables and validates the result.

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, Environment, File};
use routediff_domain::{DomainError, HarnessSettings};
use thiserror::Error;
use tracing::debug;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "ROUTEDIFF_CONFIG";

/// Prefix of environment overrides (`ROUTEDIFF__BACKENDS__OLD=...`).
pub const ENV_PREFIX: &str = "ROUTEDIFF";

/// Base name of the configuration file searched in the working directory.
pub const DEFAULT_CONFIG_NAME: &str = "routediff";

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A source could not be read or the merged values do not deserialize.
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// The values deserialize but are inconsistent.
    #[error("invalid settings: {0}")]
    Invalid(#[from] DomainError),
}

/// Loads [`HarnessSettings`].
///
/// Precedence, lowest first: built-in defaults, the configuration file,
/// environment variables.
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    file: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
}

impl SettingsLoader {
    /// Creates a loader reading `routediff.*` from the working directory and
    /// the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader honoring `ROUTEDIFF_CONFIG` for the file path.
    #[must_use]
    pub fn from_env() -> Self {
        let loader = Self::new();
        match std::env::var_os(CONFIG_PATH_VAR) {
            Some(path) => loader.with_file(path),
            None => loader,
        }
    }

    /// Reads this file instead of searching for `routediff.*`. The file must
    /// exist; its format follows the extension.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Reads overrides from `vars` instead of the process environment.
    #[must_use]
    pub fn with_env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    /// Loads and validates the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable, a required key such as
    /// `backends.old` is missing, or a value is invalid.
    pub fn load(&self) -> Result<HarnessSettings, SettingsError> {
        let file = match &self.file {
            Some(path) => File::from(path.as_path()).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };
        let env = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(self.env.clone());

        let settings: HarnessSettings = Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;
        settings.validate()?;

        debug!(
            old = %settings.backends.old,
            new = %settings.backends.new,
            base_url = %settings.site.base_url,
            "settings loaded"
        );
        Ok(settings)
    }
}
