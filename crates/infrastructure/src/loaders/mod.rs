//! Loaders for settings and scenario files.

mod scenarios;
mod settings;

pub use scenarios::{ScenarioFileError, load_scenarios, parse_scenarios};
pub use settings::{
    CONFIG_PATH_VAR, DEFAULT_CONFIG_NAME, ENV_PREFIX, SettingsError, SettingsLoader,
};
