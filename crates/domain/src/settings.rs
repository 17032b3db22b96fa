//! Harness Settings Domain Model
//!
//! Defines everything fixed for one harness run.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::BackendEndpoint;
use crate::classify::OriginMarkers;
use crate::error::{DomainError, DomainResult};
use crate::judge::Thresholds;
use crate::site::{DEFAULT_SESSION_COOKIE, SiteProfile};

/// Default per-scenario deadline.
pub const DEFAULT_SCENARIO_TIMEOUT_MS: u64 = 20_000;

/// The public site both backends impersonate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    /// Base URL paths are resolved against.
    pub base_url: String,
    /// `Host` header override; defaults to the base URL host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_host: Option<String>,
    /// Synthetic session cookie sent to both backends.
    pub session_cookie: String,
    /// `User-Agent` override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.epfl.ch/".to_string(),
            virtual_host: None,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            user_agent: None,
        }
    }
}

impl SiteSettings {
    /// Builds the immutable site profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or any header value is invalid.
    pub fn to_profile(&self) -> DomainResult<SiteProfile> {
        let mut profile =
            SiteProfile::new(&self.base_url)?.with_session_cookie(self.session_cookie.clone())?;
        if let Some(host) = &self.virtual_host {
            profile = profile.with_virtual_host(host.clone())?;
        }
        if let Some(user_agent) = &self.user_agent {
            profile = profile.with_user_agent(user_agent.clone())?;
        }
        Ok(profile)
    }
}

/// The two physical servers under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendPair {
    /// Current configuration.
    pub old: BackendEndpoint,
    /// Configuration under test.
    pub new: BackendEndpoint,
}

/// Complete configuration of a harness run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessSettings {
    /// Site identity.
    #[serde(default)]
    pub site: SiteSettings,
    /// Backends to dial.
    pub backends: BackendPair,
    /// Judgment thresholds.
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Classification markers.
    #[serde(default)]
    pub markers: OriginMarkers,
    /// Deadline for one whole scenario, in milliseconds.
    #[serde(default = "default_scenario_timeout_ms")]
    pub scenario_timeout_ms: u64,
    /// Scenario file to run.
    #[serde(default = "default_scenario_file")]
    pub scenario_file: PathBuf,
}

const fn default_scenario_timeout_ms() -> u64 {
    DEFAULT_SCENARIO_TIMEOUT_MS
}

fn default_scenario_file() -> PathBuf {
    PathBuf::from("scenarios.yaml")
}

impl HarnessSettings {
    /// Creates settings with defaults for everything but the backends.
    #[must_use]
    pub fn new(backends: BackendPair) -> Self {
        Self {
            site: SiteSettings::default(),
            backends,
            thresholds: Thresholds::default(),
            markers: OriginMarkers::default(),
            scenario_timeout_ms: DEFAULT_SCENARIO_TIMEOUT_MS,
            scenario_file: default_scenario_file(),
        }
    }

    /// Returns the per-scenario deadline.
    #[must_use]
    pub const fn scenario_timeout(&self) -> Duration {
        Duration::from_millis(self.scenario_timeout_ms)
    }

    /// Checks cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> DomainResult<()> {
        self.site.to_profile()?;
        self.markers.validate()?;
        if self.scenario_timeout_ms == 0 {
            return Err(DomainError::InvalidThreshold(
                "scenario_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_minimal_settings_use_defaults() {
        let yaml = "backends:\n  old: 128.178.222.108\n  new: 128.178.222.7\n";
        let settings: HarnessSettings = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(settings.backends.old.to_string(), "128.178.222.108:443");
        assert_eq!(settings.thresholds, Thresholds::default());
        assert_eq!(settings.scenario_timeout(), Duration::from_secs(20));
        assert_eq!(settings.scenario_file, PathBuf::from("scenarios.yaml"));
        assert!(settings.validate().is_ok());

        let site = settings.site.to_profile().unwrap();
        assert_eq!(site.virtual_host(), "www.epfl.ch");
    }

    #[test]
    fn test_site_overrides() {
        let site = SiteSettings {
            base_url: "https://origin.example.org".to_string(),
            virtual_host: Some("www.example.org".to_string()),
            session_cookie: "session=probe".to_string(),
            user_agent: Some("probe/1".to_string()),
        };
        let profile = site.to_profile().unwrap();
        assert_eq!(profile.virtual_host(), "www.example.org");
        assert_eq!(profile.server_name(), "origin.example.org");
        assert_eq!(profile.session_cookie(), "session=probe");
        assert_eq!(profile.user_agent(), "probe/1");
    }

    #[test]
    fn test_missing_backends_rejected() {
        assert!(serde_yaml::from_str::<HarnessSettings>("site: {}\n").is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut settings = HarnessSettings::new(BackendPair {
            old: "10.0.0.1".parse().unwrap(),
            new: "10.0.0.2".parse().unwrap(),
        });
        settings.scenario_timeout_ms = 0;
        assert!(settings.validate().is_err());
    }
}
