//! Harness wiring.

use std::path::Path;
use std::sync::Arc;

use routediff_application::{
    DualFetch, RunSuite, ScenarioAssertions, SuiteReport, TransportError,
};
use routediff_domain::{Classifier, DomainError, HarnessSettings, Judge};
use routediff_infrastructure::{
    ForcedRouteClient, ForcedRouteDialer, ScenarioFileError, SettingsError, TlsSetupError,
    insecure_client_config, load_scenarios,
};
use thiserror::Error;
use tracing::info;

/// Transport used against real backends.
pub type BackendTransport = ForcedRouteClient<ForcedRouteDialer>;

/// Errors that prevent a suite from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Settings could not be loaded.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The scenario file could not be loaded.
    #[error(transparent)]
    Scenarios(#[from] ScenarioFileError),

    /// TLS could not be configured.
    #[error(transparent)]
    Tls(#[from] TlsSetupError),

    /// The site profile is invalid.
    #[error("invalid site: {0}")]
    Site(#[from] DomainError),

    /// A dialer could not be created.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Builds the assertions for the backends in `settings`.
///
/// Both dialers present the site's host as SNI and share one TLS
/// configuration.
///
/// # Errors
///
/// Returns an error if the site is invalid or TLS cannot be configured.
pub fn build_assertions(
    settings: &HarnessSettings,
) -> Result<ScenarioAssertions<BackendTransport>, StartupError> {
    let site = settings.site.to_profile()?;
    let tls = insecure_client_config()?;

    let old = ForcedRouteDialer::new(settings.backends.old, site.server_name(), Arc::clone(&tls))?;
    let new = ForcedRouteDialer::new(settings.backends.new, site.server_name(), tls)?;
    info!(
        old = %settings.backends.old,
        new = %settings.backends.new,
        host = %site.virtual_host(),
        "comparing backends"
    );

    Ok(ScenarioAssertions::new(
        DualFetch::new(
            Arc::new(ForcedRouteClient::new(old)),
            Arc::new(ForcedRouteClient::new(new)),
        ),
        site,
        Judge::new(settings.thresholds),
        Classifier::from_markers(&settings.markers),
        settings.scenario_timeout(),
    ))
}

/// Loads `scenario_file` and runs it against the configured backends.
///
/// # Errors
///
/// Returns an error only if the suite cannot start; scenario failures are
/// part of the report.
pub async fn run_scenario_file(
    settings: &HarnessSettings,
    scenario_file: &Path,
) -> Result<SuiteReport, StartupError> {
    let scenarios = load_scenarios(scenario_file).await?;
    let suite = RunSuite::new(Arc::new(build_assertions(settings)?));
    Ok(suite.run(&scenarios).await)
}
