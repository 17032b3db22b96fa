//! Routediff Infrastructure - Adapters and loaders
//!
//! This crate provides the concrete transport behind the application
//! ports (rustls dialing plus hyper HTTP/1.1) and the settings and scenario
//! file loaders.

pub mod adapters;
pub mod loaders;

pub use adapters::{ForcedRouteClient, ForcedRouteDialer, TlsSetupError, insecure_client_config};
pub use loaders::{
    ScenarioFileError, SettingsError, SettingsLoader, load_scenarios, parse_scenarios,
};
