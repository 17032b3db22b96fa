//! Routediff application layer
//!
//! Ports to the outside world and the use cases that compare two backends
//! through them.

pub mod error;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
mod test_support;

pub use error::{FetchError, FetchErrorKind, ScenarioFailure};
pub use ports::{BackendClient, Connection, Dialer, TransportError};
pub use use_cases::{
    DualFetch, ResponsePair, RunSuite, ScenarioAssertions, ScenarioOutcome, ScenarioStatus,
    SuiteReport,
};
