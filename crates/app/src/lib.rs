//! Routediff - differential harness for load-balancer reconfiguration
//!
//! Wires the forced-route transport, the assertions and the suite runner
//! together, and renders suite reports for the `routediff` binary.

pub mod cli;
pub mod harness;
pub mod report;

pub use cli::Args;
pub use harness::{BackendTransport, StartupError, build_assertions, run_scenario_file};
pub use report::{STARTUP_FAILURE_EXIT, exit_code, render_failure, render_report};
