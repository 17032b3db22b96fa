//! Application use cases (scenario orchestration).

mod dual_fetch;
mod run_suite;
mod scenario_assertions;

pub use dual_fetch::{DualFetch, ResponsePair};
pub use run_suite::{RunSuite, ScenarioOutcome, ScenarioStatus, SuiteReport};
pub use scenario_assertions::ScenarioAssertions;
