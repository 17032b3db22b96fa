//! Suite runner use case
//!
//! Plays declarative scenarios against the two backends. Scenarios run
//! concurrently and are isolated from each other: a failing, timed-out or
//! panicking scenario only fails itself.

use std::sync::Arc;
use std::time::Duration;

use routediff_domain::Scenario;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::error::ScenarioFailure;
use crate::ports::BackendClient;
use crate::use_cases::scenario_assertions::ScenarioAssertions;

/// Final state of one scenario.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioStatus {
    /// Every step held.
    Passed,
    /// A step failed; later steps were skipped.
    Failed(ScenarioFailure),
    /// The scenario has no steps and was not executed.
    Pending,
}

/// Outcome of one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    /// Scenario name.
    pub name: String,
    /// Final state.
    pub status: ScenarioStatus,
    /// Number of steps started, including the failing one.
    pub steps_run: usize,
    /// Wall time spent on the scenario.
    pub duration: Duration,
}

impl ScenarioOutcome {
    fn pending(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: ScenarioStatus::Pending,
            steps_run: 0,
            duration: Duration::ZERO,
        }
    }

    /// Returns true if the scenario passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.status, ScenarioStatus::Passed)
    }

    /// Returns the failure, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&ScenarioFailure> {
        match &self.status {
            ScenarioStatus::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Results from running a suite, in scenario order.
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteReport {
    /// Individual outcomes.
    pub outcomes: Vec<ScenarioOutcome>,
    /// Total number of scenarios.
    pub total: usize,
    /// Number of passed scenarios.
    pub passed: usize,
    /// Number of failed scenarios.
    pub failed: usize,
    /// Number of pending scenarios.
    pub pending: usize,
    /// Wall time for the whole suite.
    pub duration: Duration,
}

impl SuiteReport {
    /// Builds the report and its totals.
    #[must_use]
    pub fn new(outcomes: Vec<ScenarioOutcome>, duration: Duration) -> Self {
        let total = outcomes.len();
        let passed = outcomes.iter().filter(|o| o.passed()).count();
        let pending = outcomes
            .iter()
            .filter(|o| o.status == ScenarioStatus::Pending)
            .count();
        let failed = total - passed - pending;

        Self {
            outcomes,
            total,
            passed,
            failed,
            pending,
            duration,
        }
    }

    /// Check if no scenario failed. Pending scenarios do not count.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Pass rate over executed scenarios, as a percentage.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pass_rate(&self) -> f64 {
        let executed = self.passed + self.failed;
        if executed == 0 {
            100.0
        } else {
            (self.passed as f64 / executed as f64) * 100.0
        }
    }
}

/// Runs scenarios against shared assertions.
pub struct RunSuite<C: BackendClient + 'static> {
    assertions: Arc<ScenarioAssertions<C>>,
}

impl<C: BackendClient + 'static> RunSuite<C> {
    /// Creates the runner.
    pub const fn new(assertions: Arc<ScenarioAssertions<C>>) -> Self {
        Self { assertions }
    }

    /// Runs every scenario concurrently and reports in input order.
    ///
    /// Pending scenarios are reported without being executed.
    pub async fn run(&self, scenarios: &[Scenario]) -> SuiteReport {
        let started = Instant::now();
        info!(scenarios = scenarios.len(), "running suite");

        let handles: Vec<_> = scenarios
            .iter()
            .map(|scenario| {
                if scenario.is_pending() {
                    return None;
                }
                let assertions = Arc::clone(&self.assertions);
                let scenario = scenario.clone();
                Some(tokio::spawn(async move {
                    run_scenario(&assertions, &scenario).await
                }))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(scenarios.len());
        for (scenario, handle) in scenarios.iter().zip(handles) {
            let outcome = match handle {
                None => ScenarioOutcome::pending(&scenario.name),
                Some(handle) => match handle.await {
                    Ok(outcome) => outcome,
                    Err(err) => ScenarioOutcome {
                        name: scenario.name.clone(),
                        status: ScenarioStatus::Failed(ScenarioFailure::Aborted(err.to_string())),
                        steps_run: 0,
                        duration: started.elapsed(),
                    },
                },
            };
            log_outcome(&outcome);
            outcomes.push(outcome);
        }

        let report = SuiteReport::new(outcomes, started.elapsed());
        info!(
            passed = report.passed,
            failed = report.failed,
            pending = report.pending,
            "suite finished"
        );
        report
    }

    /// Runs one scenario under its own deadline.
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioOutcome {
        if scenario.is_pending() {
            return ScenarioOutcome::pending(&scenario.name);
        }
        run_scenario(&self.assertions, scenario).await
    }
}

async fn run_scenario<C: BackendClient>(
    assertions: &ScenarioAssertions<C>,
    scenario: &Scenario,
) -> ScenarioOutcome {
    let started = Instant::now();
    let deadline = started + assertions.timeout();
    let mut steps_run = 0;
    let mut status = ScenarioStatus::Passed;

    for step in &scenario.steps {
        steps_run += 1;
        if let Err(failure) = assertions.run_step(step, deadline).await {
            status = ScenarioStatus::Failed(failure);
            break;
        }
    }

    ScenarioOutcome {
        name: scenario.name.clone(),
        status,
        steps_run,
        duration: started.elapsed(),
    }
}

fn log_outcome(outcome: &ScenarioOutcome) {
    match &outcome.status {
        ScenarioStatus::Passed => info!(
            scenario = %outcome.name,
            duration_ms = outcome.duration.as_millis(),
            "passed"
        ),
        ScenarioStatus::Pending => info!(scenario = %outcome.name, "pending"),
        ScenarioStatus::Failed(failure) => warn!(
            scenario = %outcome.name,
            steps_run = outcome.steps_run,
            error = %failure,
            "failed"
        ),
    }
}
