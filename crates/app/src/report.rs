//! Suite report rendering.

use std::fmt::Write as _;

use routediff_application::{ScenarioFailure, ScenarioStatus, SuiteReport};
use routediff_domain::EquivalenceFailure;

/// Exit code when the suite could not start.
pub const STARTUP_FAILURE_EXIT: u8 = 2;

/// Exit code for a finished suite: 0 if nothing failed, 1 otherwise.
#[must_use]
pub const fn exit_code(report: &SuiteReport) -> u8 {
    if report.all_passed() { 0 } else { 1 }
}

/// Renders one failure, indented for the report.
///
/// Body mismatches always include the diff; `show_bodies` adds both
/// bodies in full, each headed by its fetch time.
#[must_use]
pub fn render_failure(failure: &ScenarioFailure, show_bodies: bool) -> String {
    let mut out = indent(&failure.to_string());

    if show_bodies
        && let ScenarioFailure::NotEquivalent {
            failure: EquivalenceFailure::BodyMismatch(mismatch),
            ..
        } = failure
    {
        let _ = write!(
            out,
            "\n    === old body ({}) ===\n{}\n    === new body ({}) ===\n{}",
            mismatch.old.duration_display(),
            indent(mismatch.old.body()),
            mismatch.new.duration_display(),
            indent(mismatch.new.body())
        );
    }
    out
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the whole report: one line per scenario, failure details, then
/// the totals.
#[must_use]
pub fn render_report(report: &SuiteReport, show_bodies: bool) -> String {
    let mut out = String::new();

    for outcome in &report.outcomes {
        match &outcome.status {
            ScenarioStatus::Passed => {
                let _ = writeln!(
                    out,
                    "PASS     {} ({} ms)",
                    outcome.name,
                    outcome.duration.as_millis()
                );
            }
            ScenarioStatus::Pending => {
                let _ = writeln!(out, "PENDING  {}", outcome.name);
            }
            ScenarioStatus::Failed(failure) => {
                let _ = writeln!(
                    out,
                    "FAIL     {} (step {}, {} ms)",
                    outcome.name,
                    outcome.steps_run,
                    outcome.duration.as_millis()
                );
                let _ = writeln!(out, "{}", render_failure(failure, show_bodies));
            }
        }
    }

    let _ = write!(
        out,
        "\n{} scenarios: {} passed, {} failed, {} pending ({:.1}% pass rate) in {} ms",
        report.total,
        report.passed,
        report.failed,
        report.pending,
        report.pass_rate(),
        report.duration.as_millis()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use routediff_application::ScenarioOutcome;
    use routediff_domain::{Headers, Judge, ResponseRecord};
    use std::time::Duration;

    fn outcome(name: &str, status: ScenarioStatus) -> ScenarioOutcome {
        ScenarioOutcome {
            name: name.to_string(),
            status,
            steps_run: 1,
            duration: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_render_report() {
        let report = SuiteReport::new(
            vec![
                outcome("home", ScenarioStatus::Passed),
                outcome("csoldap", ScenarioStatus::Pending),
                outcome(
                    "broken",
                    ScenarioStatus::Failed(ScenarioFailure::Aborted("boom".to_string())),
                ),
            ],
            Duration::from_millis(40),
        );

        let text = render_report(&report, false);

        assert_eq!(
            text,
            "PASS     home (12 ms)\n\
             PENDING  csoldap\n\
             FAIL     broken (step 1, 12 ms)\n    scenario aborted: boom\n\
             \n3 scenarios: 1 passed, 1 failed, 1 pending (50.0% pass rate) in 40 ms"
        );
        assert_eq!(exit_code(&report), 1);
    }

    #[test]
    fn test_show_bodies_includes_fetch_times() {
        let page = |body: &str, millis| {
            ResponseRecord::new(
                200,
                Headers::new(),
                body.as_bytes().to_vec(),
                Duration::from_millis(millis),
            )
        };
        let failure = Judge::default()
            .equivalent(&page("Hello World", 42), &page("Completely Different Page", 1500))
            .unwrap_err();
        let failure = ScenarioFailure::NotEquivalent {
            path: "/".to_string(),
            failure,
        };

        let short = render_failure(&failure, false);
        assert!(short.contains("-Hello World"));
        assert!(!short.contains("=== old body"));

        let full = render_failure(&failure, true);
        assert!(full.contains("\n    === old body (42 ms) ===\n    Hello World\n"));
        assert!(full.ends_with("\n    === new body (1.50 s) ===\n    Completely Different Page"));
    }

    #[test]
    fn test_exit_code_ignores_pending() {
        let report = SuiteReport::new(
            vec![outcome("csoldap", ScenarioStatus::Pending)],
            Duration::ZERO,
        );
        assert_eq!(exit_code(&report), 0);
    }

    #[test]
    fn test_indent() {
        assert_eq!(indent("a\nb"), "    a\n    b");
    }
}
