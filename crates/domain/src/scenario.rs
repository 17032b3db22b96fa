//! Declarative scenario data.
//!
//! Scenarios are plain data loaded from a file; the application layer plays
//! them against the two backends.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::ClassificationVerdict;

/// What a step expects of the two backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    /// The new backend serves the path as before.
    Equivalent,
    /// The new backend serves the path differently.
    Divergent,
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Equivalent => "equivalent",
            Self::Divergent => "divergent",
        })
    }
}

/// One assertion on one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Path, optionally with a query string.
    pub path: String,
    /// Expected relation between the two backends.
    pub expect: Expectation,
    /// Expected origin of the new backend's response, if checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<ClassificationVerdict>,
}

impl Step {
    /// Creates a step expecting equivalence.
    #[must_use]
    pub fn equivalent(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expect: Expectation::Equivalent,
            origin: None,
        }
    }

    /// Creates a step expecting divergence.
    #[must_use]
    pub fn divergent(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expect: Expectation::Divergent,
            origin: None,
        }
    }

    /// Also checks the origin of the new backend's response.
    #[must_use]
    pub const fn served_by(mut self, origin: ClassificationVerdict) -> Self {
        self.origin = Some(origin);
        self
    }
}

/// A named, ordered list of steps. No steps means pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Human-readable name.
    pub name: String,
    /// Steps, run in order, stopping at the first failure.
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Creates a scenario without steps.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Adds a step (builder pattern).
    #[must_use]
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Returns true if the scenario has nothing to run yet.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::is_empty is not const in stable
    pub fn is_pending(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Top-level shape of a scenario file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    /// All scenarios, in file order.
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_scenario_file() {
        let yaml = r"
scenarios:
  - name: serves the home page the same as before
    steps:
      - path: /
        expect: equivalent
        origin: cms
  - name: serves _vti_bin the same as before
    steps:
      - { path: /_vti_bin/, expect: equivalent }
      - { path: /_vti_bin/?zonzon, expect: equivalent }
  - name: serves /cgi-bin/csoldap out of the original site
";
        let file: ScenarioFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.scenarios.len(), 3);
        assert_eq!(
            file.scenarios[0].steps[0],
            Step::equivalent("/").served_by(ClassificationVerdict::ServedByCmsOrigin)
        );
        assert_eq!(file.scenarios[1].steps.len(), 2);
        assert!(file.scenarios[2].is_pending());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let yaml = "scenarios:\n  - name: typo\n    stpes: []\n";
        assert!(serde_yaml::from_str::<ScenarioFile>(yaml).is_err());
    }

    #[test]
    fn test_builder() {
        let step = Step::divergent("/zonk").served_by(ClassificationVerdict::ServedByCmsOrigin);
        let scenario = Scenario::new("zonk").with_step(step);
        assert!(!scenario.is_pending());
        assert_eq!(scenario.steps[0].expect, Expectation::Divergent);
        assert_eq!(Expectation::Divergent.to_string(), "divergent");
    }
}
