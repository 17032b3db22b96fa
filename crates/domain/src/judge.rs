//! Equivalence and divergence judgments over a pair of responses.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diff::line_diff;
use crate::error::{DomainError, DomainResult};
use crate::response::{ResponseRecord, StatusCode};
use crate::similarity::{SimilarityScore, similarity};

/// Minimum score for two bodies to count as "the same".
pub const DEFAULT_EQUIVALENT_THRESHOLD: f64 = 0.95;

/// Score below which two bodies count as "different".
pub const DEFAULT_DIVERGENT_THRESHOLD: f64 = 0.8;

/// The two decision thresholds.
///
/// Scores in `[divergent, equivalent)` satisfy neither predicate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThresholds")]
pub struct Thresholds {
    equivalent: f64,
    divergent: f64,
}

#[derive(Deserialize)]
#[serde(default)]
struct RawThresholds {
    equivalent: f64,
    divergent: f64,
}

impl Default for RawThresholds {
    fn default() -> Self {
        Self {
            equivalent: DEFAULT_EQUIVALENT_THRESHOLD,
            divergent: DEFAULT_DIVERGENT_THRESHOLD,
        }
    }
}

impl TryFrom<RawThresholds> for Thresholds {
    type Error = DomainError;

    fn try_from(raw: RawThresholds) -> DomainResult<Self> {
        Self::new(raw.equivalent, raw.divergent)
    }
}

impl Thresholds {
    /// Creates a validated pair of thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error unless both values lie in `(0, 1]` and
    /// `divergent <= equivalent`.
    pub fn new(equivalent: f64, divergent: f64) -> DomainResult<Self> {
        for (name, value) in [("equivalent", equivalent), ("divergent", divergent)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(DomainError::InvalidThreshold(format!(
                    "{name} threshold {value} is outside (0, 1]"
                )));
            }
        }
        if divergent > equivalent {
            return Err(DomainError::InvalidThreshold(format!(
                "divergent threshold {divergent} exceeds equivalent threshold {equivalent}"
            )));
        }
        Ok(Self {
            equivalent,
            divergent,
        })
    }

    /// Returns the "same" threshold.
    #[must_use]
    pub const fn equivalent(&self) -> f64 {
        self.equivalent
    }

    /// Returns the "different" threshold.
    #[must_use]
    pub const fn divergent(&self) -> f64 {
        self.divergent
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            equivalent: DEFAULT_EQUIVALENT_THRESHOLD,
            divergent: DEFAULT_DIVERGENT_THRESHOLD,
        }
    }
}

/// Why two responses were not judged equivalent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EquivalenceFailure {
    /// The status codes differ.
    #[error("status differs: old {old}, new {new}")]
    StatusMismatch {
        /// Old backend status.
        old: StatusCode,
        /// New backend status.
        new: StatusCode,
    },

    /// The redirect targets differ. Redirects carry no fuzzy tolerance.
    #[error("Location differs: old {}, new {}", show(.old.as_deref()), show(.new.as_deref()))]
    LocationMismatch {
        /// Old backend `Location`.
        old: Option<String>,
        /// New backend `Location`.
        new: Option<String>,
    },

    /// The bodies are not similar enough.
    #[error("{0}")]
    BodyMismatch(Box<BodyMismatch>),
}

fn show(location: Option<&str>) -> &str {
    location.unwrap_or("<none>")
}

/// Body evidence for an equivalence failure: both responses in full.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyMismatch {
    /// The computed similarity.
    pub score: SimilarityScore,
    /// The threshold it fell short of.
    pub threshold: f64,
    /// Old backend response.
    pub old: ResponseRecord,
    /// New backend response.
    pub new: ResponseRecord,
}

impl BodyMismatch {
    /// Renders a line diff from the old body to the new one.
    #[must_use]
    pub fn diff(&self) -> String {
        line_diff(self.old.body(), self.new.body())
    }
}

impl std::fmt::Display for BodyMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "bodies differ: similarity {} < {}",
            self.score, self.threshold
        )?;
        writeln!(f, "--- old")?;
        writeln!(f, "+++ new")?;
        f.write_str(&self.diff())
    }
}

/// Why two responses were not judged divergent.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("similarity is {score} (expected < {threshold})")]
pub struct DivergenceFailure {
    /// The computed similarity.
    pub score: SimilarityScore,
    /// The threshold it failed to drop below.
    pub threshold: f64,
}

/// Applies [`Thresholds`] to pairs of responses.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Judge {
    thresholds: Thresholds,
}

impl Judge {
    /// Creates a judge with the given thresholds.
    #[must_use]
    pub const fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Returns the configured thresholds.
    #[must_use]
    pub const fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Checks that `new` serves the same thing as `old`.
    ///
    /// Status and `Location` must match exactly before body similarity is
    /// considered.
    ///
    /// # Errors
    ///
    /// Returns the first mismatch found, in that order.
    pub fn equivalent(
        &self,
        old: &ResponseRecord,
        new: &ResponseRecord,
    ) -> Result<SimilarityScore, EquivalenceFailure> {
        if old.status() != new.status() {
            return Err(EquivalenceFailure::StatusMismatch {
                old: old.status(),
                new: new.status(),
            });
        }
        if old.location() != new.location() {
            return Err(EquivalenceFailure::LocationMismatch {
                old: old.location().map(str::to_string),
                new: new.location().map(str::to_string),
            });
        }

        let score = similarity(old.body(), new.body());
        if score.value() >= self.thresholds.equivalent {
            Ok(score)
        } else {
            Err(EquivalenceFailure::BodyMismatch(Box::new(BodyMismatch {
                score,
                threshold: self.thresholds.equivalent,
                old: old.clone(),
                new: new.clone(),
            })))
        }
    }

    /// Checks that `new` serves something different from `old`.
    ///
    /// Only bodies are compared.
    ///
    /// # Errors
    ///
    /// Returns the score when it is not below the divergence threshold.
    pub fn divergent(
        &self,
        old: &ResponseRecord,
        new: &ResponseRecord,
    ) -> Result<SimilarityScore, DivergenceFailure> {
        let score = similarity(old.body(), new.body());
        if score.value() < self.thresholds.divergent {
            Ok(score)
        } else {
            Err(DivergenceFailure {
                score,
                threshold: self.thresholds.divergent,
            })
        }
    }
}
