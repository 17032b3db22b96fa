//! Application error types

use std::time::Duration;

use routediff_domain::{
    BackendRole, Classification, ClassificationVerdict, DivergenceFailure, DomainError,
    EquivalenceFailure,
};
use thiserror::Error;

use crate::ports::TransportError;

/// What went wrong with one side's fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The backend could not be reached or the exchange broke.
    #[error(transparent)]
    Connectivity(#[from] TransportError),

    /// The scenario deadline passed before the backend answered.
    #[error("timed out after {} ms", .0.as_millis())]
    Timeout(Duration),
}

/// A failed fetch, tagged with the side and path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{side} backend failed for {path}: {kind}")]
pub struct FetchError {
    /// Which backend failed.
    pub side: BackendRole,
    /// Path requested.
    pub path: String,
    /// The failure.
    pub kind: FetchErrorKind,
}

impl FetchError {
    /// Returns true if the failure is a deadline expiry.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind, FetchErrorKind::Timeout(_))
    }
}

/// Why a scenario assertion failed.
///
/// Every variant is scoped to one scenario; none aborts a suite.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScenarioFailure {
    /// The path could not be turned into a request.
    #[error("invalid request for {path}: {source}")]
    InvalidRequest {
        /// Path given.
        path: String,
        /// Domain validation error.
        source: DomainError,
    },

    /// One of the two fetches failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The backends were expected to agree and did not.
    #[error("{path} is not served as before: {failure}")]
    NotEquivalent {
        /// Path requested.
        path: String,
        /// Evidence, including both bodies for body mismatches.
        failure: EquivalenceFailure,
    },

    /// The backends were expected to differ and did not.
    #[error("{path} is still served as before: {failure}")]
    NotDivergent {
        /// Path requested.
        path: String,
        /// Evidence: the similarity score.
        failure: DivergenceFailure,
    },

    /// The new backend's response came from the wrong origin.
    #[error("{path} expected from {expected}, classified as {actual}")]
    UnexpectedOrigin {
        /// Path requested.
        path: String,
        /// Expected verdict.
        expected: ClassificationVerdict,
        /// Observed classification.
        actual: Classification,
    },

    /// The scenario task panicked.
    #[error("scenario aborted: {0}")]
    Aborted(String),
}

impl ScenarioFailure {
    /// Returns true if the scenario failed because a deadline passed.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Fetch(e) if e.is_timeout())
    }

    /// Returns true if a backend could not be reached.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Fetch(FetchError {
                kind: FetchErrorKind::Connectivity(_),
                ..
            })
        )
    }
}
