//! Scenario assertion use case
//!
//! The reusable primitives a scenario is written in: "the new backend serves
//! this path as before" and "the new backend serves this path differently".

use std::time::Duration;

use routediff_domain::{
    Classification, ClassificationVerdict, Classifier, Expectation, Judge, RequestSpec,
    ResponseRecord, SiteProfile, Step,
};
use tokio::time::Instant;

use crate::error::ScenarioFailure;
use crate::ports::BackendClient;
use crate::use_cases::dual_fetch::{DualFetch, ResponsePair};

/// Assertion primitives bound to one site and one pair of backends.
pub struct ScenarioAssertions<C: BackendClient> {
    fetcher: DualFetch<C>,
    site: SiteProfile,
    judge: Judge,
    classifier: Classifier,
    timeout: Duration,
}

impl<C: BackendClient> ScenarioAssertions<C> {
    /// Creates the assertions.
    ///
    /// `timeout` bounds every assertion called without an explicit deadline.
    pub const fn new(
        fetcher: DualFetch<C>,
        site: SiteProfile,
        judge: Judge,
        classifier: Classifier,
        timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            site,
            judge,
            classifier,
            timeout,
        }
    }

    /// Returns the per-scenario timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Asserts the new backend serves `path` as the old one does.
    ///
    /// Returns the new backend's response for further checks.
    ///
    /// # Errors
    ///
    /// Fails on fetch errors, status or `Location` mismatch, or body similarity
    /// below the equivalence threshold (with both bodies attached).
    pub async fn assert_equivalent(&self, path: &str) -> Result<ResponseRecord, ScenarioFailure> {
        self.assert_equivalent_until(path, Instant::now() + self.timeout)
            .await
    }

    /// Asserts the new backend serves `path` differently from the old one.
    ///
    /// Returns the new backend's response for further checks.
    ///
    /// # Errors
    ///
    /// Fails on fetch errors or when body similarity is not below the
    /// divergence threshold (with the score attached).
    pub async fn assert_divergent(&self, path: &str) -> Result<ResponseRecord, ScenarioFailure> {
        self.assert_divergent_until(path, Instant::now() + self.timeout)
            .await
    }

    /// [`assert_equivalent`](Self::assert_equivalent) under an explicit deadline.
    ///
    /// # Errors
    ///
    /// See [`assert_equivalent`](Self::assert_equivalent).
    pub async fn assert_equivalent_until(
        &self,
        path: &str,
        deadline: Instant,
    ) -> Result<ResponseRecord, ScenarioFailure> {
        let ResponsePair { old, new } = self.fetch(path, deadline).await?;
        self.judge
            .equivalent(&old, &new)
            .map_err(|failure| ScenarioFailure::NotEquivalent {
                path: path.to_string(),
                failure,
            })?;
        Ok(new)
    }

    /// [`assert_divergent`](Self::assert_divergent) under an explicit deadline.
    ///
    /// # Errors
    ///
    /// See [`assert_divergent`](Self::assert_divergent).
    pub async fn assert_divergent_until(
        &self,
        path: &str,
        deadline: Instant,
    ) -> Result<ResponseRecord, ScenarioFailure> {
        let ResponsePair { old, new } = self.fetch(path, deadline).await?;
        self.judge
            .divergent(&old, &new)
            .map_err(|failure| ScenarioFailure::NotDivergent {
                path: path.to_string(),
                failure,
            })?;
        Ok(new)
    }

    /// Classifies one response.
    #[must_use]
    pub fn classify(&self, response: &ResponseRecord) -> Classification {
        self.classifier.classify(response)
    }

    /// Asserts `response` (fetched for `path`) comes from `expected`.
    ///
    /// # Errors
    ///
    /// Fails with the observed classification when it differs.
    pub fn expect_origin(
        &self,
        path: &str,
        response: &ResponseRecord,
        expected: ClassificationVerdict,
    ) -> Result<Classification, ScenarioFailure> {
        let actual = self.classify(response);
        if actual.verdict == expected {
            Ok(actual)
        } else {
            Err(ScenarioFailure::UnexpectedOrigin {
                path: path.to_string(),
                expected,
                actual,
            })
        }
    }

    /// Runs one declarative step under `deadline`.
    ///
    /// # Errors
    ///
    /// Fails when the assertion or the origin check fails.
    pub async fn run_step(
        &self,
        step: &Step,
        deadline: Instant,
    ) -> Result<ResponseRecord, ScenarioFailure> {
        let response = match step.expect {
            Expectation::Equivalent => self.assert_equivalent_until(&step.path, deadline).await?,
            Expectation::Divergent => self.assert_divergent_until(&step.path, deadline).await?,
        };
        if let Some(expected) = step.origin {
            self.expect_origin(&step.path, &response, expected)?;
        }
        Ok(response)
    }

    async fn fetch(&self, path: &str, deadline: Instant) -> Result<ResponsePair, ScenarioFailure> {
        let request = RequestSpec::for_path(&self.site, path).map_err(|source| {
            ScenarioFailure::InvalidRequest {
                path: path.to_string(),
                source,
            }
        })?;
        Ok(self.fetcher.fetch(&request, deadline).await?)
    }
}
