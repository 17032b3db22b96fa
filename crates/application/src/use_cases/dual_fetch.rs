//! Dual-backend fetch use case
//!
//! Issues one logical request against the old and the new backend at the
//! same time and hands both responses back unjudged.

use std::sync::Arc;

use routediff_domain::{BackendRole, RequestSpec, ResponseRecord};
use tokio::time::Instant;
use tracing::debug;

use crate::error::{FetchError, FetchErrorKind};
use crate::ports::BackendClient;

/// The two responses to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePair {
    /// Response from the old backend.
    pub old: ResponseRecord,
    /// Response from the new backend.
    pub new: ResponseRecord,
}

/// Fetches the same request from two backends.
///
/// Both clients are shared read-only, so one `DualFetch` can serve any number
/// of concurrent scenarios.
pub struct DualFetch<C: BackendClient> {
    old: Arc<C>,
    new: Arc<C>,
}

impl<C: BackendClient> Clone for DualFetch<C> {
    fn clone(&self) -> Self {
        Self {
            old: Arc::clone(&self.old),
            new: Arc::clone(&self.new),
        }
    }
}

impl<C: BackendClient> DualFetch<C> {
    /// Creates the use case from the two backend clients.
    pub const fn new(old: Arc<C>, new: Arc<C>) -> Self {
        Self { old, new }
    }

    /// Returns the client bound to `side`.
    #[must_use]
    pub fn client(&self, side: BackendRole) -> &C {
        match side {
            BackendRole::Old => &self.old,
            BackendRole::New => &self.new,
        }
    }

    /// Fetches `request` from both backends concurrently.
    ///
    /// Each side must answer before `deadline`. Neither side is retried.
    ///
    /// # Errors
    ///
    /// Returns the failing side's error, or the old side's when both fail.
    /// No partial result is returned.
    pub async fn fetch(
        &self,
        request: &RequestSpec,
        deadline: Instant,
    ) -> Result<ResponsePair, FetchError> {
        let (old, new) = tokio::join!(
            self.fetch_one(BackendRole::Old, request, deadline),
            self.fetch_one(BackendRole::New, request, deadline),
        );
        Ok(ResponsePair {
            old: old?,
            new: new?,
        })
    }

    async fn fetch_one(
        &self,
        side: BackendRole,
        request: &RequestSpec,
        deadline: Instant,
    ) -> Result<ResponseRecord, FetchError> {
        let client = self.client(side);
        let url = request.url();
        debug!(%side, endpoint = %client.endpoint(), %url, "starting");

        let started = Instant::now();
        let kind = match tokio::time::timeout_at(deadline, client.fetch(request)).await {
            Ok(Ok(response)) => {
                debug!(
                    %side,
                    %url,
                    status = response.status().as_u16(),
                    duration = %response.duration_display(),
                    "returned status code"
                );
                return Ok(response);
            }
            Ok(Err(error)) => FetchErrorKind::Connectivity(error),
            Err(_) => FetchErrorKind::Timeout(started.elapsed()),
        };

        debug!(%side, %url, error = %kind, "failed");
        Err(FetchError {
            side,
            path: request.path_and_query().to_string(),
            kind,
        })
    }
}
