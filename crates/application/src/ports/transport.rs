//! Transport ports: dialing a backend and exchanging one request with it.

use std::future::Future;
use std::pin::Pin;

use routediff_domain::{BackendEndpoint, RequestSpec, ResponseRecord};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

/// Errors raised while talking to one backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The TCP connection could not be established.
    #[error("TCP connect to {endpoint} failed: {message}")]
    Connect {
        /// Endpoint dialed.
        endpoint: BackendEndpoint,
        /// Underlying error.
        message: String,
    },

    /// The TLS handshake failed.
    #[error("TLS handshake with {endpoint} as '{server_name}' failed: {message}")]
    Tls {
        /// Endpoint dialed.
        endpoint: BackendEndpoint,
        /// SNI presented.
        server_name: String,
        /// Underlying error.
        message: String,
    },

    /// The logical host cannot be used as a TLS server name.
    #[error("invalid TLS server name: {0}")]
    InvalidServerName(String),

    /// The request could not be encoded.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The HTTP exchange failed after the connection was up.
    #[error("HTTP exchange failed: {0}")]
    Protocol(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

impl TransportError {
    /// Returns true if the failure happened before any HTTP was spoken.
    #[must_use]
    pub const fn is_dial_failure(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Tls { .. } | Self::InvalidServerName(_)
        )
    }
}

/// A byte stream ready to carry HTTP.
pub trait Connection: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> Connection for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// Port for opening connections to one fixed backend.
///
/// A dialer is a connection factory bound to a single network identity: every
/// connection it returns reaches the same endpoint, whatever the logical host
/// resolves to.
pub trait Dialer: Send + Sync {
    /// The connection type produced.
    type Connection: Connection;

    /// Returns the endpoint every connection reaches.
    fn endpoint(&self) -> BackendEndpoint;

    /// Opens a new connection. Never retried.
    ///
    /// # Errors
    ///
    /// Returns a connect or TLS error if the connection cannot be established.
    fn dial(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Self::Connection, TransportError>> + Send + '_>>;
}

/// Port for fetching one request from one fixed backend.
///
/// Implementations must not follow redirects and must return every status as
/// data.
pub trait BackendClient: Send + Sync {
    /// Returns the endpoint requests are sent to.
    fn endpoint(&self) -> BackendEndpoint;

    /// Fetches the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or the exchange fails.
    fn fetch<'a>(
        &'a self,
        request: &'a RequestSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ResponseRecord, TransportError>> + Send + 'a>>;
}
