//! Backend endpoints: the physical servers a comparison dials.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Port dialed when an endpoint does not name one.
pub const DEFAULT_PORT: u16 = 443;

/// Which side of a comparison a backend plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendRole {
    /// The configuration currently in production.
    Old,
    /// The configuration under test.
    New,
}

impl BackendRole {
    /// Returns the lowercase label used in logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Old => "old",
            Self::New => "new",
        }
    }
}

impl fmt::Display for BackendRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One physical server, addressed by IP and port, never by name.
///
/// Parses from `"10.0.0.7"`, `"10.0.0.7:8443"` or `"[::1]:443"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BackendEndpoint {
    addr: SocketAddr,
}

impl BackendEndpoint {
    /// Creates an endpoint on the default HTTPS port.
    #[must_use]
    pub const fn new(ip: IpAddr) -> Self {
        Self {
            addr: SocketAddr::new(ip, DEFAULT_PORT),
        }
    }

    /// Returns the IP address to dial.
    #[must_use]
    pub const fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    /// Returns the port to dial.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Returns the socket address to dial.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl FromStr for BackendEndpoint {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        let trimmed = s.trim();
        if let Ok(addr) = trimmed.parse::<SocketAddr>() {
            return Ok(Self { addr });
        }
        trimmed
            .parse::<IpAddr>()
            .map(Self::new)
            .map_err(|_| DomainError::InvalidEndpoint(s.to_string()))
    }
}

impl TryFrom<String> for BackendEndpoint {
    type Error = DomainError;

    fn try_from(value: String) -> DomainResult<Self> {
        value.parse()
    }
}

impl From<BackendEndpoint> for String {
    fn from(endpoint: BackendEndpoint) -> Self {
        endpoint.to_string()
    }
}

impl fmt::Display for BackendEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.addr)
    }
}
