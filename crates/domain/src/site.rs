//! The logical site under comparison.

use url::Url;

use crate::error::{DomainError, DomainResult};

/// Cookie sent by default so that both backends render the logged-in code path
/// the public proxy would route to the CMS.
pub const DEFAULT_SESSION_COOKIE: &str = "wordpress_logged_in_whatever: notReally";

/// Immutable per-run description of the public site both backends impersonate.
///
/// Every [`RequestSpec`](crate::request::RequestSpec) is derived from a profile,
/// which is what keeps the two sides of a comparison byte-for-byte identical on
/// the request side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    base_url: Url,
    virtual_host: String,
    session_cookie: String,
    user_agent: String,
}

impl SiteProfile {
    /// Creates a profile from a base URL, deriving the virtual host from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed, is not `http`/`https`, or has no host.
    pub fn new(base_url: &str) -> DomainResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| DomainError::InvalidUrl(format!("{e}: {base_url}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(DomainError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                base_url.scheme()
            )));
        }
        let host = base_url
            .host_str()
            .ok_or_else(|| DomainError::InvalidUrl(format!("no host in {base_url}")))?;
        let virtual_host = match base_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self {
            base_url,
            virtual_host,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            user_agent: default_user_agent(),
        })
    }

    /// Overrides the `Host` header value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty or contains control characters.
    pub fn with_virtual_host(mut self, virtual_host: impl Into<String>) -> DomainResult<Self> {
        let virtual_host = header_value("Host", virtual_host.into())?;
        if virtual_host.trim().is_empty() {
            return Err(DomainError::InvalidHeader("Host must not be empty".to_string()));
        }
        self.virtual_host = virtual_host;
        Ok(self)
    }

    /// Overrides the synthetic session cookie.
    ///
    /// # Errors
    ///
    /// Returns an error if the value contains control characters.
    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> DomainResult<Self> {
        self.session_cookie = header_value("Cookie", cookie.into())?;
        Ok(self)
    }

    /// Overrides the `User-Agent` header value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value contains control characters.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> DomainResult<Self> {
        self.user_agent = header_value("User-Agent", user_agent.into())?;
        Ok(self)
    }

    /// Returns the base URL paths are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the host name used for TLS SNI.
    ///
    /// This is the base URL host without any port.
    #[must_use]
    pub fn server_name(&self) -> &str {
        self.base_url.host_str().unwrap_or(&self.virtual_host)
    }

    /// Returns the `Host` header value.
    #[must_use]
    pub fn virtual_host(&self) -> &str {
        &self.virtual_host
    }

    /// Returns the `Cookie` header value.
    #[must_use]
    pub fn session_cookie(&self) -> &str {
        &self.session_cookie
    }

    /// Returns the `User-Agent` header value.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

/// Default `User-Agent`: crate name and version.
#[must_use]
pub fn default_user_agent() -> String {
    format!("routediff/{}", env!("CARGO_PKG_VERSION"))
}

fn header_value(name: &str, value: String) -> DomainResult<String> {
    if value.chars().any(char::is_control) {
        return Err(DomainError::InvalidHeader(format!(
            "{name} contains control characters"
        )));
    }
    Ok(value)
}
