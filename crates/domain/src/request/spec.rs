//! Request specification type

use url::{Position, Url};

use super::Headers;
use crate::error::{DomainError, DomainResult};
use crate::site::SiteProfile;

/// One logical request, identical for both backends.
///
/// Built fresh for every comparison and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    url: Url,
    headers: Headers,
}

impl RequestSpec {
    /// Resolves `path` (optionally with a query string) against the site and
    /// attaches the site's fixed headers.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be joined onto the base URL or if it
    /// resolves to a different origin.
    pub fn for_path(site: &SiteProfile, path: &str) -> DomainResult<Self> {
        let base = site.base_url();
        let url = base
            .join(path)
            .map_err(|e| DomainError::InvalidUrl(format!("{e}: {path}")))?;
        if url.origin() != base.origin() {
            return Err(DomainError::ForeignOrigin {
                path: path.to_string(),
                base: base.to_string(),
            });
        }

        let headers = Headers::new()
            .with("Host", site.virtual_host())
            .with("Cookie", site.session_cookie())
            .with("User-Agent", site.user_agent());

        Ok(Self { url, headers })
    }

    /// Returns the fully qualified logical URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the request target sent on the wire (`/path?query`).
    #[must_use]
    pub fn path_and_query(&self) -> &str {
        &self.url[Position::BeforePath..Position::AfterQuery]
    }

    /// Returns the headers applied to both backends.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn site() -> SiteProfile {
        SiteProfile::new("https://www.epfl.ch").unwrap()
    }

    #[test]
    fn test_path_and_query() {
        let request = RequestSpec::for_path(&site(), "/_vti_bin/?zonzon").unwrap();
        assert_eq!(request.url().as_str(), "https://www.epfl.ch/_vti_bin/?zonzon");
        assert_eq!(request.path_and_query(), "/_vti_bin/?zonzon");

        let request = RequestSpec::for_path(&site(), "/?foo7").unwrap();
        assert_eq!(request.path_and_query(), "/?foo7");
    }

    #[test]
    fn test_fragment_is_not_sent() {
        let request = RequestSpec::for_path(&site(), "/page#section").unwrap();
        assert_eq!(request.path_and_query(), "/page");
    }

    #[test]
    fn test_fixed_headers() {
        let request = RequestSpec::for_path(&site(), "/zonk").unwrap();
        let headers = request.headers();
        assert_eq!(headers.get("host"), Some("www.epfl.ch"));
        assert_eq!(
            headers.get("cookie"),
            Some("wordpress_logged_in_whatever: notReally")
        );
        assert!(headers.get("user-agent").is_some_and(|ua| ua.starts_with("routediff/")));
    }

    #[test]
    fn test_identical_for_both_sides() {
        let a = RequestSpec::for_path(&site(), "/cgi-bin/").unwrap();
        let b = RequestSpec::for_path(&site(), "/cgi-bin/").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_foreign_origin() {
        let result = RequestSpec::for_path(&site(), "https://attacker.example/");
        assert!(matches!(result, Err(DomainError::ForeignOrigin { .. })));
    }
}
