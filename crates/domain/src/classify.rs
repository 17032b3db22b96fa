//! Origin classification: which site actually produced a response.
//!
//! Classification looks at one response in isolation. It is an ordered
//! decision table; the first rule whose condition holds decides.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::response::ResponseRecord;

/// The logical origin a response is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationVerdict {
    /// The legacy static site (or its edge cache).
    #[serde(alias = "legacy")]
    ServedByLegacyOrigin,
    /// The CMS-rendered site.
    #[serde(alias = "cms")]
    ServedByCmsOrigin,
    /// No claim can be made.
    Indeterminate,
}

impl fmt::Display for ClassificationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ServedByLegacyOrigin => "legacy origin",
            Self::ServedByCmsOrigin => "CMS origin",
            Self::Indeterminate => "indeterminate",
        })
    }
}

/// Content and header markers that tell the two origins apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginMarkers {
    /// Substring of the `Via` header added by the legacy edge cache.
    pub legacy_via_signature: String,
    /// Body text of the legacy site's generic 403 page.
    pub access_denied_marker: String,
    /// Script path only the legacy home page references.
    pub legacy_script_marker: String,
    /// JavaScript bundle only the legacy site ships.
    pub legacy_bundle_marker: String,
    /// Marker every CMS-rendered page carries.
    pub cms_marker: String,
}

impl Default for OriginMarkers {
    fn default() -> Self {
        Self {
            legacy_via_signature: "varnish".to_string(),
            access_denied_marker: "Access Denied".to_string(),
            legacy_script_marker: r#"<script type="text/javascript" src="/public/hp2013/"#
                .to_string(),
            legacy_bundle_marker: "scripts/epfl-jquery-built.js".to_string(),
            cms_marker: "wp-json".to_string(),
        }
    }
}

impl OriginMarkers {
    /// Checks that no marker is empty; an empty marker matches every body.
    ///
    /// # Errors
    ///
    /// Returns the first empty marker found.
    pub fn validate(&self) -> DomainResult<()> {
        let fields = [
            ("legacy_via_signature", &self.legacy_via_signature),
            ("access_denied_marker", &self.access_denied_marker),
            ("legacy_script_marker", &self.legacy_script_marker),
            ("legacy_bundle_marker", &self.legacy_bundle_marker),
            ("cms_marker", &self.cms_marker),
        ];
        match fields.iter().find(|(_, value)| value.is_empty()) {
            Some((name, _)) => Err(DomainError::EmptyMarker { name: *name }),
            None => Ok(()),
        }
    }
}

/// A predicate over a single response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum Condition {
    /// 3xx status and a `Via` header containing `signature` (case-insensitive).
    RedirectVia {
        /// Edge-cache signature.
        signature: String,
    },
    /// Exact status and a body containing `marker`.
    StatusWithBody {
        /// Status code to match.
        status: u16,
        /// Body substring to match.
        marker: String,
    },
    /// Body contains none of `absent` and all of `present`.
    BodyMarkers {
        /// Substrings that must not appear.
        absent: Vec<String>,
        /// Substrings that must appear.
        present: Vec<String>,
    },
}

impl Condition {
    /// Evaluates the condition.
    #[must_use]
    pub fn matches(&self, response: &ResponseRecord) -> bool {
        match self {
            Self::RedirectVia { signature } => {
                let signature = signature.to_ascii_lowercase();
                response.status().is_redirection()
                    && response
                        .headers()
                        .get_all("via")
                        .any(|via| via.to_ascii_lowercase().contains(&signature))
            }
            Self::StatusWithBody { status, marker } => {
                response.status().as_u16() == *status && response.body().contains(marker.as_str())
            }
            Self::BodyMarkers { absent, present } => {
                let body = response.body();
                absent.iter().all(|m| !body.contains(m.as_str()))
                    && present.iter().all(|m| body.contains(m.as_str()))
            }
        }
    }
}

/// One row of the decision table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Short identifier reported with the verdict.
    pub name: String,
    /// When the rule applies.
    #[serde(flatten)]
    pub condition: Condition,
    /// What the rule concludes.
    pub verdict: ClassificationVerdict,
}

impl Rule {
    /// Creates a rule.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        condition: Condition,
        verdict: ClassificationVerdict,
    ) -> Self {
        Self {
            name: name.into(),
            condition,
            verdict,
        }
    }
}

/// Outcome of classifying one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// The verdict.
    pub verdict: ClassificationVerdict,
    /// Name of the deciding rule, or `None` when nothing matched.
    pub rule: Option<String>,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule {
            Some(rule) => write!(f, "{} (rule '{rule}')", self.verdict),
            None => write!(f, "{} (no rule matched)", self.verdict),
        }
    }
}

/// Ordered, first-match-wins decision table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    /// Rule name for redirects served through the legacy edge cache.
    pub const LEGACY_REDIRECT: &'static str = "legacy-redirect";
    /// Rule name for the ambiguous legacy 403 page.
    pub const ACCESS_DENIED: &'static str = "access-denied";
    /// Rule name for pages rendered by the CMS.
    pub const CMS_RENDERED: &'static str = "cms-rendered";

    /// Creates a classifier from an explicit table.
    #[must_use]
    pub const fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Builds the standard table:
    ///
    /// 1. redirect through the legacy edge cache: legacy origin;
    /// 2. legacy "Access Denied" 403: no claim;
    /// 3. no legacy markers and the CMS marker present: CMS origin.
    #[must_use]
    pub fn from_markers(markers: &OriginMarkers) -> Self {
        Self::new(vec![
            Rule::new(
                Self::LEGACY_REDIRECT,
                Condition::RedirectVia {
                    signature: markers.legacy_via_signature.clone(),
                },
                ClassificationVerdict::ServedByLegacyOrigin,
            ),
            Rule::new(
                Self::ACCESS_DENIED,
                Condition::StatusWithBody {
                    status: 403,
                    marker: markers.access_denied_marker.clone(),
                },
                ClassificationVerdict::Indeterminate,
            ),
            Rule::new(
                Self::CMS_RENDERED,
                Condition::BodyMarkers {
                    absent: vec![
                        markers.legacy_script_marker.clone(),
                        markers.legacy_bundle_marker.clone(),
                    ],
                    present: vec![markers.cms_marker.clone()],
                },
                ClassificationVerdict::ServedByCmsOrigin,
            ),
        ])
    }

    /// Returns the rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classifies one response.
    #[must_use]
    pub fn classify(&self, response: &ResponseRecord) -> Classification {
        self.rules
            .iter()
            .find(|rule| rule.condition.matches(response))
            .map_or(
                Classification {
                    verdict: ClassificationVerdict::Indeterminate,
                    rule: None,
                },
                |rule| Classification {
                    verdict: rule.verdict,
                    rule: Some(rule.name.clone()),
                },
            )
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_markers(&OriginMarkers::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Headers;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn record(status: u16, headers: Headers, body: &str) -> ResponseRecord {
        ResponseRecord::new(status, headers, body.as_bytes().to_vec(), Duration::ZERO)
    }

    const CMS_PAGE: &str = r#"<html><head><link rel="https://api.w.org/" href="https://www.epfl.ch/wp-json/"></head><body>News</body></html>"#;

    #[test]
    fn test_cms_page() {
        let result = Classifier::default().classify(&record(200, Headers::new(), CMS_PAGE));
        assert_eq!(result.verdict, ClassificationVerdict::ServedByCmsOrigin);
        assert_eq!(result.rule.as_deref(), Some(Classifier::CMS_RENDERED));
    }

    #[test]
    fn test_legacy_marker_prevents_cms_verdict() {
        let with_script = CMS_PAGE.replace(
            "<body>",
            r#"<body><script type="text/javascript" src="/public/hp2013/js/main.js"></script>"#,
        );
        let with_bundle = CMS_PAGE.replace(
            "<body>",
            r#"<body><script src="/scripts/epfl-jquery-built.js"></script>"#,
        );

        for body in [with_script, with_bundle] {
            let result = Classifier::default().classify(&record(200, Headers::new(), &body));
            assert_ne!(result.verdict, ClassificationVerdict::ServedByCmsOrigin);
            assert_eq!(result.rule, None);
        }
    }

    #[test]
    fn test_legacy_redirect_by_via_header() {
        let headers = Headers::new()
            .with("Location", "https://www.epfl.ch/fr/")
            .with("Via", "1.1 Varnish (Varnish/5.2)");
        // Body carries the CMS marker; header provenance wins for redirects.
        let result = Classifier::default().classify(&record(301, headers, CMS_PAGE));
        assert_eq!(result.verdict, ClassificationVerdict::ServedByLegacyOrigin);
        assert_eq!(result.rule.as_deref(), Some(Classifier::LEGACY_REDIRECT));
    }

    #[test]
    fn test_redirect_without_legacy_via_falls_through() {
        let headers = Headers::new().with("Via", "1.1 a10");
        let result = Classifier::default().classify(&record(301, headers, CMS_PAGE));
        assert_eq!(result.verdict, ClassificationVerdict::ServedByCmsOrigin);
    }

    #[test]
    fn test_access_denied_is_skipped() {
        let body = format!("<h1>Access Denied</h1>{CMS_PAGE}");
        let result = Classifier::default().classify(&record(403, Headers::new(), &body));
        assert_eq!(result.verdict, ClassificationVerdict::Indeterminate);
        assert_eq!(result.rule.as_deref(), Some(Classifier::ACCESS_DENIED));
        assert_eq!(result.to_string(), "indeterminate (rule 'access-denied')");
    }

    #[test]
    fn test_deterministic() {
        let classifier = Classifier::default();
        let response = record(200, Headers::new(), CMS_PAGE);
        assert_eq!(classifier.classify(&response), classifier.classify(&response));
    }

    #[test]
    fn test_rule_order_matters() {
        let mut rules = Classifier::default().rules().to_vec();
        rules.reverse();
        let reordered = Classifier::new(rules);
        let headers = Headers::new().with("Via", "varnish");
        // With the CMS rule first, the redirect is attributed to the CMS.
        let result = reordered.classify(&record(302, headers, CMS_PAGE));
        assert_eq!(result.verdict, ClassificationVerdict::ServedByCmsOrigin);
    }

    #[test]
    fn test_rules_deserialize_from_yaml() {
        let yaml = r"
- name: gone
  when: status_with_body
  status: 410
  marker: Gone
  verdict: legacy
";
        let rules: Vec<Rule> = serde_yaml::from_str(yaml).unwrap();
        let classifier = Classifier::new(rules);
        let result = classifier.classify(&record(410, Headers::new(), "Gone"));
        assert_eq!(result.verdict, ClassificationVerdict::ServedByLegacyOrigin);
    }

    #[test]
    fn test_empty_marker_rejected() {
        let markers = OriginMarkers {
            cms_marker: String::new(),
            ..OriginMarkers::default()
        };
        assert_eq!(
            markers.validate(),
            Err(DomainError::EmptyMarker { name: "cms_marker" })
        );
        assert!(OriginMarkers::default().validate().is_ok());
    }
}
