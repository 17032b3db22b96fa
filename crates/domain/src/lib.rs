//! Routediff Domain - Core types
//!
//! This crate defines the domain model of the differential proxy harness:
//! endpoints, request/response records, similarity, judgment and origin
//! classification. All types here are pure Rust with no I/O dependencies.

pub mod backend;
pub mod classify;
pub mod diff;
pub mod error;
pub mod judge;
pub mod request;
pub mod response;
pub mod scenario;
pub mod settings;
pub mod similarity;
pub mod site;

pub use backend::{BackendEndpoint, BackendRole, DEFAULT_PORT};
pub use classify::{
    Classification, ClassificationVerdict, Classifier, Condition, OriginMarkers, Rule,
};
pub use diff::line_diff;
pub use error::{DomainError, DomainResult};
pub use judge::{BodyMismatch, DivergenceFailure, EquivalenceFailure, Judge, Thresholds};
pub use request::{Header, Headers, RequestSpec};
pub use response::{ResponseRecord, StatusCode};
pub use scenario::{Expectation, Scenario, ScenarioFile, Step};
pub use settings::{BackendPair, HarnessSettings, SiteSettings};
pub use similarity::{SimilarityScore, similarity};
pub use site::SiteProfile;
