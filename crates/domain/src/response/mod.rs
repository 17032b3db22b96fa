//! HTTP Response domain types

mod spec;

pub use spec::{ResponseRecord, StatusCode};
