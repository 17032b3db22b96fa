//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and the network.
//! Each port is a trait implemented by adapters in the infrastructure layer.

mod transport;

pub use transport::{BackendClient, Connection, Dialer, TransportError};
