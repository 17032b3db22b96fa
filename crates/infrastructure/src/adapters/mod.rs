//! Adapters implementing the application transport ports.

mod hyper_client;
mod tls_dialer;

pub use hyper_client::ForcedRouteClient;
pub use tls_dialer::{ForcedRouteDialer, TlsSetupError, insecure_client_config};
