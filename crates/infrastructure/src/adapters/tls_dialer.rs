//! Forced-route TLS dialer.
//!
//! Opens a TCP connection to one fixed backend IP and runs a TLS handshake
//! presenting the public hostname as SNI, whatever that hostname resolves
//! to. The backend's certificate is not verified: it is expected to be
//! issued for the public name, not for the IP being dialed.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use routediff_application::ports::{Dialer, TransportError};
use routediff_domain::BackendEndpoint;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::{debug, warn};

/// Errors building the TLS client configuration.
#[derive(Debug, Error)]
pub enum TlsSetupError {
    /// The crypto provider rejected the protocol versions.
    #[error("failed to build TLS client configuration: {0}")]
    Config(#[from] rustls::Error),
}

/// Accepts any server certificate.
///
/// Handshake signatures are still checked, so the session is a real TLS
/// session with an unauthenticated peer.
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Builds the client configuration shared by every forced-route dialer.
///
/// Certificate chain and hostname verification are disabled. Only HTTP/1.1
/// is offered over ALPN.
///
/// # Errors
///
/// Returns an error if the default protocol versions are not supported by
/// the ring provider.
pub fn insecure_client_config() -> Result<Arc<ClientConfig>, TlsSetupError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = Arc::new(AcceptAnyCertificate {
        provider: Arc::clone(&provider),
    });

    let mut config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    warn!("TLS certificate verification is disabled for backend connections");
    Ok(Arc::new(config))
}

/// Dials one backend IP while impersonating the public hostname.
///
/// Every call opens a new socket; nothing is pooled or retried.
#[derive(Clone)]
pub struct ForcedRouteDialer {
    endpoint: BackendEndpoint,
    server_name: ServerName<'static>,
    connector: TlsConnector,
}

impl ForcedRouteDialer {
    /// Creates a dialer for `endpoint` presenting `server_name` as SNI.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidServerName`] if `server_name` is
    /// neither a DNS name nor an IP address.
    pub fn new(
        endpoint: BackendEndpoint,
        server_name: &str,
        config: Arc<ClientConfig>,
    ) -> Result<Self, TransportError> {
        let server_name = ServerName::try_from(server_name.to_string())
            .map_err(|e| TransportError::InvalidServerName(format!("{server_name}: {e}")))?;

        Ok(Self {
            endpoint,
            server_name,
            connector: TlsConnector::from(config),
        })
    }

    /// Returns the SNI presented to the backend.
    #[must_use]
    pub fn server_name(&self) -> String {
        self.server_name.to_str().into_owned()
    }
}

impl Dialer for ForcedRouteDialer {
    type Connection = TlsStream<TcpStream>;

    fn endpoint(&self) -> BackendEndpoint {
        self.endpoint
    }

    fn dial(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Self::Connection, TransportError>> + Send + '_>> {
        Box::pin(async move {
            let tcp = TcpStream::connect(self.endpoint.socket_addr())
                .await
                .map_err(|e| TransportError::Connect {
                    endpoint: self.endpoint,
                    message: e.to_string(),
                })?;

            let stream = self
                .connector
                .connect(self.server_name.clone(), tcp)
                .await
                .map_err(|e| TransportError::Tls {
                    endpoint: self.endpoint,
                    server_name: self.server_name(),
                    message: e.to_string(),
                })?;

            debug!(
                endpoint = %self.endpoint,
                server_name = %self.server_name(),
                "TLS session established"
            );
            Ok(stream)
        })
    }
}
