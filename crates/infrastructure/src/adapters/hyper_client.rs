//! Backend client speaking HTTP/1.1 over a dialed connection.
//!
//! This adapter implements the `BackendClient` port with hyper's low-level
//! connection API, so the socket comes from a [`Dialer`] instead of DNS.

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use tokio::task::JoinHandle;
use routediff_application::ports::{BackendClient, Dialer, TransportError};
use routediff_domain::{BackendEndpoint, Header, Headers, RequestSpec, ResponseRecord};
use tracing::debug;

/// Fetches one request per connection from a fixed backend.
///
/// Redirects are never followed and every status is returned as data.
pub struct ForcedRouteClient<D: Dialer> {
    dialer: D,
}

impl<D: Dialer> ForcedRouteClient<D> {
    /// Creates a client on top of `dialer`.
    #[must_use]
    pub const fn new(dialer: D) -> Self {
        Self { dialer }
    }

    /// Converts the domain request to a hyper `GET` request.
    fn build_request(request: &RequestSpec) -> Result<Request<Empty<Bytes>>, TransportError> {
        let mut builder = Request::builder()
            .method(Method::GET)
            .uri(request.path_and_query());

        for header in request.headers().iter() {
            builder = builder.header(header.name.as_str(), header.value.as_str());
        }

        builder
            .body(Empty::new())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))
    }

    /// Copies response headers, keeping repeated names and arrival order.
    fn collect_headers(headers: &hyper::HeaderMap) -> Headers {
        headers
            .iter()
            .map(|(name, value)| {
                Header::new(
                    name.as_str(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }
}

/// Connection driver task, aborted when the fetch that spawned it ends.
///
/// A fetch dropped mid-body (scenario deadline) must not leave the
/// connection open in the background.
struct DriverGuard(JoinHandle<()>);

impl Drop for DriverGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl<D: Dialer> BackendClient for ForcedRouteClient<D> {
    fn endpoint(&self) -> BackendEndpoint {
        self.dialer.endpoint()
    }

    fn fetch<'a>(
        &'a self,
        request: &'a RequestSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ResponseRecord, TransportError>> + Send + 'a>> {
        Box::pin(async move {
            let http_request = Self::build_request(request)?;
            let start = Instant::now();

            let connection = self.dialer.dial().await?;
            let (mut sender, driver) =
                hyper::client::conn::http1::handshake(TokioIo::new(connection))
                    .await
                    .map_err(|e| TransportError::Protocol(e.to_string()))?;
            let _driver = DriverGuard(tokio::spawn(async move {
                if let Err(err) = driver.await {
                    debug!(error = %err, "connection closed with error");
                }
            }));

            let response = sender
                .send_request(http_request)
                .await
                .map_err(|e| TransportError::Protocol(e.to_string()))?;

            let status = response.status().as_u16();
            let headers = Self::collect_headers(response.headers());
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?
                .to_bytes();
            drop(sender);

            Ok(ResponseRecord::new(
                status,
                headers,
                body.to_vec(),
                start.elapsed(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routediff_domain::SiteProfile;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
    use tokio::sync::oneshot;

    /// Serves one canned response per connection over an in-memory pipe.
    struct CannedDialer {
        response: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl CannedDialer {
        fn new(response: &'static str) -> Self {
            Self {
                response,
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl Dialer for CannedDialer {
        type Connection = DuplexStream;

        fn endpoint(&self) -> BackendEndpoint {
            "10.0.0.2".parse().unwrap()
        }

        fn dial(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<Self::Connection, TransportError>> + Send + '_>>
        {
            let (client, mut server) = tokio::io::duplex(64 * 1024);
            let response = self.response;
            let seen = Arc::clone(&self.seen);
            tokio::spawn(async move {
                let mut received = Vec::new();
                let mut buf = [0u8; 1024];
                while !received.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = server.read(&mut buf).await.unwrap();
                    if n == 0 {
                        return;
                    }
                    received.extend_from_slice(&buf[..n]);
                }
                seen.lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&received).into_owned());
                server.write_all(response.as_bytes()).await.unwrap();
                server.shutdown().await.unwrap();
            });
            Box::pin(async move { Ok(client) })
        }
    }

    struct RefusingDialer;

    impl Dialer for RefusingDialer {
        type Connection = DuplexStream;

        fn endpoint(&self) -> BackendEndpoint {
            "10.0.0.1".parse().unwrap()
        }

        fn dial(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<Self::Connection, TransportError>> + Send + '_>>
        {
            Box::pin(async move {
                Err(TransportError::Connect {
                    endpoint: self.endpoint(),
                    message: "connection refused".to_string(),
                })
            })
        }
    }

    /// Sends headers and part of the body, then waits for the client to hang up.
    struct StallingDialer {
        closed: Mutex<Option<oneshot::Sender<()>>>,
    }

    impl Dialer for StallingDialer {
        type Connection = DuplexStream;

        fn endpoint(&self) -> BackendEndpoint {
            "10.0.0.2".parse().unwrap()
        }

        fn dial(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<Self::Connection, TransportError>> + Send + '_>>
        {
            let (client, mut server) = tokio::io::duplex(64 * 1024);
            let closed = self.closed.lock().unwrap().take();
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = server.read(&mut buf).await.unwrap();
                server
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\npartial")
                    .await
                    .unwrap();
                while server.read(&mut buf).await.unwrap() > 0 {}
                if let Some(closed) = closed {
                    let _ = closed.send(());
                }
            });
            Box::pin(async move { Ok(client) })
        }
    }

    fn request(path: &str) -> RequestSpec {
        let site = SiteProfile::new("https://www.epfl.ch").unwrap();
        RequestSpec::for_path(&site, path).unwrap()
    }

    #[tokio::test]
    async fn test_redirect_is_returned_untouched() {
        let dialer = CannedDialer::new(
            "HTTP/1.1 301 Moved Permanently\r\n\
             Location: /_vti_bin/\r\n\
             Content-Length: 5\r\n\
             Connection: close\r\n\r\n\
             moved",
        );
        let seen = Arc::clone(&dialer.seen);
        let client = ForcedRouteClient::new(dialer);

        let response = client.fetch(&request("/_vti_bin?x=1")).await.unwrap();

        assert_eq!(response.status().as_u16(), 301);
        assert_eq!(response.location(), Some("/_vti_bin/"));
        assert_eq!(response.body(), "moved");

        let sent = seen.lock().unwrap()[0].to_ascii_lowercase();
        assert!(sent.starts_with("get /_vti_bin?x=1 http/1.1\r\n"));
        assert!(sent.contains("host: www.epfl.ch\r\n"));
        assert!(sent.contains("cookie: wordpress_logged_in_whatever: notreally\r\n"));
        assert!(sent.contains("user-agent: routediff/"));
    }

    #[tokio::test]
    async fn test_error_status_is_data() {
        let client = ForcedRouteClient::new(CannedDialer::new(
            "HTTP/1.1 503 Service Unavailable\r\n\
             Via: 1.1 varnish\r\n\
             Via: 1.1 edge\r\n\
             Content-Length: 4\r\n\
             Connection: close\r\n\r\n\
             down",
        ));

        let response = client.fetch(&request("/")).await.unwrap();

        assert!(response.status().is_server_error());
        assert_eq!(response.body(), "down");
        assert_eq!(response.headers().get_all("via").count(), 2);
        assert_eq!(client.endpoint().to_string(), "10.0.0.2:443");
    }

    #[tokio::test]
    async fn test_dial_failure_propagates() {
        let client = ForcedRouteClient::new(RefusingDialer);
        let err = client.fetch(&request("/")).await.unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }

    #[tokio::test]
    async fn test_garbage_response_is_protocol_error() {
        let client = ForcedRouteClient::new(CannedDialer::new("SSH-2.0-OpenSSH\r\n\r\n"));
        let err = client.fetch(&request("/")).await.unwrap_err();
        assert!(matches!(err, TransportError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_abandoned_fetch_closes_connection() {
        let (tx, rx) = oneshot::channel();
        let client = ForcedRouteClient::new(StallingDialer {
            closed: Mutex::new(Some(tx)),
        });

        let request = request("/");
        let fetch = tokio::time::timeout(Duration::from_millis(50), client.fetch(&request)).await;
        assert!(fetch.is_err());

        tokio::time::timeout(Duration::from_secs(2), rx)
            .await
            .expect("connection left open after the fetch was dropped")
            .unwrap();
    }
}
