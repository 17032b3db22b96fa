//! In-memory backends for use case tests.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use routediff_domain::{BackendEndpoint, Headers, RequestSpec, ResponseRecord, SiteProfile};

use crate::ports::{BackendClient, TransportError};

pub fn site() -> SiteProfile {
    SiteProfile::new("https://www.epfl.ch").unwrap()
}

/// Misbehavior of a single path.
#[derive(Debug, Clone, Copy)]
enum Fault {
    Refuse,
    Stall(Duration),
    Panic,
}

/// A backend answering from a fixed routing table.
pub struct MockBackend {
    endpoint: BackendEndpoint,
    routes: HashMap<String, (u16, Headers, String)>,
    faults: HashMap<String, Fault>,
    refuse: bool,
    delay: Option<Duration>,
    seen: Mutex<Vec<RequestSpec>>,
}

impl MockBackend {
    pub fn new(ip: &str) -> Self {
        Self {
            endpoint: ip.parse().unwrap(),
            routes: HashMap::new(),
            faults: HashMap::new(),
            refuse: false,
            delay: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(self, path: &str, status: u16, body: &str) -> Self {
        self.respond_with(path, status, Headers::new(), body)
    }

    pub fn respond_with(mut self, path: &str, status: u16, headers: Headers, body: &str) -> Self {
        self.routes
            .insert(path.to_string(), (status, headers, body.to_string()));
        self
    }

    pub const fn refuse(mut self) -> Self {
        self.refuse = true;
        self
    }

    pub const fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Refuses connections for `path` only.
    pub fn refuse_path(mut self, path: &str) -> Self {
        self.faults.insert(path.to_string(), Fault::Refuse);
        self
    }

    /// Delays `path` only, before answering from the routing table.
    pub fn stall_path(mut self, path: &str, delay: Duration) -> Self {
        self.faults.insert(path.to_string(), Fault::Stall(delay));
        self
    }

    /// Panics while fetching `path`.
    pub fn panic_on(mut self, path: &str) -> Self {
        self.faults.insert(path.to_string(), Fault::Panic);
        self
    }

    pub fn requests(&self) -> Vec<RequestSpec> {
        self.seen.lock().unwrap().clone()
    }
}

impl BackendClient for MockBackend {
    fn endpoint(&self) -> BackendEndpoint {
        self.endpoint
    }

    fn fetch<'a>(
        &'a self,
        request: &'a RequestSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ResponseRecord, TransportError>> + Send + 'a>> {
        self.seen.lock().unwrap().push(request.clone());
        Box::pin(async move {
            let fault = self.faults.get(request.path_and_query()).copied();
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match fault {
                Some(Fault::Stall(delay)) => tokio::time::sleep(delay).await,
                Some(Fault::Panic) => panic!("backend crashed on {}", request.path_and_query()),
                Some(Fault::Refuse) | None => {}
            }
            if self.refuse || matches!(fault, Some(Fault::Refuse)) {
                return Err(TransportError::Connect {
                    endpoint: self.endpoint,
                    message: "connection refused".to_string(),
                });
            }
            let (status, headers, body) = self
                .routes
                .get(request.path_and_query())
                .cloned()
                .unwrap_or_else(|| (404, Headers::new(), "not found".to_string()));
            Ok(ResponseRecord::new(
                status,
                headers,
                body.into_bytes(),
                Duration::from_millis(5),
            ))
        })
    }
}
