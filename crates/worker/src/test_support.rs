//! Shared test doubles for strategy, lifecycle, and router tests.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use shellkeep_client::{Destination, Network, NetworkResponse, ResourceRequest};
use shellkeep_core::Error;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

/// A GET request with `Other` destination, for tests where the path alone
/// decides the classification.
pub fn request(url: &str) -> ResourceRequest {
    ResourceRequest::get(Url::parse(url).unwrap(), Destination::Other)
}

struct FakeRoute {
    status: u16,
    body: Vec<u8>,
    opaque: bool,
}

/// In-memory [`Network`] with scripted routes, an offline switch, and a
/// per-URL call log.
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, FakeRoute>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }

    pub fn serve(&self, url: &str, status: u16, body: &[u8]) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), FakeRoute { status, body: body.to_vec(), opaque: false });
    }

    pub fn serve_opaque(&self, url: &str, body: &[u8]) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), FakeRoute { status: 200, body: body.to_vec(), opaque: true });
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of fetches issued for the given URL so far.
    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, req: &ResourceRequest) -> Result<NetworkResponse, Error> {
        self.calls.lock().unwrap().push(req.url.to_string());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".to_string()));
        }

        let routes = self.routes.lock().unwrap();
        match routes.get(req.url.as_str()) {
            Some(route) => Ok(NetworkResponse {
                url: req.url.clone(),
                final_url: req.url.clone(),
                status: StatusCode::from_u16(route.status).unwrap(),
                headers: HeaderMap::new(),
                body: Bytes::from(route.body.clone()),
                opaque: route.opaque,
            }),
            None => Err(Error::Network(format!("no route for {}", req.url))),
        }
    }
}
