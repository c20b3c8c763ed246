//! Network boundary: request model, the `Network` trait, and the
//! reqwest-backed implementation.
//!
//! ### Request model
//! - Requests carry their method, canonical URL, and declared destination.
//! - A request's store key is derived from its method and full URL.
//!
//! ### Opaque responses
//! - A response is marked opaque when the final URL's origin differs from
//!   the requested origin and no `Access-Control-Allow-Origin` header is
//!   present. Opaque responses are returned to the caller but must never
//!   be written to the store.

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use reqwest::{Client, StatusCode, header};
use std::time::Duration;

pub use url::{UrlError, canonicalize};

use shellkeep_core::store::compute_request_key;
use shellkeep_core::{Error, StoredResponse};

/// Declared destination of a request, as reported by the surrounding
/// application. `Other` covers data files, manifests, and anything the
/// application does not classify further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Document,
    Script,
    Style,
    Image,
    Font,
    Other,
}

/// An intercepted outgoing request.
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    /// Uppercase HTTP method ("GET", "POST", ...).
    pub method: String,
    /// Canonical request URL.
    pub url: Url,
    /// Declared destination.
    pub destination: Destination,
}

impl ResourceRequest {
    /// A GET request for the given URL.
    pub fn get(url: Url, destination: Destination) -> Self {
        Self { method: "GET".to_string(), url, destination }
    }

    /// The store key this request reads and writes under.
    ///
    /// Fragments never reach the server, so a fragment navigation must hit
    /// the same entry as its bare URL.
    pub fn store_key(&self) -> String {
        if self.url.fragment().is_some() {
            let mut url = self.url.clone();
            url.set_fragment(None);
            compute_request_key(&self.method, url.as_str())
        } else {
            compute_request_key(&self.method, self.url.as_str())
        }
    }
}

/// Response from a network fetch.
#[derive(Debug, Clone)]
pub struct NetworkResponse {
    /// The original URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: header::HeaderMap,
    /// Response body bytes
    pub body: Bytes,
    /// Cross-origin response whose content cannot be inspected; never stored.
    pub opaque: bool,
}

impl NetworkResponse {
    /// Whether this response is eligible for storage: a success status on a
    /// non-opaque response.
    pub fn is_storable(&self) -> bool {
        self.status.is_success() && !self.opaque
    }

    /// Snapshot this response for the store.
    pub fn to_stored(&self, req: &ResourceRequest) -> StoredResponse {
        StoredResponse::new(
            &req.method,
            self.url.as_str(),
            self.status.as_u16(),
            headers_to_pairs(&self.headers),
            self.body.to_vec(),
        )
    }

    /// Rebuild a response from a stored snapshot.
    pub fn from_stored(stored: &StoredResponse) -> Result<Self, Error> {
        let url = Url::parse(&stored.url).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let status = StatusCode::from_u16(stored.status).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        Ok(Self {
            url: url.clone(),
            final_url: url,
            status,
            headers: pairs_to_headers(&stored.headers),
            body: Bytes::from(stored.body.clone()),
            opaque: false,
        })
    }
}

fn headers_to_pairs(headers: &header::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn pairs_to_headers(pairs: &[(String, String)]) -> header::HeaderMap {
    let mut headers = header::HeaderMap::new();
    for (name, value) in pairs {
        if let (Ok(name), Ok(value)) = (
            header::HeaderName::from_bytes(name.as_bytes()),
            header::HeaderValue::from_str(value),
        ) {
            headers.append(name, value);
        }
    }
    headers
}

/// The network the strategies dispatch through.
///
/// Production code uses [`HttpNetwork`]; tests substitute a fake.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, req: &ResourceRequest) -> Result<NetworkResponse, Error>;
}

/// Configuration for the HTTP network client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "shellkeep/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "shellkeep/0.1".to_string(),
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// Reqwest-backed [`Network`] implementation.
pub struct HttpNetwork {
    http: Client,
    config: FetchConfig,
}

impl HttpNetwork {
    /// Create a new network client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, req: &ResourceRequest) -> Result<NetworkResponse, Error> {
        let method = reqwest::Method::from_bytes(req.method.as_bytes())
            .map_err(|e| Error::Network(format!("invalid method: {}", e)))?;

        let response = self
            .http
            .request(method, req.url.clone())
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let cross_origin = final_url.origin() != req.url.origin();
        let opaque = cross_origin && !headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN);

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        tracing::debug!(
            url = %req.url,
            status = status.as_u16(),
            bytes = body.len(),
            opaque,
            "fetched"
        );

        Ok(NetworkResponse { url: req.url.clone(), final_url, status, headers, body, opaque })
    }
}
