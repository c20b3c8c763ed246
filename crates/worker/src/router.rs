//! Interception router: the single entry point on the request hot path.

use crate::classify::{RequestClass, classify};
use crate::strategy::{cache_then_populate, refresh_ahead};
use shellkeep_client::{Network, NetworkResponse, ResourceRequest};
use shellkeep_core::{Error, VersionStore};
use std::sync::Arc;

/// Classifies every intercepted request and dispatches it to the matching
/// strategy. Adds no buffering of its own; concurrent calls share the store
/// handle and suspend independently.
pub struct Router {
    network: Arc<dyn Network>,
    store: VersionStore,
    bypass_hosts: Vec<String>,
}

impl Router {
    pub fn new(network: Arc<dyn Network>, store: VersionStore, bypass_hosts: Vec<String>) -> Self {
        Self { network, store, bypass_hosts }
    }

    /// Serve one intercepted request.
    ///
    /// Bypass requests are forwarded verbatim with no storage side effect,
    /// success or error alike.
    pub async fn route(&self, req: &ResourceRequest) -> Result<NetworkResponse, Error> {
        match classify(req, &self.bypass_hosts) {
            RequestClass::Bypass => self.network.fetch(req).await,
            RequestClass::DocumentLike => refresh_ahead(self.network.as_ref(), &self.store, req).await,
            RequestClass::Asset => cache_then_populate(self.network.as_ref(), &self.store, req).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeNetwork, request};
    use shellkeep_core::StoreDb;

    async fn make_router(network: Arc<FakeNetwork>) -> (Router, VersionStore) {
        let db = StoreDb::open_in_memory().await.unwrap();
        let store = db.open_version("v1").await.unwrap();
        let router = Router::new(
            network,
            store.clone(),
            vec!["generativelanguage.googleapis.com".to_string()],
        );
        (router, store)
    }

    #[tokio::test]
    async fn test_non_get_never_touches_store() {
        let network = Arc::new(FakeNetwork::new());
        network.serve("https://app.example.com/analyze", 200, b"ok");
        let (router, store) = make_router(network.clone()).await;

        let mut req = request("https://app.example.com/analyze");
        req.method = "POST".to_string();
        let response = router.route(&req).await.unwrap();
        assert_eq!(response.body.as_ref(), b"ok");
        assert_eq!(store.entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_analysis_host_leaves_no_entry() {
        let network = Arc::new(FakeNetwork::new());
        network.serve(
            "https://generativelanguage.googleapis.com/v1/models",
            200,
            b"{\"candidates\":[]}",
        );
        let (router, store) = make_router(network.clone()).await;

        let req = request("https://generativelanguage.googleapis.com/v1/models");
        router.route(&req).await.unwrap();

        assert!(store.lookup(&req.store_key()).await.unwrap().is_none());
        assert_eq!(store.entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bypass_errors_pass_through() {
        let network = Arc::new(FakeNetwork::new());
        network.set_offline(true);
        let (router, store) = make_router(network.clone()).await;

        let mut req = request("https://app.example.com/analyze");
        req.method = "POST".to_string();
        let result = router.route(&req).await;
        assert!(matches!(result, Err(Error::Network(_))));
        assert_eq!(store.entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_asset_request_dispatches_to_cache_first() {
        let network = Arc::new(FakeNetwork::new());
        network.serve("https://app.example.com/logo.png", 200, b"\x89PNG");
        let (router, store) = make_router(network.clone()).await;

        let req = request("https://app.example.com/logo.png");
        router.route(&req).await.unwrap();
        assert!(store.lookup(&req.store_key()).await.unwrap().is_some());

        // Second request is served from the store.
        router.route(&req).await.unwrap();
        assert_eq!(network.call_count("https://app.example.com/logo.png"), 1);
    }

    #[tokio::test]
    async fn test_document_request_dispatches_to_network_first() {
        let network = Arc::new(FakeNetwork::new());
        network.serve("https://app.example.com/", 200, b"<html>v2</html>");
        let (router, _store) = make_router(network.clone()).await;

        let req = request("https://app.example.com/");
        router.route(&req).await.unwrap();
        router.route(&req).await.unwrap();

        // Document-like requests go to the network every time.
        assert_eq!(network.call_count("https://app.example.com/"), 2);
    }

    #[tokio::test]
    async fn test_concurrent_mixed_requests() {
        let network = Arc::new(FakeNetwork::new());
        network.serve("https://app.example.com/", 200, b"<html></html>");
        network.serve("https://app.example.com/app.css", 200, b"body{}");
        network.serve("https://app.example.com/logo.png", 200, b"\x89PNG");
        let (router, _store) = make_router(network.clone()).await;

        let doc = request("https://app.example.com/");
        let css = request("https://app.example.com/app.css");
        let png = request("https://app.example.com/logo.png");
        let (a, b, c) = tokio::join!(router.route(&doc), router.route(&css), router.route(&png));
        a.unwrap();
        b.unwrap();
        c.unwrap();
    }
}
