//! Request classification.
//!
//! A pure decision function evaluated once per intercepted request. The rule
//! order is significant: bypass checks run before any other classification so
//! that non-cacheable requests never reach a strategy.

use shellkeep_client::{Destination, ResourceRequest};

/// How the router handles a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Forwarded to the network untouched; the store is never read or written.
    Bypass,
    /// Top-level navigations, scripts, stylesheets, markup: network-first.
    DocumentLike,
    /// Everything else (images, fonts, data files, manifest): cache-first.
    Asset,
}

/// Classify a request. First matching rule wins:
///
/// 1. Non-GET methods bypass.
/// 2. Requests to a bypass host (the external analysis endpoint) bypass;
///    their responses are large, single-use, and potentially sensitive.
/// 3. Document/script destinations, script/stylesheet/markup extensions,
///    and the application root are document-like.
/// 4. The rest are assets.
pub fn classify(req: &ResourceRequest, bypass_hosts: &[String]) -> RequestClass {
    if req.method != "GET" {
        return RequestClass::Bypass;
    }

    if let Some(host) = req.url.host_str()
        && bypass_hosts.iter().any(|h| h == host)
    {
        return RequestClass::Bypass;
    }

    let path = req.url.path();
    let document_like = matches!(req.destination, Destination::Document | Destination::Script)
        || path.ends_with(".js")
        || path.ends_with(".css")
        || path.ends_with(".html")
        || path == "/";

    if document_like { RequestClass::DocumentLike } else { RequestClass::Asset }
}
