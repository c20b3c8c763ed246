//! Refresh-ahead strategy for document-like requests.
//!
//! Documents and scripts must reflect the newest deployed code whenever
//! connectivity exists, while still working offline: network first, store
//! fallback only on network failure.

use super::spawn_store_write;
use shellkeep_client::{Network, NetworkResponse, ResourceRequest};
use shellkeep_core::{Error, VersionStore};

/// Serve a document-like request.
///
/// On network success with a storable response, a snapshot is written on a
/// detached task and the live response is returned. On network failure, a
/// stored snapshot for the same key is returned if one exists; otherwise the
/// network failure surfaces, since there is nothing else to serve.
pub async fn refresh_ahead(
    network: &dyn Network,
    store: &VersionStore,
    req: &ResourceRequest,
) -> Result<NetworkResponse, Error> {
    let key = req.store_key();

    match network.fetch(req).await {
        Ok(response) => {
            if response.is_storable() {
                spawn_store_write(store.clone(), key, response.to_stored(req));
            }
            Ok(response)
        }
        Err(Error::Network(reason)) => {
            match store.lookup(&key).await {
                Ok(Some(stored)) => match NetworkResponse::from_stored(&stored) {
                    Ok(response) => {
                        tracing::debug!(url = %req.url, "network unreachable, serving stored snapshot");
                        Ok(response)
                    }
                    Err(e) => {
                        tracing::warn!(url = %req.url, error = %e, "stored snapshot unusable");
                        Err(Error::Network(reason))
                    }
                },
                Ok(None) => Err(Error::Network(reason)),
                Err(e) => {
                    // Storage failures never surface; the original network
                    // failure is what the caller sees.
                    tracing::warn!(url = %req.url, error = %e, "store fallback lookup failed");
                    Err(Error::Network(reason))
                }
            }
        }
        Err(e) => Err(e),
    }
}
