//! Cache-then-network-populate strategy for asset requests.
//!
//! Static assets rarely change and should load instantly from the store;
//! the network is only consulted on a miss, and a successful fetch backfills
//! the store for next time. Intentionally stale-tolerant: hits are served
//! without any background refresh.

use shellkeep_client::{Network, NetworkResponse, ResourceRequest};
use shellkeep_core::{Error, VersionStore};

/// Serve an asset request.
///
/// Store hit: return the snapshot, no network touched. Miss: fetch; a
/// storable response (success status, not opaque) is written before being
/// returned, with storage failures absorbed and logged. A network failure on
/// a miss propagates: there is no stale copy to fall back on.
pub async fn cache_then_populate(
    network: &dyn Network,
    store: &VersionStore,
    req: &ResourceRequest,
) -> Result<NetworkResponse, Error> {
    let key = req.store_key();

    match store.lookup(&key).await {
        Ok(Some(stored)) => match NetworkResponse::from_stored(&stored) {
            Ok(response) => return Ok(response),
            Err(e) => {
                tracing::warn!(url = %req.url, error = %e, "stored entry unusable, treating as miss");
            }
        },
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(url = %req.url, error = %e, "store lookup failed, treating as miss");
        }
    }

    let response = network.fetch(req).await?;

    if response.is_storable()
        && let Err(e) = store.put(&key, &response.to_stored(req)).await
    {
        tracing::warn!(url = %req.url, error = %e, "store populate failed");
    }

    Ok(response)
}
