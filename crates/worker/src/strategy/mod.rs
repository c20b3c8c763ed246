//! The two serving strategies.
//!
//! Both are stateless: they consume the store and the network and produce a
//! response. Storage failures never change what a caller gets back; they are
//! logged and the in-flight response is returned unmodified.

pub mod cache_populate;
pub mod refresh_ahead;

pub use cache_populate::cache_then_populate;
pub use refresh_ahead::refresh_ahead;

use shellkeep_core::{StoredResponse, VersionStore};

/// Write a snapshot on a detached task.
///
/// The write is not attached to the originating request; it completes in the
/// background even if the caller goes away, and its failure is only logged.
pub(crate) fn spawn_store_write(store: VersionStore, key: String, snapshot: StoredResponse) {
    tokio::spawn(async move {
        if let Err(e) = store.put(&key, &snapshot).await {
            tracing::warn!(key = %key, error = %e, "background store write failed");
        }
    });
}
