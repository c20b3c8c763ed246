//! SQLite-backed versioned store of request/response snapshots.
//!
//! One database holds every cache generation; entries are namespaced by an
//! opaque version tag. It supports:
//!
//! - Idempotent open-by-version
//! - Overwrite-on-put snapshot semantics
//! - Enumeration and deletion of whole generations
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod key;
pub mod migrations;
pub mod versions;

pub use crate::Error;

pub use connection::StoreDb;
pub use entries::{StoredResponse, VersionStore};
pub use key::compute_request_key;
