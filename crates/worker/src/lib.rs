//! Offline resource cache worker.
//!
//! Intercepts every outgoing request the application makes, decides per
//! request whether to serve from a versioned local store or from the
//! network, and keeps that store consistent across application upgrades.
//!
//! - [`classify`] maps a request to Bypass / DocumentLike / Asset
//! - [`strategy`] holds the two serving algorithms
//! - [`lifecycle`] owns the install/activate/update state machine
//! - [`router`] is the single entry point on the request hot path

pub mod classify;
pub mod lifecycle;
pub mod router;
pub mod strategy;

pub use classify::{RequestClass, classify};
pub use lifecycle::{ClientRegistry, ControlMessage, LifecycleController, LoggedClients, WorkerState};
pub use router::Router;

#[cfg(test)]
pub(crate) mod test_support;
