//! Client code for shellkeep.
//!
//! This crate provides the network boundary: the request/response model,
//! the `Network` trait the strategies dispatch through, and the
//! reqwest-backed implementation.

pub mod fetch;

pub use fetch::{
    Destination, FetchConfig, HttpNetwork, Network, NetworkResponse, ResourceRequest, canonicalize,
};
