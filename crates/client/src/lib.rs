//! Client code for shellcache.
//!
//! This crate provides the HTTP side of the worker: a reqwest-backed
//! implementation of the core `Network` trait.

pub mod fetch;

pub use fetch::{HttpNetwork, NetworkConfig};
