//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - The offline cache worker: routing policy, lifecycle, control messages
//! - Named cache storage with in-memory and SQLite backends
//! - The `Network` seam the worker fetches through
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod network;
pub mod worker;

pub use cache::{CacheDb, CacheStorage, MemoryStorage};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{FetchMode, Method, Request, Response};
pub use network::Network;
pub use worker::{
    ControlMessage, FetchOutcome, MessageOutcome, OfflineCacheWorker, Policy, Registration, ResponseSource,
    WorkerSettings, WorkerState,
};
