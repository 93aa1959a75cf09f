//! Named cache storage.
//!
//! A worker owns a handful of named caches (one per release generation plus
//! the runtime cache). Each cache maps a normalized request key to a whole
//! response. This module provides:
//!
//! - The `CacheStorage` trait the worker is written against
//! - `MemoryStorage`, an in-process backend
//! - `CacheDb`, a persistent SQLite backend with automatic migrations

pub mod connection;
pub mod entries;
pub mod key;
pub mod memory;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use memory::MemoryStorage;

use crate::http::Response;

/// Storage of named caches of request-key → response entries.
///
/// Writes are whole-entry overwrites; concurrent puts to the same key are
/// last-writer-wins.
#[async_trait::async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the named cache if it doesn't exist yet.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Names of all caches, oldest first.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    async fn has(&self, name: &str) -> Result<bool, Error>;

    /// Remove a cache with all its entries. Returns false if it didn't exist.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Store a response under `key` in the named cache, creating the cache if needed.
    async fn put(&self, name: &str, key: &str, response: &Response) -> Result<(), Error>;

    async fn match_in(&self, name: &str, key: &str) -> Result<Option<Response>, Error>;

    /// Look `key` up in every cache, oldest first; the first hit wins.
    async fn match_any(&self, key: &str) -> Result<Option<Response>, Error>;

    /// Keys stored in the named cache, sorted. Empty if the cache doesn't exist.
    async fn entries(&self, name: &str) -> Result<Vec<String>, Error>;
}
