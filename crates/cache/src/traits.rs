//! Adapter contracts for the durable store and the shared cache
//!
//! The registry only ever talks to these two traits. Neither offers
//! multi-key transactions; the only atomic primitive the core relies on is
//! [`SharedCache::add_if_absent`].

use async_trait::async_trait;
use noticeboard_core::Result;
use std::time::Duration;

/// Authoritative key-value persistence
///
/// Single-key operations are atomic, nothing else is. Writers are
/// last-write-wins per key.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Read one key
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write one key
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete one key, reporting whether it existed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Every key/value pair whose key starts with `prefix`, in one round trip
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>>;
}

/// Ephemeral, TTL-based key-value cache shared between processes
///
/// Anything stored here may vanish at any time without affecting
/// correctness; it only costs extra store reads.
#[async_trait]
pub trait SharedCache: Send + Sync {
    /// Read one live entry
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write one entry that expires after `ttl`
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Delete one entry, reporting whether a live entry existed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Store `value` only if no live entry exists for `key`
    ///
    /// Returns `true` when this call created the entry. Implementations must
    /// make the check and the write a single atomic step.
    async fn add_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;
}
