//! Cache Backend Module
//!
//! The storage abstraction shared by the volatile and durable backends.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CacheError, Result};

// == Payload ==
/// Anything the cache can hold: cloneable for the in-memory map and
/// serializable for the file store.
pub trait Payload: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {}

impl<T> Payload for T where T: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {}

// == Cache Backend Trait ==
/// Storage substrate behind [`ResponseCache`](crate::cache::ResponseCache).
///
/// A miss is `Ok(None)`. Expired and corrupted entries are reported as misses
/// and removed. Errors are reserved for invalid input and operational
/// failures.
#[async_trait]
pub trait CacheBackend<T: Payload>: Send + Sync + Debug {
    /// Returns the live value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<T>>;

    /// Stores `value` under `key`, replacing any previous entry. `ttl`
    /// overrides the backend default.
    async fn set(&self, key: &str, value: T, ttl: Option<Duration>) -> Result<()>;

    /// Removes every entry.
    async fn clear(&self) -> Result<()>;

    /// Number of live entries. Expired entries found along the way are
    /// removed first.
    async fn size(&self) -> Result<usize>;

    /// Removes expired (and unreadable) entries, returning how many went.
    async fn purge_expired(&self) -> Result<usize>;

    /// Short backend identifier for logs.
    fn name(&self) -> &'static str;
}

// == Validation ==
/// Rejects empty or whitespace-only keys.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(CacheError::InvalidKey("Cache key cannot be empty".to_string()));
    }
    Ok(())
}

/// Rejects an explicit zero TTL.
pub(crate) fn validate_ttl(ttl: Option<Duration>) -> Result<()> {
    match ttl {
        Some(ttl) if ttl.is_zero() => {
            Err(CacheError::InvalidTtl("TTL must be positive".to_string()))
        }
        _ => Ok(()),
    }
}

/// Rejects a zero default TTL at construction.
pub(crate) fn validate_default_ttl(ttl: Duration) -> Result<()> {
    if ttl.is_zero() {
        return Err(CacheError::InvalidConfig(
            "Default TTL must be positive".to_string(),
        ));
    }
    Ok(())
}
