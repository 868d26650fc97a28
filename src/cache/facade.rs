//! Cache Facade Module
//!
//! The single entry point callers use, independent of the configured backend.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheBackend, DurableBackend, Payload, VolatileBackend};
use crate::config::{BackendKind, CacheConfig};
use crate::error::Result;

// == Response Cache ==
/// Thin pass-through to one backend chosen at construction.
///
/// Cloning is cheap and every clone shares the same backend, so one instance
/// can be handed to each component that needs it.
#[derive(Debug, Clone)]
pub struct ResponseCache<T: Payload> {
    backend: Arc<dyn CacheBackend<T>>,
}

impl<T: Payload> ResponseCache<T> {
    // == Constructors ==
    /// Wraps an existing backend.
    pub fn new(backend: impl CacheBackend<T> + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// In-memory cache with the given default TTL.
    pub fn volatile(default_ttl: Duration) -> Result<Self> {
        Ok(Self::new(VolatileBackend::new(default_ttl)?))
    }

    /// File cache rooted at `root`.
    pub fn durable(
        root: impl Into<PathBuf>,
        default_ttl: Duration,
        max_entry_size: usize,
    ) -> Result<Self> {
        Ok(Self::new(DurableBackend::new(
            root,
            default_ttl,
            max_entry_size,
        )?))
    }

    /// Builds the backend selected by `config`.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        match config.backend {
            BackendKind::Volatile => Self::volatile(config.default_ttl()),
            BackendKind::Durable => Self::durable(
                config.cache_dir.clone(),
                config.default_ttl(),
                config.max_entry_size,
            ),
        }
    }

    // == Operations ==
    /// Returns the cached value for `key`, or None on a miss.
    pub async fn get(&self, key: &str) -> Result<Option<T>> {
        self.backend.get(key).await
    }

    /// Stores `value` under `key`. `ttl` overrides the backend default.
    pub async fn set(&self, key: &str, value: T, ttl: Option<Duration>) -> Result<()> {
        self.backend.set(key, value, ttl).await
    }

    /// Removes every entry.
    ///
    /// A `get` racing with `clear` may observe either the old value or a
    /// miss, never a partial one.
    pub async fn clear(&self) -> Result<()> {
        self.backend.clear().await
    }

    /// Number of live entries.
    pub async fn size(&self) -> Result<usize> {
        self.backend.size().await
    }

    /// Drops expired entries, returning how many were removed.
    pub async fn purge_expired(&self) -> Result<usize> {
        self.backend.purge_expired().await
    }

    /// Name of the configured backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}
