//! Volatile Backend Module
//!
//! In-process HashMap storage with TTL expiration. Nothing survives a restart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::backend::{validate_default_ttl, validate_key, validate_ttl};
use crate::cache::{CacheBackend, CacheEntry, Clock, Payload, SystemClock};
use crate::error::Result;

// == Volatile Backend ==
/// In-memory cache storage.
///
/// A single coarse lock guards the map. Every operation under it is O(1)
/// except the expiry sweep.
#[derive(Debug)]
pub struct VolatileBackend<T> {
    /// Key-value storage
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    /// TTL applied when `set` omits one
    default_ttl: Duration,
    /// Time source for creation stamps and expiry checks
    clock: Arc<dyn Clock>,
}

impl<T: Payload> VolatileBackend<T> {
    // == Constructor ==
    /// Creates an empty backend using the system clock.
    pub fn new(default_ttl: Duration) -> Result<Self> {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    /// Creates an empty backend reading time from `clock`.
    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Result<Self> {
        validate_default_ttl(default_ttl)?;
        Ok(Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
            clock,
        })
    }

    /// Returns the TTL applied when `set` omits one.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
        // A panic mid-operation cannot leave a half-built entry in the map
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Cleanup Expired ==
    fn remove_expired(entries: &mut HashMap<String, CacheEntry<T>>, clock: &dyn Clock) -> usize {
        let now = clock.now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }
}

#[async_trait]
impl<T: Payload> CacheBackend<T> for VolatileBackend<T> {
    async fn get(&self, key: &str) -> Result<Option<T>> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            None => return Ok(None),
            Some(entry) => entry.is_expired_at(self.clock.now()),
        };

        if expired {
            debug!(key, "Removing expired entry");
            entries.remove(key);
            return Ok(None);
        }

        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: T, ttl: Option<Duration>) -> Result<()> {
        validate_key(key)?;
        validate_ttl(ttl)?;

        let entry = CacheEntry::new(
            value,
            self.clock.now(),
            Some(ttl.unwrap_or(self.default_ttl)),
        );
        self.lock().insert(key.to_string(), entry);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.lock().clear();
        Ok(())
    }

    async fn size(&self) -> Result<usize> {
        let mut entries = self.lock();
        Self::remove_expired(&mut entries, self.clock.as_ref());
        Ok(entries.len())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let mut entries = self.lock();
        Ok(Self::remove_expired(&mut entries, self.clock.as_ref()))
    }

    fn name(&self) -> &'static str {
        "volatile"
    }
}
