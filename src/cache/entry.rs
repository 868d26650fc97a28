//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A stored payload with its creation time and optional TTL.
///
/// Entries are never mutated after creation; overwriting a key replaces the
/// whole entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The stored value
    pub value: T,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Time to live, None = no expiration
    pub ttl: Option<Duration>,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry stamped at `now`.
    pub fn new(value: T, now: DateTime<Utc>, ttl: Option<Duration>) -> Self {
        Self {
            value,
            created_at: now,
            ttl,
        }
    }

    // == Expires At ==
    /// Returns the instant the entry stops being live, or None if it never
    /// expires.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        expiry(self.created_at, self.ttl)
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is live only while `now` is strictly
    /// before `created_at + ttl`, so it is expired at exactly that instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        is_expired(self.created_at, self.ttl, now)
    }

    // == Time To Live ==
    /// Returns remaining TTL at `now`, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.ttl?;
        let remaining = match self.expires_at() {
            Some(expires) => (expires - now).to_std().unwrap_or(Duration::ZERO),
            // TTL too large to represent as a timestamp
            None => Duration::MAX,
        };
        Some(remaining)
    }
}

// == Utility Functions ==
/// Expiry instant for an entry created at `created_at` with `ttl`.
///
/// A TTL too large to represent is treated as no expiry.
pub(crate) fn expiry(created_at: DateTime<Utc>, ttl: Option<Duration>) -> Option<DateTime<Utc>> {
    let ttl = chrono::Duration::from_std(ttl?).ok()?;
    created_at.checked_add_signed(ttl)
}

/// Expiry check shared by full entries and the metadata-only view used when
/// sweeping files.
pub(crate) fn is_expired(
    created_at: DateTime<Utc>,
    ttl: Option<Duration>,
    now: DateTime<Utc>,
) -> bool {
    match expiry(created_at, ttl) {
        Some(expires) => now >= expires,
        None => false,
    }
}
