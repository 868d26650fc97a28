//! Cache Module
//!
//! Response caching with TTL expiration over volatile or file-backed storage.

mod backend;
mod clock;
mod durable;
mod entry;
mod facade;
mod key;
mod stats;
mod volatile;


// Re-export public types
pub use backend::{CacheBackend, Payload};
pub use clock::{Clock, ManualClock, SystemClock};
pub use durable::{sanitize_key, DurableBackend};
pub use entry::CacheEntry;
pub use facade::ResponseCache;
pub use key::{derive_key, CacheKey};
pub use stats::{CacheCounters, CacheStats};
pub use volatile::VolatileBackend;

// == Public Constants ==
/// Default time to live in seconds (1 hour)
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Default maximum serialized entry size in bytes
pub const DEFAULT_MAX_ENTRY_SIZE: usize = 10 * 1024 * 1024; // 10 MB
