//! Cache Key Module
//!
//! Derives deterministic cache keys from request descriptions.
//!
//! The request is serialized to JSON, object keys are sorted recursively so
//! that map iteration order never leaks into the key, and the canonical bytes
//! are hashed with SHA-256. Keys are 64 lowercase hex characters, safe as file
//! names without further escaping.
//!
//! Collisions are not detected. Two distinct requests sharing a 256-bit digest
//! is treated as negligible, and a hit is trusted as the answer for the request.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::Result;

// == Cache Key ==
/// Opaque, fixed-length key produced by [`derive_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Derive Key ==
/// Derives the cache key for a request description.
///
/// Pure: identical logical requests always produce the same key, across
/// processes and regardless of field or map ordering.
pub fn derive_key<R: Serialize + ?Sized>(request: &R) -> Result<CacheKey> {
    let canonical = canonicalize(serde_json::to_value(request)?);
    let bytes = serde_json::to_vec(&canonical)?;
    Ok(CacheKey(hex::encode(Sha256::digest(&bytes))))
}

/// Rebuilds every object with its keys in sorted order.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
