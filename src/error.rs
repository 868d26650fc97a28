//! Error types for the response cache
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
///
/// A cache miss is not an error (`Ok(None)`), and neither is a corrupted
/// persisted entry: backends recover from both locally.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is empty or otherwise unusable
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// TTL is zero
    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),

    /// Serialized entry exceeds the configured maximum
    #[error("Entry too large: {size} bytes exceeds limit of {max} bytes")]
    EntryTooLarge { size: usize, max: usize },

    /// Backend configuration rejected at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Storage location cannot be read or written
    #[error("Permission denied: {}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any other I/O failure unrelated to entry content
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Payload could not be serialized, or would not read back as stored
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal failure (e.g. a blocking task panicked)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Wraps an I/O error, splitting out permission problems.
    pub fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            CacheError::PermissionDenied {
                path: path.to_path_buf(),
                source,
            }
        } else {
            CacheError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// True for errors caused by the caller's input, rejected before any write.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CacheError::InvalidKey(_)
                | CacheError::InvalidTtl(_)
                | CacheError::EntryTooLarge { .. }
                | CacheError::InvalidConfig(_)
                | CacheError::Serialization(_)
        )
    }

    /// True for environment failures (permissions, disk, I/O) that callers
    /// should log or alert on.
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            CacheError::PermissionDenied { .. } | CacheError::Io { .. } | CacheError::Internal(_)
        )
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

// == Client Error Enum ==
/// Errors returned by [`LlmClient`](crate::client::LlmClient).
///
/// Cache failures never show up here; the client recovers from them.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Chat request without messages
    #[error("Messages cannot be empty")]
    EmptyMessages,

    /// Blank text prompt
    #[error("Prompt cannot be empty")]
    EmptyPrompt,

    /// Embedding request without texts
    #[error("Texts cannot be empty")]
    EmptyTexts,

    /// Provider reported itself unavailable
    #[error("Provider is not available")]
    ProviderUnavailable,

    /// The remote call failed
    #[error("Provider error: {0}")]
    Provider(String),
}
