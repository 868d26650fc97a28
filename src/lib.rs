//! LLM Cache - A response cache for expensive LLM calls
//!
//! Caches chat and embedding responses under keys derived from the request,
//! with TTL expiration over in-memory or file-backed storage.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use cache::{derive_key, CacheKey, ResponseCache};
pub use client::{LlmClient, LlmProvider};
pub use config::{BackendKind, CacheConfig};
pub use error::{CacheError, ClientError};
pub use tasks::spawn_sweep_task;
