//! Client Module
//!
//! Remote-call client that follows the cache-aside protocol around
//! [`ResponseCache`](crate::cache::ResponseCache).

mod llm;
mod provider;

pub use llm::LlmClient;
pub use provider::LlmProvider;
