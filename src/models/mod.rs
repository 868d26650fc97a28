//! Request and response models for remote LLM calls
//!
//! Requests are hashed into cache keys; responses are the cached payloads.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    ChatMessage, ChatRequest, EmbeddingConfig, EmbeddingRequest, EncodingFormat, MessageRole,
    ModelConfig, RequestDescription,
};
pub use responses::{CachedResponse, EmbeddingResponse, LlmResponse, Usage};
