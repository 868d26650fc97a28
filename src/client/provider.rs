//! Provider Module
//!
//! The remote side of the client: whatever actually performs the expensive
//! call.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::models::{ChatRequest, EmbeddingRequest, EmbeddingResponse, LlmResponse};

/// An LLM backend that answers chat and embedding requests.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Runs a chat completion.
    async fn chat_completion(&self, request: &ChatRequest) -> Result<LlmResponse, ClientError>;

    /// Computes embeddings for each text in the request.
    async fn embeddings(&self, request: &EmbeddingRequest)
        -> Result<EmbeddingResponse, ClientError>;

    /// Whether the provider can currently take requests.
    async fn is_available(&self) -> bool {
        true
    }
}
