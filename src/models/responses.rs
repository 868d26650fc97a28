//! Response payloads returned by remote LLM calls
//!
//! These are what the cache stores.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Token accounting reported by a provider.
pub type Usage = BTreeMap<String, u32>;

/// Response from a chat completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl LlmResponse {
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            usage: None,
            finish_reason: None,
        }
    }
}

/// Response from an embedding request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub embeddings: Vec<Vec<f32>>,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl EmbeddingResponse {
    pub fn new(embeddings: Vec<Vec<f32>>, model: impl Into<String>) -> Self {
        Self {
            embeddings,
            model: model.into(),
            usage: None,
        }
    }
}

/// Any response the client caches.
///
/// Serialized with a `type` tag so a stored record restores the right variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CachedResponse {
    Chat(LlmResponse),
    Embedding(EmbeddingResponse),
}

impl From<LlmResponse> for CachedResponse {
    fn from(response: LlmResponse) -> Self {
        CachedResponse::Chat(response)
    }
}

impl From<EmbeddingResponse> for CachedResponse {
    fn from(response: EmbeddingResponse) -> Self {
        CachedResponse::Embedding(response)
    }
}
