//! LLM Client Module
//!
//! Cache-aside wrapper around an [`LlmProvider`].
//!
//! Every call derives a key from the request, answers from the cache on a
//! hit, and otherwise calls the provider and stores its successful response.
//! Cache failures are logged and counted, then treated as a miss (on lookup)
//! or ignored (on store); they never fail the call.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{derive_key, CacheCounters, CacheKey, CacheStats, ResponseCache};
use crate::client::LlmProvider;
use crate::config::CacheConfig;
use crate::error::{CacheError, ClientError};
use crate::models::{
    CachedResponse, ChatMessage, ChatRequest, EmbeddingRequest, EmbeddingResponse, LlmResponse,
    ModelConfig, RequestDescription,
};

// == LLM Client ==
/// Client for chat completions and embeddings with optional response caching.
pub struct LlmClient {
    /// Performs the remote calls
    provider: Arc<dyn LlmProvider>,
    /// Response cache, None when caching is disabled
    cache: Option<ResponseCache<CachedResponse>>,
    /// TTL passed on every store, None = backend default
    cache_ttl: Option<Duration>,
    /// Hit/miss/store/error counters
    counters: Arc<CacheCounters>,
}

impl LlmClient {
    // == Constructors ==
    /// Creates a client without a cache.
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            cache: None,
            cache_ttl: None,
            counters: Arc::new(CacheCounters::new()),
        }
    }

    /// Creates a client whose cache is built from `config`, or no cache if
    /// caching is disabled there.
    pub fn from_config(
        provider: Arc<dyn LlmProvider>,
        config: &CacheConfig,
    ) -> Result<Self, CacheError> {
        let client = Self::new(provider);
        if !config.enabled {
            return Ok(client);
        }
        Ok(client.with_cache(ResponseCache::from_config(config)?))
    }

    /// Attaches a response cache.
    pub fn with_cache(mut self, cache: ResponseCache<CachedResponse>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Overrides the backend's default TTL for responses this client stores.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Returns the attached cache, if any.
    pub fn cache(&self) -> Option<&ResponseCache<CachedResponse>> {
        self.cache.as_ref()
    }

    /// Snapshot of cache counters for this client.
    pub fn cache_stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    // == Chat Completion ==
    /// Answers a chat request, from cache when possible.
    pub async fn chat_completion(&self, request: &ChatRequest) -> Result<LlmResponse, ClientError> {
        if request.messages.is_empty() {
            return Err(ClientError::EmptyMessages);
        }

        let key = self.cache_key(RequestDescription::Chat(request));
        let cached = self
            .lookup(key.as_ref(), |cached| match cached {
                CachedResponse::Chat(response) => Some(response),
                _ => None,
            })
            .await;
        if let Some(response) = cached {
            return Ok(response);
        }

        self.ensure_available().await?;
        let response = self.provider.chat_completion(request).await?;
        self.store(key.as_ref(), CachedResponse::Chat(response.clone()))
            .await;
        Ok(response)
    }

    // == Generate Text ==
    /// Single-prompt convenience over [`chat_completion`](Self::chat_completion).
    pub async fn generate_text(
        &self,
        prompt: &str,
        config: ModelConfig,
    ) -> Result<LlmResponse, ClientError> {
        if prompt.trim().is_empty() {
            return Err(ClientError::EmptyPrompt);
        }
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)], config);
        self.chat_completion(&request).await
    }

    // == Embeddings ==
    /// Computes embeddings, from cache when possible.
    pub async fn embeddings(
        &self,
        request: &EmbeddingRequest,
    ) -> Result<EmbeddingResponse, ClientError> {
        if request.texts.is_empty() {
            return Err(ClientError::EmptyTexts);
        }

        let key = self.cache_key(RequestDescription::Embedding(request));
        let cached = self
            .lookup(key.as_ref(), |cached| match cached {
                CachedResponse::Embedding(response) => Some(response),
                _ => None,
            })
            .await;
        if let Some(response) = cached {
            return Ok(response);
        }

        self.ensure_available().await?;
        let response = self.provider.embeddings(request).await?;
        self.store(key.as_ref(), CachedResponse::Embedding(response.clone()))
            .await;
        Ok(response)
    }

    // == Cache-aside Helpers ==
    async fn ensure_available(&self) -> Result<(), ClientError> {
        if self.provider.is_available().await {
            Ok(())
        } else {
            Err(ClientError::ProviderUnavailable)
        }
    }

    /// Key for a request, or None if there is no cache or the request cannot
    /// be hashed (then it is simply not cached).
    fn cache_key(&self, description: RequestDescription<'_>) -> Option<CacheKey> {
        self.cache.as_ref()?;
        match derive_key(&description) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(error = %e, "Failed to derive cache key, bypassing cache");
                self.counters.record_error();
                None
            }
        }
    }

    async fn lookup<R>(
        &self,
        key: Option<&CacheKey>,
        extract: impl FnOnce(CachedResponse) -> Option<R>,
    ) -> Option<R> {
        let (cache, key) = (self.cache.as_ref()?, key?);
        match cache.get(key.as_str()).await {
            Ok(Some(cached)) => match extract(cached) {
                Some(response) => {
                    debug!(%key, "Cache hit");
                    self.counters.record_hit();
                    Some(response)
                }
                None => {
                    debug!(%key, "Cached payload has the wrong kind, ignoring");
                    self.counters.record_miss();
                    None
                }
            },
            Ok(None) => {
                debug!(%key, "Cache miss");
                self.counters.record_miss();
                None
            }
            Err(e) => {
                warn!(%key, error = %e, "Cache lookup failed, calling provider");
                self.counters.record_error();
                self.counters.record_miss();
                None
            }
        }
    }

    async fn store(&self, key: Option<&CacheKey>, response: CachedResponse) {
        let (Some(cache), Some(key)) = (self.cache.as_ref(), key) else {
            return;
        };
        match cache.set(key.as_str(), response, self.cache_ttl).await {
            Ok(()) => self.counters.record_store(),
            Err(e) => {
                warn!(%key, error = %e, "Failed to cache response");
                self.counters.record_error();
            }
        }
    }
}
