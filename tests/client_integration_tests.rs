//! Integration Tests for the Cache-aside Client
//!
//! Drives `LlmClient` with a scripted provider over real cache backends.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use llm_cache::cache::{DurableBackend, ManualClock, ResponseCache};
use llm_cache::models::{
    CachedResponse, ChatMessage, ChatRequest, EmbeddingConfig, EmbeddingRequest,
    EmbeddingResponse, LlmResponse, ModelConfig,
};
use llm_cache::{BackendKind, CacheConfig, ClientError, LlmClient, LlmProvider};
use tempfile::TempDir;

// == Scripted Provider ==

/// Counts calls per kind and can be switched off mid-test.
#[derive(Default)]
struct ScriptedProvider {
    chat_calls: AtomicUsize,
    embedding_calls: AtomicUsize,
    down: AtomicBool,
}

impl ScriptedProvider {
    fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    fn embedding_calls(&self) -> usize {
        self.embedding_calls.load(Ordering::SeqCst)
    }

    fn go_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat_completion(&self, request: &ChatRequest) -> Result<LlmResponse, ClientError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        let last = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(LlmResponse::new(
            format!("echo: {}", last),
            request.config.model_name.clone(),
        ))
    }

    async fn embeddings(
        &self,
        request: &EmbeddingRequest,
    ) -> Result<EmbeddingResponse, ClientError> {
        self.embedding_calls.fetch_add(1, Ordering::SeqCst);
        Ok(EmbeddingResponse::new(
            request
                .texts
                .iter()
                .map(|t| vec![t.len() as f32, 1.0])
                .collect(),
            request.config.model_name.clone(),
        ))
    }

    async fn is_available(&self) -> bool {
        !self.down.load(Ordering::SeqCst)
    }
}

// == Helper Functions ==

fn durable_client(dir: &TempDir) -> (LlmClient, Arc<ScriptedProvider>, Arc<ManualClock>) {
    let provider = Arc::new(ScriptedProvider::default());
    let clock = Arc::new(ManualClock::default());
    let backend = DurableBackend::with_clock(
        dir.path(),
        Duration::from_secs(3600),
        1024 * 1024,
        clock.clone(),
    )
    .unwrap();
    let client = LlmClient::new(provider.clone()).with_cache(ResponseCache::new(backend));
    (client, provider, clock)
}

fn chat(prompt: &str) -> ChatRequest {
    ChatRequest::new(
        vec![ChatMessage::system("be brief"), ChatMessage::user(prompt)],
        ModelConfig::new("gpt-4").with_temperature(0.0),
    )
}

// == Cache-aside Behavior ==

#[tokio::test]
async fn test_repeated_chat_served_from_durable_cache() {
    let dir = TempDir::new().unwrap();
    let (client, provider, _) = durable_client(&dir);

    let first = client.chat_completion(&chat("capital of France?")).await.unwrap();
    let second = client.chat_completion(&chat("capital of France?")).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(provider.chat_calls(), 1);

    let stats = client.cache_stats();
    assert_eq!((stats.hits, stats.misses, stats.stores), (1, 1, 1));
}

#[tokio::test]
async fn test_cache_survives_client_restart() {
    let dir = TempDir::new().unwrap();
    let request = chat("persist me");

    let (client, provider, _) = durable_client(&dir);
    let original = client.chat_completion(&request).await.unwrap();
    assert_eq!(provider.chat_calls(), 1);
    drop(client);

    let (restarted, fresh_provider, _) = durable_client(&dir);
    let replayed = restarted.chat_completion(&request).await.unwrap();

    assert_eq!(replayed, original);
    assert_eq!(fresh_provider.chat_calls(), 0);
}

#[tokio::test]
async fn test_expired_response_refetched() {
    let dir = TempDir::new().unwrap();
    let (client, provider, clock) = durable_client(&dir);
    let request = chat("what time is it?");

    client.chat_completion(&request).await.unwrap();
    clock.advance(Duration::from_secs(3601));
    client.chat_completion(&request).await.unwrap();

    assert_eq!(provider.chat_calls(), 2);
}

#[tokio::test]
async fn test_client_ttl_overrides_backend_default() {
    let dir = TempDir::new().unwrap();
    let (client, provider, clock) = durable_client(&dir);
    let client = client.with_cache_ttl(Duration::from_secs(10));
    let request = chat("short lived");

    client.chat_completion(&request).await.unwrap();
    clock.advance(Duration::from_secs(11));
    client.chat_completion(&request).await.unwrap();

    assert_eq!(provider.chat_calls(), 2);
}

#[tokio::test]
async fn test_different_requests_do_not_share_entries() {
    let dir = TempDir::new().unwrap();
    let (client, provider, _) = durable_client(&dir);

    let a = client.chat_completion(&chat("one")).await.unwrap();
    let b = client.chat_completion(&chat("two")).await.unwrap();

    assert_ne!(a.content, b.content);
    assert_eq!(provider.chat_calls(), 2);
    assert_eq!(client.cache().unwrap().size().await.unwrap(), 2);
}

#[tokio::test]
async fn test_embeddings_cached_separately_from_chat() {
    let dir = TempDir::new().unwrap();
    let (client, provider, _) = durable_client(&dir);
    let request = EmbeddingRequest::new(
        vec!["alpha".to_string(), "beta".to_string()],
        EmbeddingConfig::new("embed-small"),
    );

    let first = client.embeddings(&request).await.unwrap();
    let second = client.embeddings(&request).await.unwrap();
    client.chat_completion(&chat("alpha")).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.embeddings.len(), 2);
    assert_eq!(provider.embedding_calls(), 1);
    assert_eq!(provider.chat_calls(), 1);
}

#[tokio::test]
async fn test_hit_served_while_provider_down() {
    let dir = TempDir::new().unwrap();
    let (client, provider, _) = durable_client(&dir);
    let request = chat("cached answer");

    client.chat_completion(&request).await.unwrap();
    provider.go_down();

    assert!(client.chat_completion(&request).await.is_ok());
    assert!(matches!(
        client.chat_completion(&chat("uncached")).await,
        Err(ClientError::ProviderUnavailable)
    ));
}

#[tokio::test]
async fn test_corrupted_entry_falls_back_to_provider() {
    let dir = TempDir::new().unwrap();
    let (client, provider, _) = durable_client(&dir);
    let request = chat("fragile");

    client.chat_completion(&request).await.unwrap();
    for item in std::fs::read_dir(dir.path()).unwrap() {
        std::fs::write(item.unwrap().path(), b"{ not json").unwrap();
    }

    let response = client.chat_completion(&request).await.unwrap();

    assert_eq!(response.content, "echo: fragile");
    assert_eq!(provider.chat_calls(), 2);
    // The corrupted record was replaced by a fresh one
    assert_eq!(client.cache().unwrap().size().await.unwrap(), 1);
    client.chat_completion(&request).await.unwrap();
    assert_eq!(provider.chat_calls(), 2);
}

#[tokio::test]
async fn test_wrong_payload_kind_treated_as_miss() {
    let dir = TempDir::new().unwrap();
    let (client, provider, _) = durable_client(&dir);
    let request = chat("mislabeled");

    // Prime the slot for a chat request with an embedding payload
    let key = llm_cache::derive_key(&llm_cache::models::RequestDescription::Chat(&request))
        .unwrap();
    client
        .cache()
        .unwrap()
        .set(
            key.as_str(),
            CachedResponse::from(EmbeddingResponse::new(vec![vec![0.0]], "embed")),
            None,
        )
        .await
        .unwrap();

    let response = client.chat_completion(&request).await.unwrap();

    assert_eq!(response.content, "echo: mislabeled");
    assert_eq!(provider.chat_calls(), 1);
}

// == Configuration ==

#[tokio::test]
async fn test_disabled_config_bypasses_cache() {
    let provider = Arc::new(ScriptedProvider::default());
    let config = CacheConfig {
        enabled: false,
        ..CacheConfig::default()
    };
    let client = LlmClient::from_config(provider.clone(), &config).unwrap();

    client.chat_completion(&chat("hi")).await.unwrap();
    client.chat_completion(&chat("hi")).await.unwrap();

    assert!(client.cache().is_none());
    assert_eq!(provider.chat_calls(), 2);
}

#[tokio::test]
async fn test_durable_config_builds_file_cache() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::default());
    let config = CacheConfig {
        enabled: true,
        backend: BackendKind::Durable,
        cache_dir: dir.path().join("responses"),
        ..CacheConfig::default()
    };
    let client = LlmClient::from_config(provider.clone(), &config).unwrap();

    client.chat_completion(&chat("hi")).await.unwrap();

    assert_eq!(client.cache().unwrap().backend_name(), "durable");
    assert_eq!(
        std::fs::read_dir(dir.path().join("responses")).unwrap().count(),
        1
    );
}

#[tokio::test]
async fn test_empty_requests_rejected_before_cache() {
    let dir = TempDir::new().unwrap();
    let (client, provider, _) = durable_client(&dir);

    let empty_chat = ChatRequest::new(vec![], ModelConfig::new("gpt-4"));
    let empty_embed = EmbeddingRequest::new(vec![], EmbeddingConfig::new("embed-small"));

    assert!(matches!(
        client.chat_completion(&empty_chat).await,
        Err(ClientError::EmptyMessages)
    ));
    assert!(matches!(
        client.embeddings(&empty_embed).await,
        Err(ClientError::EmptyTexts)
    ));
    assert!(matches!(
        client.generate_text("   ", ModelConfig::new("gpt-4")).await,
        Err(ClientError::EmptyPrompt)
    ));
    assert_eq!(provider.chat_calls() + provider.embedding_calls(), 0);
    assert_eq!(client.cache_stats(), Default::default());
}
