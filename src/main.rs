//! LLM Cache - maintenance tool for a response cache
//!
//! Usage: `llm_cache [size|clear|purge|sweep]` (default: size).
//! Configuration comes from the `LLM_CACHE_*` environment variables.

use anyhow::{bail, Context};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use llm_cache::models::CachedResponse;
use llm_cache::{spawn_sweep_task, CacheConfig, ResponseCache};

/// Entry point for the cache maintenance tool.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the cache facade over the configured backend
/// 4. Run the requested command
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "llm_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env().context("Failed to load cache configuration")?;
    info!(
        "Configuration loaded: backend={}, dir={}, default_ttl={}s, max_entry_size={}",
        config.backend,
        config.cache_dir.display(),
        config.default_ttl_secs,
        config.max_entry_size
    );

    let cache = ResponseCache::<CachedResponse>::from_config(&config)
        .context("Failed to open cache")?;

    let command = std::env::args().nth(1).unwrap_or_else(|| "size".to_string());
    match command.as_str() {
        "size" => {
            let size = cache.size().await.context("Failed to count entries")?;
            println!("{}", size);
        }
        "clear" => {
            cache.clear().await.context("Failed to clear cache")?;
            info!("Cache cleared");
        }
        "purge" => {
            let removed = cache.purge_expired().await.context("Failed to purge cache")?;
            info!("Removed {} expired entries", removed);
        }
        "sweep" => {
            let Some(interval) = config.sweep_interval() else {
                bail!("LLM_CACHE_SWEEP_INTERVAL is 0, nothing to run");
            };
            let handle = spawn_sweep_task(cache, interval);
            shutdown_signal().await;
            handle.abort();
            warn!("Sweep task aborted");
        }
        other => bail!("Unknown command '{}', expected size, clear, purge or sweep", other),
    }

    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}
