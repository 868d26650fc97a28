//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{DEFAULT_MAX_ENTRY_SIZE, DEFAULT_TTL_SECS};
use crate::error::{CacheError, Result};

// == Backend Kind ==
/// Which storage the cache facade is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// In-process map, lost on exit
    #[default]
    Volatile,
    /// One file per entry under `cache_dir`
    Durable,
}

impl FromStr for BackendKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "volatile" => Ok(BackendKind::Volatile),
            "file" | "durable" => Ok(BackendKind::Durable),
            other => Err(CacheError::InvalidConfig(format!(
                "Unknown cache backend '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Volatile => f.write_str("volatile"),
            BackendKind::Durable => f.write_str("durable"),
        }
    }
}

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Whether clients should use the cache at all
    pub enabled: bool,
    /// Storage backend
    pub backend: BackendKind,
    /// Root directory of the durable backend
    pub cache_dir: PathBuf,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl_secs: u64,
    /// Maximum serialized entry size in bytes (durable backend)
    pub max_entry_size: usize,
    /// Background sweep interval in seconds, 0 disables the sweep
    pub sweep_interval_secs: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `LLM_CACHE_ENABLED` - Enable caching (default: true)
    /// - `LLM_CACHE_BACKEND` - `memory` or `file` (default: memory)
    /// - `LLM_CACHE_DIR` - Durable cache directory (default: .llm_cache)
    /// - `LLM_CACHE_TTL` - Default TTL in seconds (default: 3600)
    /// - `LLM_CACHE_MAX_ENTRY_SIZE` - Max entry size in bytes (default: 10 MB)
    /// - `LLM_CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds (default: 60)
    ///
    /// Unparseable values fall back to the default, except an unknown backend
    /// name which is an error.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let backend = match env::var("LLM_CACHE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.backend,
        };

        Ok(Self {
            enabled: env::var("LLM_CACHE_ENABLED")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.enabled),
            backend,
            cache_dir: env::var("LLM_CACHE_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            default_ttl_secs: env::var("LLM_CACHE_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl_secs),
            max_entry_size: env::var("LLM_CACHE_MAX_ENTRY_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entry_size),
            sweep_interval_secs: env::var("LLM_CACHE_SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sweep_interval_secs),
        })
    }

    /// Checks that the TTL and size limit are positive.
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl_secs == 0 {
            return Err(CacheError::InvalidConfig(
                "Default TTL must be positive".to_string(),
            ));
        }
        if self.max_entry_size == 0 {
            return Err(CacheError::InvalidConfig(
                "Max entry size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Default TTL as a Duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// Sweep interval, or None when the sweep is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: BackendKind::Volatile,
            cache_dir: PathBuf::from(".llm_cache"),
            default_ttl_secs: DEFAULT_TTL_SECS,
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
            sweep_interval_secs: 60,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
