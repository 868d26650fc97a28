//! Durable Backend Module
//!
//! File-backed storage: one JSON record per key under a root directory.
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the entry, so readers see either the old record or the new one. The
//! rename is atomic on POSIX filesystems; on platforms where replacing an
//! existing file is not atomic this degrades to best effort. Records are not
//! fsynced, so a crash can lose recent writes; a torn file left behind is
//! handled like any other corrupted record.
//!
//! Unreadable records (bad JSON, truncated files, unknown schema version) are
//! deleted and reported as misses. Permission and other I/O failures are
//! surfaced as errors.

use std::fmt::Write as _;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::cache::backend::{validate_default_ttl, validate_key, validate_ttl};
use crate::cache::entry::is_expired;
use crate::cache::{CacheBackend, CacheEntry, Clock, Payload, SystemClock};
use crate::error::{CacheError, Result};

// == Constants ==
/// Schema version written into every record
const RECORD_VERSION: u32 = 1;

/// Extension of entry files
const ENTRY_EXTENSION: &str = "json";

/// Longest escaped key used verbatim as a file stem
const MAX_FILE_STEM_LEN: usize = 200;

/// Distinguishes temp files of concurrent writers within one process
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

// == On-disk Records ==
#[derive(Serialize)]
struct RecordRef<'a, T> {
    version: u32,
    entry: &'a CacheEntry<T>,
}

#[derive(Deserialize)]
struct Record<T> {
    version: u32,
    entry: CacheEntry<T>,
}

/// Record view that skips over the payload.
#[derive(Deserialize)]
struct RecordMeta {
    version: u32,
    entry: EntryMeta,
}

#[derive(Deserialize)]
struct EntryMeta {
    created_at: DateTime<Utc>,
    ttl: Option<Duration>,
}

/// What a sweep over the directory found.
#[derive(Debug, Default)]
struct Sweep {
    live: usize,
    removed: usize,
}

// == Durable Backend ==
/// File-backed cache storage rooted at a directory.
///
/// The directory may be shared with other instances and processes; records
/// can appear, vanish or become corrupted underneath this backend at any time.
#[derive(Debug)]
pub struct DurableBackend<T> {
    /// Directory holding entry files
    root: PathBuf,
    /// TTL applied when `set` omits one
    default_ttl: Duration,
    /// Upper bound on a serialized record, in bytes
    max_entry_size: usize,
    /// Time source for creation stamps and expiry checks
    clock: Arc<dyn Clock>,
    _payload: PhantomData<fn() -> T>,
}

impl<T: Payload> DurableBackend<T> {
    // == Constructor ==
    /// Opens (creating if needed) a file cache under `root`.
    ///
    /// Creating the directory is a blocking filesystem call. It runs once, at
    /// startup; later writes recreate a missing root through `tokio::fs`.
    ///
    /// # Arguments
    /// * `root` - Directory for entry files
    /// * `default_ttl` - TTL for entries stored without one
    /// * `max_entry_size` - Largest serialized record accepted, in bytes
    pub fn new(
        root: impl Into<PathBuf>,
        default_ttl: Duration,
        max_entry_size: usize,
    ) -> Result<Self> {
        Self::with_clock(root, default_ttl, max_entry_size, Arc::new(SystemClock))
    }

    /// Same as [`new`](Self::new) with an explicit time source.
    pub fn with_clock(
        root: impl Into<PathBuf>,
        default_ttl: Duration,
        max_entry_size: usize,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        validate_default_ttl(default_ttl)?;
        if max_entry_size == 0 {
            return Err(CacheError::InvalidConfig(
                "Max entry size must be positive".to_string(),
            ));
        }

        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| CacheError::io(&root, e))?;
        info!(root = %root.display(), max_entry_size, "Opened file cache");

        Ok(Self {
            root,
            default_ttl,
            max_entry_size,
            clock,
            _payload: PhantomData,
        })
    }

    /// Returns the cache directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file that holds (or would hold) `key`.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", sanitize_key(key), ENTRY_EXTENSION))
    }

    // == Atomic Write ==
    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = self.root.join(format!(
            ".{}.{}.{}.tmp",
            file_name,
            std::process::id(),
            TEMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        // The root may have been removed out-of-band
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CacheError::io(&self.root, e))?;

        if let Err(e) = fs::write(&temp_path, bytes).await {
            remove_quietly(&temp_path).await;
            return Err(CacheError::io(&temp_path, e));
        }

        if let Err(e) = fs::rename(&temp_path, path).await {
            remove_quietly(&temp_path).await;
            return Err(CacheError::io(path, e));
        }

        Ok(())
    }

    /// Deletes an expired or corrupted record. Failure to do so is logged but
    /// never turns the read into an error.
    async fn discard(&self, path: &Path) -> bool {
        match fs::remove_file(path).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove cache file");
                false
            }
        }
    }

    // == Sweep ==
    /// Walks the directory, dropping expired and corrupted records.
    async fn sweep(&self) -> Result<Sweep> {
        let mut sweep = Sweep::default();
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(sweep),
            Err(e) => return Err(CacheError::io(&self.root, e)),
        };

        let now = self.clock.now();
        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| CacheError::io(&self.root, e))?
        {
            let path = item.path();
            if !is_entry_file(&path) {
                continue;
            }
            match is_regular_file(&item).await {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => return Err(CacheError::io(&path, e)),
            }

            let bytes = match fs::read(&path).await {
                Ok(bytes) => bytes,
                // Removed by someone else since listing
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(CacheError::io(&path, e)),
            };

            let keep = match serde_json::from_slice::<RecordMeta>(&bytes) {
                Ok(meta) if meta.version == RECORD_VERSION => {
                    !is_expired(meta.entry.created_at, meta.entry.ttl, now)
                }
                _ => false,
            };

            if keep {
                sweep.live += 1;
            } else if self.discard(&path).await {
                sweep.removed += 1;
            }
        }

        Ok(sweep)
    }
}

#[async_trait]
impl<T: Payload> CacheBackend<T> for DurableBackend<T> {
    async fn get(&self, key: &str) -> Result<Option<T>> {
        if validate_key(key).is_err() {
            return Ok(None);
        }

        let path = self.entry_path(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(&path, e)),
        };

        let record = match serde_json::from_slice::<Record<T>>(&bytes) {
            Ok(record) if record.version == RECORD_VERSION => record,
            Ok(record) => {
                debug!(
                    path = %path.display(),
                    version = record.version,
                    "Removing record with unknown version"
                );
                self.discard(&path).await;
                return Ok(None);
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Removing corrupted record");
                self.discard(&path).await;
                return Ok(None);
            }
        };

        if record.entry.is_expired_at(self.clock.now()) {
            debug!(path = %path.display(), "Removing expired record");
            self.discard(&path).await;
            return Ok(None);
        }

        Ok(Some(record.entry.value))
    }

    async fn set(&self, key: &str, value: T, ttl: Option<Duration>) -> Result<()> {
        validate_key(key)?;
        validate_ttl(ttl)?;

        let entry = CacheEntry::new(
            value,
            self.clock.now(),
            Some(ttl.unwrap_or(self.default_ttl)),
        );
        let bytes = serde_json::to_vec_pretty(&RecordRef {
            version: RECORD_VERSION,
            entry: &entry,
        })?;

        if bytes.len() > self.max_entry_size {
            return Err(CacheError::EntryTooLarge {
                size: bytes.len(),
                max: self.max_entry_size,
            });
        }

        // Non-finite floats serialize as null and would never read back
        serde_json::from_slice::<Record<T>>(&bytes)?;

        self.write_atomic(&self.entry_path(key), &bytes).await
    }

    async fn clear(&self) -> Result<()> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(CacheError::io(&self.root, e)),
        };

        // Keep going past individual failures, report the first one
        let mut first_error = None;
        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| CacheError::io(&self.root, e))?
        {
            let path = item.path();
            if !is_entry_file(&path) {
                continue;
            }
            match is_regular_file(&item).await {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    first_error.get_or_insert(CacheError::io(&path, e));
                    continue;
                }
            }
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove cache file");
                    first_error.get_or_insert(CacheError::io(&path, e));
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn size(&self) -> Result<usize> {
        Ok(self.sweep().await?.live)
    }

    async fn purge_expired(&self) -> Result<usize> {
        Ok(self.sweep().await?.removed)
    }

    fn name(&self) -> &'static str {
        "durable"
    }
}

// == Key Sanitizing ==
/// Maps a key to a file stem.
///
/// Bytes in `[a-z0-9_-]` are kept and every other byte becomes `%XX`, so
/// distinct keys never share a stem and no stem contains a path separator or
/// starts with a dot. Uppercase letters are escaped too, so stems stay
/// distinct on case-insensitive filesystems. Stems longer than the limit are
/// replaced by `%h` and the key's SHA-256, which cannot clash with an escaped
/// stem since `h` is never a hex digit there.
pub fn sanitize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'_' || byte == b'-' {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{:02X}", byte);
        }
    }

    if out.len() > MAX_FILE_STEM_LEN {
        return format!("%h{}", hex::encode(Sha256::digest(key.as_bytes())));
    }
    out
}

/// Entry files end in `.json`; temp files start with a dot and end in `.tmp`.
fn is_entry_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|name| name.to_str())
        .map_or(true, |name| name.starts_with('.'));
    !hidden && path.extension().and_then(|ext| ext.to_str()) == Some(ENTRY_EXTENSION)
}

/// Directories and other non-files named like entries are left alone. An item
/// removed since the listing counts as not a file.
async fn is_regular_file(item: &fs::DirEntry) -> std::io::Result<bool> {
    match item.file_type().await {
        Ok(kind) => Ok(kind.is_file()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

async fn remove_quietly(path: &Path) {
    let _ = fs::remove_file(path).await;
}
