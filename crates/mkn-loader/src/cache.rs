//! Cache collaborators for serialized index payloads.
//!
//! The loader only needs an opaque `get`/`set` blob store keyed by string.
//! Two backends are provided: a process-local map and a directory of JSON
//! envelopes that survives restarts.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::loader::content_hash;
use crate::types::{MknError, MknResult};

/// Key to blob store with per-entry TTL.
///
/// Implementations must treat unreadable or expired entries as misses.
pub trait IndexCache: Send + Sync {
    /// Returns the cached value, or `None` on a miss.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores a value for `ttl`.
    fn set(&self, key: &str, value: &str, ttl: Duration) -> MknResult<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// MEMORY
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// Process-local cache. Entries expire lazily on read.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IndexCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> MknResult<()> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| MknError::Config {
                reason: format!("cache TTL out of range: {:?}", ttl),
            })?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                key.to_string(),
                MemoryEntry {
                    value: value.to_string(),
                    expires_at,
                },
            );
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Serialize, Deserialize, Debug)]
struct CacheEnvelope {
    created_ms: u64,
    ttl_ms: u64,
    data: String,
}

/// Directory-backed cache, one JSON envelope per key.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Creates a cache rooted at `dir`. The directory is created on first
    /// write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for `key`: a readable form of the key plus its hash, so keys
    /// that differ only in mapped characters never share a file.
    fn entry_path(&self, key: &str) -> PathBuf {
        let readable: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{readable}-{}.json", content_hash(key)))
    }
}

impl IndexCache for FileCache {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.entry_path(key);
        let bytes = fs::read(&path).ok()?;

        let envelope: CacheEnvelope = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!("Index cache entry corrupted {}: {err}", path.display());
                return None;
            }
        };

        let age = unix_ms_now().saturating_sub(envelope.created_ms);
        if age > envelope.ttl_ms {
            debug!(key, age_ms = age, "Index cache entry expired");
            return None;
        }
        Some(envelope.data)
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> MknResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            MknError::unavailable(format!(
                "cannot create cache dir {}: {e}",
                self.dir.display()
            ))
        })?;

        let envelope = CacheEnvelope {
            created_ms: unix_ms_now(),
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            data: value.to_string(),
        };
        let bytes = serde_json::to_vec(&envelope)?;

        // Readers never see a partially written entry
        let path = self.entry_path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
