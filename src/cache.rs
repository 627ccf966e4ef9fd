//! # Upstream Payload Cache
//!
//! Weather and tide payloads change slowly, so the aggregator keeps recent
//! responses keyed by coordinate instead of asking the upstream again on every
//! request. The store is an injected [`Cache`] rather than ambient state, which
//! keeps the aggregator testable and lets the binary choose a backend:
//!
//! - [`MemoryCache`]: process-local map, cleared on exit
//! - [`FileCache`]: one JSON file per key under a directory (e.g. `/tmp`), so
//!   short-lived CLI runs share results
//!
//! Cache failures are never fatal. Readers treat a broken entry as a miss and
//! writers log and move on.

use crate::config::{CacheBackend, CacheConfig};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use std::{fs, io};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised by cache backends.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache file operations failed (permissions, disk space)
    #[error("cache IO: {0}")]
    Io(#[from] io::Error),

    /// Stored entry could not be encoded or decoded
    #[error("cache entry corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("cache lock poisoned")]
    Poisoned,
}

/// Key-value store with per-entry expiry.
pub trait Cache: Send + Sync {
    /// Fetch a live entry. Expired entries are reported as `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Store `value` under `key` for `ttl`.
    fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError>;
}

/// Read and decode a cached entry; any failure is a miss.
pub fn load<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Option<T> {
    match cache.get(key) {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(data) => {
                debug!(key, "cache hit");
                Some(data)
            }
            Err(e) => {
                warn!(key, error = %e, "cached entry has unexpected shape, ignoring");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(key, error = %e, "cache read failed");
            None
        }
    }
}

/// Encode and store an entry; failures are logged, not returned.
pub fn store<T: Serialize>(cache: &dyn Cache, key: &str, data: &T, ttl: Duration) {
    let result = serde_json::to_value(data)
        .map_err(CacheError::from)
        .and_then(|value| cache.set(key, value, ttl));

    if let Err(e) = result {
        warn!(key, error = %e, "cache write failed");
    }
}

/// Build the backend selected in the configuration.
pub fn from_config(config: &CacheConfig) -> Option<Arc<dyn Cache>> {
    match config.backend {
        CacheBackend::Memory => Some(Arc::new(MemoryCache::new())),
        CacheBackend::File => Some(Arc::new(FileCache::new(&config.dir))),
        CacheBackend::None => None,
    }
}

/// In-process cache guarded by a mutex.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (Instant, Value)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including ones that have expired but were not read since.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        match entries.get(key) {
            Some((expires_at, value)) if Instant::now() < *expires_at => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.insert(key.to_string(), (Instant::now() + ttl, value));
        Ok(())
    }
}

/// On-disk envelope carrying the expiry next to the payload.
#[derive(Serialize, Deserialize)]
struct FileEntry {
    expires_at: DateTime<Utc>,
    data: Value,
}

/// Cache storing one JSON file per key.
///
/// Using a directory under /tmp keeps entries across CLI runs while letting a
/// reboot clear them.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        FileCache {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl Cache for FileCache {
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let data = match fs::read(self.path_for(key)) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: FileEntry = serde_json::from_slice(&data)?;
        if Utc::now() >= entry.expires_at {
            return Ok(None);
        }
        Ok(Some(entry.data))
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let entry = FileEntry {
            expires_at,
            data: value,
        };

        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), serde_json::to_vec(&entry)?)?;
        Ok(())
    }
}
