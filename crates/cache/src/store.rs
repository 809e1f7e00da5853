use crate::error::Result;
use crate::record::CacheRecord;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Key-value contract of the persistent cache backend. Keys are the
/// canonical item form: absolute path, plus the in-package local path for
/// entries. Any KV backend satisfies this.
pub trait CacheStore: Send {
    fn get(&self, key: &str) -> Option<CacheRecord>;
    fn put(&mut self, key: &str, record: CacheRecord);
    fn flush(&mut self) -> Result<()>;
}

/// In-memory backend; the unit-test double.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, CacheRecord>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<CacheRecord> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, record: CacheRecord) {
        self.entries.insert(key.to_string(), record);
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedCache {
    schema_version: u32,
    /// Fingerprint of the library root the cache was built for; a cache
    /// file from another root is never replayed.
    library_fingerprint: u64,
    entries: BTreeMap<String, CacheRecord>,
}

/// Schema-versioned JSON document backend, written with write-to-temp and
/// atomic rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    fingerprint: u64,
    entries: BTreeMap<String, CacheRecord>,
    dirty: bool,
}

impl JsonFileStore {
    /// Open (or start) the cache document for a library root. Unreadable,
    /// schema-mismatched, or foreign-root documents start empty; the cache
    /// is always rebuildable.
    #[must_use]
    pub fn open(path: impl AsRef<Path>, library_root: &Path) -> Self {
        let path = path.as_ref().to_path_buf();
        let fingerprint = library_fingerprint(&library_root.display().to_string());

        let entries = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<PersistedCache>(&bytes) {
                Ok(persisted)
                    if persisted.schema_version == CACHE_SCHEMA_VERSION
                        && persisted.library_fingerprint == fingerprint =>
                {
                    persisted.entries
                }
                Ok(_) => {
                    log::warn!(
                        "Discarding cache {}: schema or library root changed",
                        path.display()
                    );
                    BTreeMap::new()
                }
                Err(err) => {
                    log::warn!("Discarding unreadable cache {}: {err}", path.display());
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };

        Self {
            path,
            fingerprint,
            entries,
            dirty: false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<CacheRecord> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, record: CacheRecord) {
        self.entries.insert(key.to_string(), record);
        self.dirty = true;
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let persisted = PersistedCache {
            schema_version: CACHE_SCHEMA_VERSION,
            library_fingerprint: self.fingerprint,
            entries: self.entries.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&persisted)?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        self.dirty = false;
        Ok(())
    }
}

/// Stable 64-bit fingerprint of the library root path.
#[must_use]
pub fn library_fingerprint(root_display: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(root_display.as_bytes());
    let digest = hasher.finalize();
    u64::from_be_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ])
}
