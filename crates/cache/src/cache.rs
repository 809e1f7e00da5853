use crate::error::Result;
use crate::record::CacheRecord;
use crate::store::CacheStore;
use content_model::{ContentItem, ItemId, Library};

/// Dirty/clean classification of one item against the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No record, or the live `(size, modified)` fingerprint differs:
    /// the item must be re-read.
    Dirty,
    /// Unchanged; the stored record replays without text I/O.
    Clean,
}

/// The incremental scan cache: per-item dirty detection plus persisted
/// reference and identity-marker storage.
pub struct ScanCache {
    store: Box<dyn CacheStore>,
}

impl ScanCache {
    #[must_use]
    pub fn new(store: Box<dyn CacheStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn classify(&self, item: &ContentItem) -> Classification {
        match self.store.get(&item.canonical_key()) {
            Some(record)
                if record.size == item.size && record.modified_ms == item.modified_ms =>
            {
                Classification::Clean
            }
            _ => Classification::Dirty,
        }
    }

    #[must_use]
    pub fn load(&self, item: &ContentItem) -> Option<CacheRecord> {
        self.store.get(&item.canonical_key())
    }

    /// Persist the scan results of a batch of dirty items.
    pub fn save(&mut self, library: &Library, items: &[ItemId]) {
        for id in items {
            let item = library.item(*id);
            self.store.put(
                &item.canonical_key(),
                CacheRecord {
                    size: item.size,
                    modified_ms: item.modified_ms,
                    references: item.references().to_vec(),
                    internal_id: item.internal_id.clone(),
                    morph_name: item.morph_name.clone(),
                },
            );
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.store.flush()
    }
}
