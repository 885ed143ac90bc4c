// File: src/core/cache.rs
use crate::config::EngineConfig;
use crate::core::dictionary::DrugDictionary;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared handle to the drug dictionary: built on first use, then handed out
/// as an immutable `Arc` until [`IndexCache::reset`] forces a reload.
///
/// The lock only guards swapping the `Arc`; readers never hold it while
/// using the dictionary.
pub struct IndexCache {
    config: EngineConfig,
    slot: RwLock<Option<Arc<DrugDictionary>>>,
}

impl IndexCache {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            slot: RwLock::new(None),
        }
    }

    pub fn get(&self) -> Arc<DrugDictionary> {
        if let Some(dictionary) = self.slot.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            return Arc::clone(dictionary);
        }

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have loaded it while we waited for the write lock.
        if let Some(dictionary) = slot.as_ref() {
            return Arc::clone(dictionary);
        }
        let dictionary = Arc::new(DrugDictionary::load_cached(&self.config));
        *slot = Some(Arc::clone(&dictionary));
        dictionary
    }

    /// Drops the cached dictionary; the next `get` reloads it from disk.
    /// Handles already given out stay valid.
    pub fn reset(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
