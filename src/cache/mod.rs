//! Explanation cache
//!
//! A bounded key → record store with a single expiry clock for the whole
//! document.
//!
//! # Policy
//!
//! | Event | Effect |
//! |-------|--------|
//! | Lookup hit | Store freshness refreshed (extends every entry) |
//! | Lookup on expired store | Miss |
//! | Insert on expired store | Store cleared first |
//! | Insert over `max_entries` | Smallest key evicted |
//!
//! Storage failures never escape [`CacheStore::lookup`] or
//! [`CacheStore::insert`]: a broken cache behaves like an empty one.

pub mod backend;

pub use backend::{Document, FileBackend, MemoryBackend, StoreBackend};

use crate::config::schema::CacheConfig;
use crate::config::ConfigManager;
use crate::error::CacheError;
use crate::explanation::ExplanationRecord;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Explanation cache over a storage backend
#[derive(Debug)]
pub struct CacheStore<B: StoreBackend = FileBackend> {
    backend: B,
    max_entries: usize,
    expiry: Duration,
}

impl CacheStore<FileBackend> {
    /// Open the on-disk cache described by the config
    pub fn from_config(config: &CacheConfig) -> Self {
        let path = config
            .path
            .clone()
            .unwrap_or_else(ConfigManager::cache_path);
        Self::new(
            FileBackend::new(path),
            config.max_entries,
            Duration::from_secs(config.expiry_secs),
        )
    }
}

impl<B: StoreBackend> CacheStore<B> {
    pub fn new(backend: B, max_entries: usize, expiry: Duration) -> Self {
        Self {
            backend,
            max_entries,
            expiry,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Look up a record. Errors and expiry read as a miss.
    pub fn lookup(&mut self, key: &str) -> Option<ExplanationRecord> {
        match self.try_lookup(key) {
            Ok(found) => found,
            Err(e) => {
                debug!("Cache lookup failed, treating as miss: {}", e);
                None
            }
        }
    }

    /// Insert a record, swallowing storage errors
    pub fn insert(&mut self, key: &str, record: &ExplanationRecord) {
        match self.try_insert(key, record) {
            Ok(Some(evicted)) => debug!("Cache full, evicted '{}'", evicted),
            Ok(None) => {}
            Err(e) => debug!("Failed to write cache, skipping: {}", e),
        }
    }

    /// Look up a record, touching the store on a hit
    pub fn try_lookup(&mut self, key: &str) -> Result<Option<ExplanationRecord>, CacheError> {
        if self.is_expired()? {
            debug!("Cache expired, ignoring stored entries");
            return Ok(None);
        }

        let document = self.backend.load()?;
        let Some(record) = document.get(key).cloned() else {
            debug!("Cache miss for '{}'", key);
            return Ok(None);
        };

        debug!("Cache hit for '{}'", key);
        if let Err(e) = self.backend.touch() {
            debug!("Failed to refresh cache timestamp: {}", e);
        }
        Ok(Some(record))
    }

    /// Insert a record and return the evicted key, if any.
    ///
    /// An expired or unreadable store is replaced by a fresh one.
    pub fn try_insert(
        &mut self,
        key: &str,
        record: &ExplanationRecord,
    ) -> Result<Option<String>, CacheError> {
        let mut document = if self.is_expired().unwrap_or(false) {
            debug!("Cache expired, resetting before insert");
            Document::new()
        } else {
            self.load_or_empty()
        };

        document.insert(key.to_string(), record.clone());

        // Normally at most one pass; more only if max_entries was lowered
        let mut evicted = None;
        while document.len() > self.max_entries {
            match document.pop_first() {
                Some((smallest, _)) => evicted = Some(smallest),
                None => break,
            }
        }

        self.backend.save(&document)?;
        Ok(evicted)
    }

    /// Reset the store to empty
    pub fn clear(&mut self) -> Result<(), CacheError> {
        self.backend.save(&Document::new())
    }

    /// Number of stored entries, ignoring expiry
    pub fn len(&self) -> usize {
        self.load_or_empty().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self) -> Result<bool, CacheError> {
        let Some(modified) = self.backend.last_modified()? else {
            return Ok(false);
        };

        // A timestamp in the future counts as fresh
        Ok(SystemTime::now()
            .duration_since(modified)
            .map(|age| age > self.expiry)
            .unwrap_or(false))
    }

    fn load_or_empty(&self) -> Document {
        self.backend.load().unwrap_or_else(|e| {
            debug!("Cache unreadable, starting empty: {}", e);
            Document::new()
        })
    }
}
