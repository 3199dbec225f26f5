//! Month-scoped transaction cache

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::models::Transaction;

/// Cached payload: one month's transactions
pub type CachedTransactions = Arc<Vec<Transaction>>;

/// Cache reference type
pub type CacheRef = Arc<dyn TransactionCache>;

/// Key/value cache for month transaction lists
///
/// Keys come from [`crate::Period::cache_key`].
pub trait TransactionCache: Send + Sync {
    /// Fresh entry for `key`, if any
    fn get(&self, key: &str) -> Option<CachedTransactions>;

    fn put(&self, key: &str, transactions: CachedTransactions);

    /// Drop one key
    fn invalidate(&self, key: &str);

    /// Drop every key
    fn clear(&self);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: CachedTransactions,
    stored_at: Instant,
}

/// In-process cache whose entries expire after a fixed lifetime
#[derive(Debug)]
pub struct TtlCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TransactionCache for TtlCache {
    fn get(&self, key: &str) -> Option<CachedTransactions> {
        {
            let entries = self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner());
            match entries.get(key) {
                Some(entry) if entry.stored_at.elapsed() < self.ttl => return Some(Arc::clone(&entry.payload)),
                Some(_) => {}
                None => return None,
            }
        }

        // a put may have refreshed the key between the two locks
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if entries.get(key).is_some_and(|entry| entry.stored_at.elapsed() >= self.ttl) {
            entries.remove(key);
            log::debug!("Cache entry {} expired", key);
        }
        None
    }

    fn put(&self, key: &str, transactions: CachedTransactions) {
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        // sweep every expired month, not only this key
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        entries.insert(
            key.to_string(),
            CacheEntry {
                payload: transactions,
                stored_at: Instant::now(),
            },
        );
    }

    fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if entries.remove(key).is_some() {
            log::debug!("Cache entry {} invalidated", key);
        }
    }

    fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        log::debug!("Cache cleared ({} entries)", entries.len());
        entries.clear();
    }
}

/// Cache that stores nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl TransactionCache for NoopCache {
    fn get(&self, _key: &str) -> Option<CachedTransactions> {
        None
    }

    fn put(&self, _key: &str, _transactions: CachedTransactions) {}

    fn invalidate(&self, _key: &str) {}

    fn clear(&self) {}
}
