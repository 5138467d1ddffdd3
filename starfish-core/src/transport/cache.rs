//! In-memory response cache with a freshness window.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::RwLock;

pub const DEFAULT_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
struct CachedBody {
    body: Arc<str>,
    stored_at: Instant,
}

/// Response bodies keyed by request URL.
///
/// Clones share the same store. Concurrent misses for the same key may both
/// reach upstream; the later write wins.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, CachedBody>>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Fresh body for `key`, evicting it if it has gone stale.
    pub fn get(&self, key: &str) -> Option<Arc<str>> {
        if !self.is_enabled() {
            return None;
        }

        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                    return Some(Arc::clone(&entry.body));
                }
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|entry| entry.stored_at.elapsed() >= self.ttl) {
            entries.remove(key);
        }
        None
    }

    pub fn insert(&self, key: impl Into<String>, body: impl Into<Arc<str>>) {
        self.insert_at(key.into(), body.into(), Instant::now());
    }

    fn insert_at(&self, key: String, body: Arc<str>, stored_at: Instant) {
        if !self.is_enabled() {
            return;
        }

        let ttl = self.ttl;
        let mut entries = self.entries.write();
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        entries.insert(key, CachedBody { body, stored_at });
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS))
    }
}
