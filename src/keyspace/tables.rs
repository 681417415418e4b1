//! Key and expiry tables of one database
//!
//! Both maps live behind the keyspace's single lock. Every removal goes
//! through `remove`, which drops the key and its expiry entry together, so
//! `expires` never names a key that `keys` does not hold.

use std::collections::HashMap;

use tracing::trace;

use crate::object::Object;

pub(super) struct Tables {
    /// Key → bound object (one owning reference per binding)
    pub(super) keys: HashMap<String, Object>,

    /// Key → absolute expiry instant (seconds since epoch)
    pub(super) expires: HashMap<String, i64>,
}

impl Tables {
    pub(super) fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: HashMap::with_capacity(capacity),
            expires: HashMap::new(),
        }
    }

    pub(super) fn is_expired(&self, key: &str, now: i64) -> bool {
        matches!(self.expires.get(key), Some(&at) if at <= now)
    }

    pub(super) fn has_expired_keys(&self, now: i64) -> bool {
        self.expires.values().any(|&at| at <= now)
    }

    pub(super) fn live_count(&self, now: i64) -> usize {
        let expired = self.expires.values().filter(|&&at| at <= now).count();
        self.keys.len() - expired
    }

    /// Unbind `key`, dropping its expiry entry with it
    pub(super) fn remove(&mut self, key: &str) -> Option<Object> {
        self.expires.remove(key);
        self.keys.remove(key)
    }

    /// Evict `key` if its expiry has passed. Returns whether it was evicted.
    pub(super) fn evict_if_expired(&mut self, db: usize, key: &str, now: i64) -> bool {
        if !self.is_expired(key, now) {
            return false;
        }
        if let Some(object) = self.remove(key) {
            trace!(db, key, "evicted expired key");
            release(db, key, object);
        }
        true
    }

    /// Evict every key whose expiry has passed
    pub(super) fn evict_expired(&mut self, db: usize, now: i64) -> usize {
        let expired: Vec<String> = self
            .expires
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            if let Some(object) = self.remove(key) {
                release(db, key, object);
            }
        }
        expired.len()
    }

    /// Unbind everything, releasing each object. Returns how many keys were bound.
    pub(super) fn clear(&mut self, db: usize) -> usize {
        self.expires.clear();
        let count = self.keys.len();
        for (key, object) in self.keys.drain() {
            release(db, &key, object);
        }
        count
    }
}

/// Drop one binding's reference; the payload is freed with the last one
pub(super) fn release(db: usize, key: &str, object: Object) {
    if object.release().is_some() {
        trace!(db, key, "released last reference");
    }
}
