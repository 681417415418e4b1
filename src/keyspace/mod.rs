//! Keyspace Module
//!
//! One isolated database: a key → object table and a key → expiry table
//! guarded by a single reader/writer lock.
//!
//! ## Responsibilities
//! - Bind, look up and unbind keys
//! - Enforce expiration lazily on every read path
//! - Expose a single-pass active sweep for an external scheduler
//! - Keep refcounts in step with key bindings
//!
//! ## Locking
//! - Point reads (`get`, `exists`, `type_of`) take a shared lock. When they
//!   observe an expired key they drop it, take the exclusive lock and
//!   re-validate before evicting, since a writer may have rebound the key
//!   in between.
//! - Whole-table reads and TTL queries (`size`, `keys`, `ttl`,
//!   `expire_time`) take an upgradable read and upgrade only when an
//!   eviction is needed. No writer can run between the check and the
//!   eviction.
//! - Mutations take the exclusive lock.
//! - No operation touches a second keyspace while holding this lock.

mod tables;

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::{NimbusError, Result};
use crate::object::Object;

use tables::{release, Tables};

/// TTL reply for a key that does not exist
pub const TTL_MISSING: i64 = -2;

/// TTL reply for a key without an expiry
pub const TTL_PERSISTENT: i64 = -1;

/// Key counts of one database, shaped like an `INFO keyspace` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyspaceStats {
    pub id: usize,
    pub keys: usize,
    pub expires: usize,
}

impl fmt::Display for KeyspaceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "db{}:keys={},expires={}", self.id, self.keys, self.expires)
    }
}

/// A single database
pub struct Keyspace {
    id: usize,
    tables: RwLock<Tables>,
    clock: Arc<dyn Clock>,
}

impl Keyspace {
    /// Create an empty keyspace on the system clock
    pub fn new(id: usize) -> Self {
        Self::with_clock(id, Arc::new(SystemClock), 0)
    }

    pub fn with_clock(id: usize, clock: Arc<dyn Clock>, capacity: usize) -> Self {
        Self {
            id,
            tables: RwLock::new(Tables::with_capacity(capacity)),
            clock,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    // =========================================================================
    // Read Path
    // =========================================================================

    /// Run `f` against the tables once `key` is known not to be expired.
    ///
    /// Fast path under the shared lock; if the key has expired, retake the
    /// lock exclusively, re-check and evict, then answer from there.
    fn with_live_key<R>(&self, key: &str, f: impl FnOnce(&Tables) -> R) -> R {
        let now = self.clock.now();
        {
            let tables = self.tables.read();
            if !tables.is_expired(key, now) {
                return f(&*tables);
            }
        }

        let mut tables = self.tables.write();
        tables.evict_if_expired(self.id, key, now);
        f(&*tables)
    }

    /// Get the object bound to `key`, as a new reference
    pub fn get(&self, key: &str) -> Result<Object> {
        self.with_live_key(key, |tables| tables.keys.get(key).map(Object::retain))
            .ok_or(NimbusError::KeyNotFound)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.with_live_key(key, |tables| tables.keys.contains_key(key))
    }

    /// Kind name of the bound value ("string", "list", "set", "zset", "hash")
    pub fn type_of(&self, key: &str) -> Result<&'static str> {
        self.with_live_key(key, |tables| tables.keys.get(key).map(|o| o.kind().as_str()))
            .ok_or(NimbusError::KeyNotFound)
    }

    /// Remaining whole seconds to live.
    ///
    /// Returns `TTL_MISSING` (-2) when the key does not exist, including when
    /// it expired and is evicted by this call, and `TTL_PERSISTENT` (-1) when
    /// it has no expiry.
    pub fn ttl(&self, key: &str) -> i64 {
        let now = self.clock.now();
        match self.expiry_of(key, now) {
            Some(Some(at)) => at - now,
            Some(None) => TTL_PERSISTENT,
            None => TTL_MISSING,
        }
    }

    /// Absolute expiry instant, with the same -2 / -1 replies as `ttl`
    pub fn expire_time(&self, key: &str) -> i64 {
        let now = self.clock.now();
        match self.expiry_of(key, now) {
            Some(Some(at)) => at,
            Some(None) => TTL_PERSISTENT,
            None => TTL_MISSING,
        }
    }

    /// `None` if the key is missing, otherwise its expiry (if any).
    /// Evicts the key when its expiry has passed.
    fn expiry_of(&self, key: &str, now: i64) -> Option<Option<i64>> {
        let tables = self.tables.upgradable_read();
        if !tables.keys.contains_key(key) {
            return None;
        }
        if tables.is_expired(key, now) {
            let mut tables = RwLockUpgradableReadGuard::upgrade(tables);
            tables.evict_if_expired(self.id, key, now);
            return None;
        }
        Some(tables.expires.get(key).copied())
    }

    /// All live keys, in no particular order
    pub fn keys(&self) -> Vec<String> {
        self.keys_matching(|_| true)
    }

    /// Live keys accepted by `filter`, in no particular order.
    ///
    /// Pattern matching (globs and the like) belongs to the caller; this
    /// only applies whatever predicate it is handed. The predicate runs on a
    /// snapshot after the lock is released, so it may call back into this
    /// keyspace (or any other).
    pub fn keys_matching(&self, filter: impl Fn(&str) -> bool) -> Vec<String> {
        let snapshot = self.live_keys();
        snapshot
            .into_iter()
            .filter(|key| filter(key.as_str()))
            .collect()
    }

    fn live_keys(&self) -> Vec<String> {
        let now = self.clock.now();
        let tables = self.tables.upgradable_read();

        if tables.has_expired_keys(now) {
            let mut tables = RwLockUpgradableReadGuard::upgrade(tables);
            tables.evict_expired(self.id, now);
            tables.keys.keys().cloned().collect()
        } else {
            tables.keys.keys().cloned().collect()
        }
    }

    /// Number of live keys; evicts any expired keys it comes across
    pub fn size(&self) -> usize {
        let now = self.clock.now();
        let tables = self.tables.upgradable_read();

        if tables.has_expired_keys(now) {
            let mut tables = RwLockUpgradableReadGuard::upgrade(tables);
            tables.evict_expired(self.id, now);
            tables.keys.len()
        } else {
            tables.keys.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Counts without evicting anything
    pub fn stats(&self) -> KeyspaceStats {
        let now = self.clock.now();
        let tables = self.tables.read();
        let expires = tables.expires.values().filter(|&&at| at > now).count();

        KeyspaceStats {
            id: self.id,
            keys: tables.live_count(now),
            expires,
        }
    }

    // =========================================================================
    // Write Path
    // =========================================================================

    /// Bind `key` to `object`, taking over the caller's reference.
    ///
    /// A previous binding is released. An existing expiry on a live key is
    /// kept; one left behind by an expired key is not.
    pub fn set(&self, key: impl Into<String>, object: Object) {
        let key = key.into();
        let now = self.clock.now();
        let mut tables = self.tables.write();

        tables.evict_if_expired(self.id, &key, now);
        if let Some(previous) = tables.keys.insert(key.clone(), object) {
            release(self.id, &key, previous);
        }
    }

    /// Bind only when `key` is absent (or expired); fails with `KeyExists`
    /// otherwise, releasing `object`.
    pub fn set_if_absent(&self, key: impl Into<String>, object: Object) -> Result<()> {
        let key = key.into();
        let now = self.clock.now();
        let mut tables = self.tables.write();

        tables.evict_if_expired(self.id, &key, now);
        if tables.keys.contains_key(&key) {
            release(self.id, &key, object);
            return Err(NimbusError::KeyExists);
        }
        tables.keys.insert(key, object);
        Ok(())
    }

    /// Bind `key` and give it a TTL of `seconds` in one step
    pub fn set_with_expiry(&self, key: impl Into<String>, object: Object, seconds: i64) {
        let key = key.into();
        let now = self.clock.now();
        let mut tables = self.tables.write();

        tables.evict_if_expired(self.id, &key, now);
        if let Some(previous) = tables.keys.insert(key.clone(), object) {
            release(self.id, &key, previous);
        }
        tables.expires.insert(key, now.saturating_add(seconds));
    }

    /// Unbind `key`. Returns whether a live key was removed.
    pub fn delete(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut tables = self.tables.write();

        if tables.evict_if_expired(self.id, key, now) {
            return false;
        }
        match tables.remove(key) {
            Some(object) => {
                release(self.id, key, object);
                true
            }
            None => false,
        }
    }

    /// Expire `key` in `seconds` from now. Non-positive values schedule an
    /// expiry in the past, which the next observation acts on.
    pub fn expire_in(&self, key: &str, seconds: i64) -> bool {
        let now = self.clock.now();
        self.set_expiry(key, now, now.saturating_add(seconds))
    }

    /// Expire `key` at the absolute instant `at` (seconds since epoch)
    pub fn expire_at(&self, key: &str, at: i64) -> bool {
        let now = self.clock.now();
        self.set_expiry(key, now, at)
    }

    fn set_expiry(&self, key: &str, now: i64, at: i64) -> bool {
        let mut tables = self.tables.write();

        if tables.evict_if_expired(self.id, key, now) || !tables.keys.contains_key(key) {
            return false;
        }
        tables.expires.insert(key.to_string(), at);
        true
    }

    /// Drop the expiry of `key`. Returns whether there was one to drop.
    pub fn persist(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut tables = self.tables.write();

        if tables.evict_if_expired(self.id, key, now) {
            return false;
        }
        tables.expires.remove(key).is_some()
    }

    /// Release every binding and clear both tables
    pub fn flush(&self) {
        let mut tables = self.tables.write();
        let released = tables.clear(self.id);
        debug!(db = self.id, released, "flushed keyspace");
    }

    /// Evict every key whose expiry has passed. Returns how many were evicted.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut tables = self.tables.write();
        let evicted = tables.evict_expired(self.id, now);
        if evicted > 0 {
            debug!(db = self.id, evicted, "swept expired keys");
        }
        evicted
    }
}

impl fmt::Debug for Keyspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyspace").field("id", &self.id).finish_non_exhaustive()
    }
}
