//! A short-lived keyed cache for values that are too expensive to recompute every frame.

use std::hash::Hash;

use bevy::platform::collections::{HashMap, hash_map::Entry};

#[derive(Debug, Clone, PartialEq)]
/// A cached value and when it stops being usable
pub struct CacheEntry<V> {
    value: V,
    expires_at: f64,
    is_valid: bool,
}

impl<V> CacheEntry<V> {
    fn new(value: V, expires_at: f64) -> Self {
        Self {
            value,
            expires_at,
            is_valid: true,
        }
    }

    /// The cached value, regardless of whether it is still fresh
    pub fn value(&self) -> &V {
        &self.value
    }

    /// The clock time at which this entry expires
    pub fn expires_at(&self) -> f64 {
        self.expires_at
    }

    /// False if this entry was manually invalidated
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// If this entry can still be used at this time
    pub fn is_fresh(&self, now: f64) -> bool {
        self.is_valid && now < self.expires_at
    }
}

#[derive(Debug)]
/// Per-entity cache of derived values.
///
/// Every key expires on its own, `ttl` seconds after it was last [`DataCache::set`]. There is
/// no other eviction policy. A miss is not an error - the caller is expected to recompute the
/// value and store it again.
///
/// This is only ever created for entities attached with server capability.
pub struct DataCache<K: Hash + Eq + Send + Sync + 'static, V: Send + Sync + 'static> {
    ttl: f64,
    entries: HashMap<K, CacheEntry<V>>,
}

impl<K: Hash + Eq + Send + Sync + 'static, V: Send + Sync + 'static> DataCache<K, V> {
    /// Creates an empty cache whose entries live for `ttl` seconds
    pub fn new(ttl: f64) -> Self {
        Self {
            ttl,
            entries: HashMap::default(),
        }
    }

    /// How long (in seconds) each entry lives for
    pub fn ttl(&self) -> f64 {
        self.ttl
    }

    /// Returns the cached value if it is valid and has not expired at `now`.
    pub fn get(&self, key: &K, now: f64) -> Option<&V> {
        self.entries.get(key).filter(|entry| entry.is_fresh(now)).map(|entry| &entry.value)
    }

    /// Returns the raw entry for this key, even if it is stale
    pub fn entry(&self, key: &K) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    /// Stores this value, expiring `ttl` seconds after `now`.
    pub fn set(&mut self, key: K, value: V, now: f64) {
        self.entries.insert(key, CacheEntry::new(value, now + self.ttl));
    }

    /// Returns the fresh cached value, or computes + stores a new one if there wasn't one.
    pub fn get_or_insert_with(&mut self, key: K, now: f64, compute: impl FnOnce() -> V) -> &V {
        let expires_at = now + self.ttl;

        match self.entries.entry(key) {
            Entry::Occupied(occupied) => {
                let entry = occupied.into_mut();
                if !entry.is_fresh(now) {
                    *entry = CacheEntry::new(compute(), expires_at);
                }
                &entry.value
            }
            Entry::Vacant(vacant) => &vacant.insert(CacheEntry::new(compute(), expires_at)).value,
        }
    }

    /// Marks this key as invalid so the next [`DataCache::get`] misses.
    ///
    /// Returns false if nothing was cached for this key.
    pub fn invalidate(&mut self, key: &K) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };

        entry.is_valid = false;
        true
    }

    /// Removes every entry whose time is up (or that was invalidated).
    ///
    /// Returns how many entries were removed.
    pub fn purge_expired(&mut self, now: f64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now));
        before - self.entries.len()
    }

    /// Removes everything from this cache
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The number of entries stored, fresh or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// If nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
