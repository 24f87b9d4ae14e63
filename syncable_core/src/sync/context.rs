//! What a hook can see and touch while it runs

use std::hash::Hash;

use bevy::prelude::Entity;

use crate::netty::role::NetworkRole;

use super::cache::DataCache;

/// Everything a [`super::ReplicatedEntity`] hook gets to see about the tick it is running in.
///
/// This can only be constructed by the scheduler, which is what stops anything else from
/// calling the hooks directly.
pub struct HookContext<'a, K: Hash + Eq + Send + Sync + 'static, V: Send + Sync + 'static> {
    now: f64,
    entity: Entity,
    role: NetworkRole,
    is_local_player: bool,
    cache: Option<&'a mut DataCache<K, V>>,
}

impl<'a, K: Hash + Eq + Send + Sync + 'static, V: Send + Sync + 'static> HookContext<'a, K, V> {
    pub(crate) fn new(
        now: f64,
        entity: Entity,
        role: NetworkRole,
        is_local_player: bool,
        cache: Option<&'a mut DataCache<K, V>>,
    ) -> Self {
        Self {
            now,
            entity,
            role,
            is_local_player,
            cache,
        }
    }

    /// The clock time (in seconds) of the tick being dispatched
    pub fn now(&self) -> f64 {
        self.now
    }

    /// The entity this hook is running for
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// The role this entity was attached with
    pub fn role(&self) -> NetworkRole {
        self.role
    }

    /// If this entity is the one controlled by this instance's player
    pub fn is_local_player(&self) -> bool {
        self.is_local_player
    }

    /// This entity's cache. Only present if it was attached with server capability.
    pub fn cache(&mut self) -> Option<&mut DataCache<K, V>> {
        self.cache.as_deref_mut()
    }

    /// Returns the value cached for this key, if it is still fresh
    pub fn cached(&self, key: &K) -> Option<&V> {
        self.cache.as_deref()?.get(key, self.now)
    }

    /// Caches this value until the cache's ttl elapses.
    ///
    /// Returns false (and drops the value) if this entity has no cache.
    pub fn cache_value(&mut self, key: K, value: V) -> bool {
        let now = self.now;

        let Some(cache) = self.cache.as_deref_mut() else {
            return false;
        };

        cache.set(key, value, now);
        true
    }

    /// Returns the fresh cached value, or computes it (and caches it if there is a cache).
    pub fn cached_or_else(&mut self, key: K, compute: impl FnOnce() -> V) -> V
    where
        V: Clone,
    {
        let now = self.now;

        match self.cache.as_deref_mut() {
            Some(cache) => cache.get_or_insert_with(key, now, compute).clone(),
            None => compute(),
        }
    }
}
