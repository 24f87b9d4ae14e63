//! Throttled, role-aware updates for networked components.
//!
//! See [`register_replicated`]

use std::hash::Hash;

use bevy::{ecs::component::Mutable, prelude::*};

pub mod cache;
pub mod context;
mod dispatch;
pub mod scheduler;

pub use cache::{CacheEntry, DataCache};
pub use context::HookContext;
pub use scheduler::{DispatchTarget, EntityScheduler, MissingRoleError};

/// The cache the [`EntityScheduler`] of `T` owns (server capability only)
pub type EntityCache<T> = DataCache<<T as ReplicatedEntity>::CacheKey, <T as ReplicatedEntity>::CacheValue>;

/// A component whose logic runs differently on the server and the client.
///
/// Instead of adding your own systems, implement these hooks and call [`register_replicated`].
/// The scheduler then calls them:
///
/// - [`Self::update_client`] + [`Self::update_server`]: at most once every
///   `manager_update_interval` seconds (every frame if that is 0), only if the role allows it.
/// - [`Self::late_update_client`]: every frame, client capability only.
/// - [`Self::fixed_update_client`]: every fixed step, client capability only.
///
/// The [`HookContext`] cannot be created outside of this crate, so these can only ever be
/// called by the scheduler.
pub trait ReplicatedEntity: Component<Mutability = Mutable> + Sized {
    /// What values in this entity's [`DataCache`] are keyed by
    type CacheKey: Hash + Eq + Send + Sync + 'static;
    /// What is stored in this entity's [`DataCache`]
    type CacheValue: Send + Sync + 'static;

    /// Server-side throttled update
    fn update_server(&mut self, ctx: &mut HookContext<'_, Self::CacheKey, Self::CacheValue>);

    /// Client-side throttled update
    fn update_client(&mut self, ctx: &mut HookContext<'_, Self::CacheKey, Self::CacheValue>);

    /// Client-side update that runs every frame after all throttled updates
    fn late_update_client(&mut self, ctx: &mut HookContext<'_, Self::CacheKey, Self::CacheValue>);

    /// Client-side update that runs on the fixed simulation step
    fn fixed_update_client(&mut self, ctx: &mut HookContext<'_, Self::CacheKey, Self::CacheValue>);
}

#[derive(Debug, Hash, PartialEq, Eq, Clone, SystemSet)]
/// Where the scheduling systems of every replicated entity run
pub enum SyncSet {
    /// (`PreUpdate`) The network role is worked out from the transport, if the plugin was told to.
    ResolveRole,
    /// (`PreUpdate`) Newly added replicated components get their scheduler and role.
    /// Removed ones lose their scheduler.
    Attach,
    /// (`Update`) The throttled server/client updates
    ThrottledUpdate,
    /// (`PostUpdate`) The late client updates
    LateUpdate,
    /// (`FixedUpdate`) The fixed-step client updates
    FixedStep,
}

/// Makes the scheduler drive this component's hooks.
///
/// The [`crate::plugin::syncable_plugin::SyncablePlugin`] must be added to the app for these
/// systems to run.
///
/// When `T` is added to an entity, it is attached with the current [`crate::netty::role::NetworkRole`]
/// resource. If the entity doesn't already have an [`EntityScheduler<T>`], one is created from the
/// [`crate::settings::SyncSettings`] resource. Removing `T` removes its scheduler (and with it, its cache).
///
/// A scheduler inserted with its own settings is removed on detach too, so if `T` is re-added
/// it is scheduled with the app-wide settings unless a new [`EntityScheduler<T>`] is inserted alongside it.
pub fn register_replicated<T: ReplicatedEntity>(app: &mut App) {
    dispatch::add_replicated_systems::<T>(app);
}

pub(super) fn register(app: &mut App) {
    app.configure_sets(PreUpdate, (SyncSet::ResolveRole, SyncSet::Attach).chain());
}
