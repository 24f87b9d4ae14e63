//! Decides when a replicated entity's hooks run.
//!
//! The scheduler is plain data driven by explicit clock times, so it works (and is tested)
//! without an app. See [`super::register_replicated`] for how it is driven inside bevy.

use std::{marker::PhantomData, ops::DerefMut};

use bevy::prelude::*;
use derive_more::{Display, Error};

use crate::{
    netty::role::NetworkRole,
    settings::{ConfigError, SyncSettings},
};

use super::{EntityCache, ReplicatedEntity, context::HookContext};

#[derive(Error, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[display("{_0:?} was ticked before it was given a network role")]
/// A tick reached an entity before the networking layer assigned it a role.
///
/// Under a correct host setup this never happens. When it does the tick is simply skipped.
pub struct MissingRoleError(#[error(not(source))] pub Entity);

/// The entity a tick is being dispatched to.
///
/// `component` is anything that mutably derefs to the component, so bevy's change detection
/// only fires if a hook actually runs.
pub struct DispatchTarget<T: ReplicatedEntity, C: DerefMut<Target = T>> {
    /// The entity being ticked
    pub entity: Entity,
    /// The component whose hooks will be called
    pub component: C,
    /// The locally controlled entity, if any
    pub local_player: Option<Entity>,
}

#[derive(Component)]
/// Throttles and role-gates the hooks of the [`ReplicatedEntity`] `T` on one entity, and owns
/// that entity's [`EntityCache<T>`] when it has server capability.
///
/// Each entry point ([`Self::tick`], [`Self::late_tick`], [`Self::fixed_tick`]) is applied at
/// most once per distinct clock time. Clock times are expected to only move forward.
pub struct EntityScheduler<T: ReplicatedEntity> {
    settings: SyncSettings,
    role: Option<NetworkRole>,
    /// 0 until the first throttled update fires
    next_fire_time: f64,
    last_tick: Option<f64>,
    last_late_tick: Option<f64>,
    last_fixed_tick: Option<f64>,
    missing_role_reported: bool,
    cache: Option<EntityCache<T>>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: ReplicatedEntity> EntityScheduler<T> {
    /// Creates a scheduler that has not been attached yet
    pub fn new(settings: SyncSettings) -> Self {
        Self {
            settings,
            role: None,
            next_fire_time: 0.0,
            last_tick: None,
            last_late_tick: None,
            last_fixed_tick: None,
            missing_role_reported: false,
            cache: None,
            _phantom: PhantomData,
        }
    }

    /// Validates these intervals (in seconds) and creates a scheduler from them.
    pub fn with_intervals(manager_update_interval: f64, cache_ttl: f64) -> Result<Self, ConfigError> {
        Ok(Self::new(SyncSettings::new(manager_update_interval, cache_ttl)?))
    }

    /// The intervals this scheduler runs with
    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// The role this was attached with, or None if no role has been delivered
    pub fn role(&self) -> Option<NetworkRole> {
        self.role
    }

    /// The clock time the next throttled update is due at (0 if it has never fired)
    pub fn next_fire_time(&self) -> f64 {
        self.next_fire_time
    }

    /// (Re)attaches this scheduler with the role the networking layer delivered.
    ///
    /// All timing state is reset, so the first tick after attaching always fires. A fresh cache
    /// is created if the role has server capability, otherwise the entity has none.
    pub fn attach(&mut self, role: Option<NetworkRole>) {
        let cache = role
            .filter(|role| role.is_server())
            .map(|_| EntityCache::<T>::new(self.settings.cache_ttl()));

        *self = Self {
            role,
            cache,
            ..Self::new(self.settings)
        };
    }

    /// This entity's cache. Only present when attached with server capability.
    pub fn cache(&self) -> Option<&EntityCache<T>> {
        self.cache.as_ref()
    }

    /// This entity's cache. Only present when attached with server capability.
    pub fn cache_mut(&mut self) -> Option<&mut EntityCache<T>> {
        self.cache.as_mut()
    }

    /// Returns true the first time it is called after a [`MissingRoleError`] was produced
    /// for this attachment, so the error can be reported once instead of every frame.
    pub fn should_report_missing_role(&mut self) -> bool {
        !std::mem::replace(&mut self.missing_role_reported, true)
    }

    fn attached_role(&self, entity: Entity) -> Result<NetworkRole, MissingRoleError> {
        self.role.ok_or(MissingRoleError(entity))
    }

    /// The once-per-frame throttled update.
    ///
    /// If `now` has reached the next fire time (or the interval is 0), runs
    /// [`ReplicatedEntity::update_client`] then [`ReplicatedEntity::update_server`] (each only
    /// if the role allows it) and schedules the next fire.
    ///
    /// Returns whether the update fired.
    pub fn tick<C: DerefMut<Target = T>>(&mut self, now: f64, target: DispatchTarget<T, C>) -> Result<bool, MissingRoleError> {
        let role = self.attached_role(target.entity)?;

        if self.last_tick.is_some_and(|last| now <= last) {
            return Ok(false);
        }
        self.last_tick = Some(now);

        let interval = self.settings.manager_update_interval();
        if now < self.next_fire_time && interval != 0.0 {
            return Ok(false);
        }

        let DispatchTarget {
            entity,
            mut component,
            local_player,
        } = target;

        let mut ctx = HookContext::new(now, entity, role, local_player == Some(entity), self.cache.as_mut());

        if role.is_client() {
            component.update_client(&mut ctx);
        }
        if role.is_server() {
            component.update_server(&mut ctx);
        }

        self.next_fire_time = now + interval;

        Ok(true)
    }

    /// Runs [`ReplicatedEntity::late_update_client`] every frame if the role has client capability.
    ///
    /// Returns whether the hook ran.
    pub fn late_tick<C: DerefMut<Target = T>>(&mut self, now: f64, target: DispatchTarget<T, C>) -> Result<bool, MissingRoleError> {
        let role = self.attached_role(target.entity)?;

        if self.last_late_tick.is_some_and(|last| now <= last) {
            return Ok(false);
        }
        self.last_late_tick = Some(now);

        if !role.is_client() {
            return Ok(false);
        }

        let DispatchTarget {
            entity,
            mut component,
            local_player,
        } = target;

        component.late_update_client(&mut HookContext::new(now, entity, role, local_player == Some(entity), self.cache.as_mut()));

        Ok(true)
    }

    /// Runs [`ReplicatedEntity::fixed_update_client`] on every fixed step if the role has client capability.
    ///
    /// Returns whether the hook ran.
    pub fn fixed_tick<C: DerefMut<Target = T>>(&mut self, now: f64, target: DispatchTarget<T, C>) -> Result<bool, MissingRoleError> {
        let role = self.attached_role(target.entity)?;

        if self.last_fixed_tick.is_some_and(|last| now <= last) {
            return Ok(false);
        }
        self.last_fixed_tick = Some(now);

        if !role.is_client() {
            return Ok(false);
        }

        let DispatchTarget {
            entity,
            mut component,
            local_player,
        } = target;

        component.fixed_update_client(&mut HookContext::new(now, entity, role, local_player == Some(entity), self.cache.as_mut()));

        Ok(true)
    }
}
