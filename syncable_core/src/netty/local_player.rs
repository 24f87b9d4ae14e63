//! Who the locally controlled player is

use bevy::prelude::*;

#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
/// The entity controlled by this instance's player, if there is one.
///
/// Dedicated servers leave this empty. Whatever spawns the local player should set it, and
/// hooks can then check [`crate::sync::context::HookContext::is_local_player`].
pub struct LocalPlayer(Option<Entity>);

impl LocalPlayer {
    /// Creates a handle pointing to this entity (or nothing)
    pub fn new(entity: Option<Entity>) -> Self {
        Self(entity)
    }

    /// The locally controlled entity, if any
    pub fn entity(&self) -> Option<Entity> {
        self.0
    }

    /// Changes which entity is locally controlled
    pub fn set(&mut self, entity: Option<Entity>) {
        self.0 = entity;
    }
}

pub(super) fn register(app: &mut App) {
    app.init_resource::<LocalPlayer>();
}
