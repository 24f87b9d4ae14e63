//! Inputs handed to us by the networking layer.
//!
//! Nothing in here talks to the network itself - the transport decides who is server and who
//! is client, and who the local player is. These are just the handles that decision is
//! delivered through.

use bevy::prelude::App;

pub mod local_player;
pub mod role;

pub(super) fn register(app: &mut App, role_source: role::RoleSource) {
    role::register(app, role_source);
    local_player::register(app);
}
