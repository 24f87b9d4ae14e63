//! Spawns the players whose health is replicated

use bevy::prelude::*;
use syncable_core::netty::local_player::LocalPlayer;

use crate::settings::ServerSettings;

use super::health::Health;

#[derive(Component, Debug)]
/// Marks an entity as a player
pub struct Player;

fn spawn_players(mut commands: Commands, settings: Res<ServerSettings>, mut local_player: ResMut<LocalPlayer>) {
    let players = (0..settings.players)
        .map(|i| commands.spawn((Player, Name::new(format!("Player {i}")), Health::new(i + 1))).id())
        .collect::<Vec<_>>();

    if !settings.local_player {
        return;
    }

    if !settings.role.is_client() {
        warn!("--local-player was set, but {:?} has no client to control a player with.", settings.role);
        return;
    }

    local_player.set(players.first().copied());
}

pub(super) fn register(app: &mut App) {
    app.add_systems(Startup, spawn_players);
}
