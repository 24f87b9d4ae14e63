//! [`ServerPlugin`]

use bevy::prelude::*;
use syncable_core::plugin::syncable_plugin::SyncablePlugin;

use crate::{entities, settings::ServerSettings};

/// Runs replicated entities with the given settings
pub struct ServerPlugin {
    settings: ServerSettings,
}

impl ServerPlugin {
    /// Creates the plugin from these settings
    pub fn new(settings: ServerSettings) -> Self {
        Self { settings }
    }
}

fn stop_after_frames(settings: Res<ServerSettings>, mut frames_run: Local<u32>, mut evw_exit: MessageWriter<AppExit>) {
    let Some(max_frames) = settings.frames else {
        return;
    };

    *frames_run += 1;

    if *frames_run >= max_frames {
        info!("Ran {max_frames} frames - shutting down.");
        evw_exit.write(AppExit::Success);
    }
}

fn log_startup(settings: Res<ServerSettings>) {
    info!(
        "Starting as {:?} - updating every {}s, caching for {}s, {} frames per second.",
        settings.role,
        settings.sync.manager_update_interval(),
        settings.sync.cache_ttl(),
        settings.tick_rate
    );
}

impl Plugin for ServerPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(SyncablePlugin::new(self.settings.sync))
            .insert_resource(self.settings.role)
            .insert_resource(self.settings.clone())
            .add_systems(Startup, log_startup)
            .add_systems(Last, stop_after_frames);

        entities::register(app);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bevy::{prelude::*, time::TimeUpdateStrategy};
    use syncable_core::{
        netty::{local_player::LocalPlayer, role::NetworkRole},
        settings::SyncSettings,
        sync::EntityScheduler,
    };

    use crate::{
        entities::{health::Health, player::Player},
        settings::ServerSettings,
    };

    fn settings(role: NetworkRole, local_player: bool) -> ServerSettings {
        ServerSettings {
            role,
            sync: SyncSettings::new(0.25, 1.0).unwrap(),
            tick_rate: 8.0,
            frames: None,
            players: 3,
            local_player,
        }
    }

    fn create_app(settings: ServerSettings) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, settings.create_server_plugin()))
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(125)));
        app
    }

    #[test]
    fn hosting_spawns_players_with_caches() {
        let mut app = create_app(settings(NetworkRole::Both, true));

        for _ in 0..4 {
            app.update();
        }

        let world = app.world_mut();
        let players = world.query_filtered::<Entity, (With<Player>, With<Health>)>().iter(world).collect::<Vec<_>>();
        assert_eq!(players.len(), 3);

        for &player in &players {
            let scheduler = world.get::<EntityScheduler<Health>>(player).expect("Missing scheduler");
            assert!(scheduler.cache().is_some());
            assert_eq!(scheduler.role(), Some(NetworkRole::Both));
        }

        let local = world.resource::<LocalPlayer>().entity();
        assert!(local.is_some_and(|e| players.contains(&e)));
    }

    #[test]
    fn dedicated_server_has_no_local_player() {
        let mut app = create_app(settings(NetworkRole::ServerOnly, true));

        app.update();

        assert_eq!(app.world().resource::<LocalPlayer>().entity(), None);
    }

    #[test]
    fn stops_after_frames() {
        let mut app = create_app(ServerSettings {
            frames: Some(3),
            ..settings(NetworkRole::ServerOnly, false)
        });

        for _ in 0..3 {
            assert!(app.should_exit().is_none());
            app.update();
        }

        assert_eq!(app.should_exit(), Some(AppExit::Success));
    }

    #[test]
    fn zero_frame_limit_stops_after_first_frame() {
        let mut app = create_app(ServerSettings {
            frames: Some(0),
            ..settings(NetworkRole::ServerOnly, false)
        });

        app.update();

        assert_eq!(app.should_exit(), Some(AppExit::Success));
    }
}
