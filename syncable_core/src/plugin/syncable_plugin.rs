//! [`SyncablePlugin`]

use bevy::prelude::{App, Plugin};

use crate::{netty, netty::role::RoleSource, settings, settings::SyncSettings, sync};

#[derive(Default)]
/// Sets up everything [`sync::register_replicated`] needs.
///
/// This does not insert a [`crate::netty::role::NetworkRole`] - that is up to whatever owns the
/// network connection (or use [`RoleSource::Renet`] to have it follow the renet resources).
pub struct SyncablePlugin {
    settings: SyncSettings,
    role_source: RoleSource,
}

impl SyncablePlugin {
    /// Every replicated entity will be scheduled with these settings unless it brings its own
    pub fn new(settings: SyncSettings) -> Self {
        Self {
            settings,
            role_source: RoleSource::Manual,
        }
    }

    /// Changes where the network role comes from
    pub fn with_role_source(mut self, role_source: RoleSource) -> Self {
        self.role_source = role_source;
        self
    }
}

impl Plugin for SyncablePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.settings);

        settings::register(app);
        sync::register(app);
        netty::register(app, self.role_source);
    }
}
