//! The role this instance plays on the network.
//!
//! The transport layer decides whether we are authoritative, a mirror, or both. This module
//! only stores that decision so replicated entities can read it when they are attached.

use bevy::prelude::*;
use bevy_renet::renet::{RenetClient, RenetServer};

use crate::sync::SyncSet;

#[derive(Resource, Reflect, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
/// Which sides of the network this instance is responsible for.
///
/// A process hosting a world that a local player is also playing in is [`NetworkRole::Both`].
pub enum NetworkRole {
    /// Neither authoritative nor mirroring anything - no hooks will ever run.
    #[default]
    None,
    /// A passive mirror that receives the server's state but never decides ground truth.
    ClientOnly,
    /// Decides ground truth and propagates it to clients.
    ServerOnly,
    /// Hosting. Authoritative and a client at the same time.
    Both,
}

impl NetworkRole {
    /// Combines the two flags an authority layer typically exposes into a single role.
    pub fn from_authority(is_server: bool, is_client: bool) -> Self {
        match (is_server, is_client) {
            (true, true) => Self::Both,
            (true, false) => Self::ServerOnly,
            (false, true) => Self::ClientOnly,
            (false, false) => Self::None,
        }
    }

    #[inline]
    /// If this role is allowed to run client-side logic
    pub fn is_client(self) -> bool {
        matches!(self, Self::ClientOnly | Self::Both)
    }

    #[inline]
    /// If this role is allowed to run server-side logic
    pub fn is_server(self) -> bool {
        matches!(self, Self::ServerOnly | Self::Both)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// Where the [`NetworkRole`] resource comes from
pub enum RoleSource {
    /// The host inserts (and updates) the [`NetworkRole`] resource itself.
    #[default]
    Manual,
    /// The role follows whichever renet resources currently exist.
    ///
    /// A [`RenetServer`] grants the server capability, a [`RenetClient`] grants the client capability.
    Renet,
}

fn role_from_renet(
    mut commands: Commands,
    server: Option<Res<RenetServer>>,
    client: Option<Res<RenetClient>>,
    current_role: Option<Res<NetworkRole>>,
) {
    let role = NetworkRole::from_authority(server.is_some(), client.is_some());

    if current_role.as_deref() == Some(&role) {
        return;
    }

    info!("Network role is now {role:?}");
    commands.insert_resource(role);
}

pub(super) fn register(app: &mut App, role_source: RoleSource) {
    app.register_type::<NetworkRole>();

    if role_source == RoleSource::Renet {
        app.add_systems(PreUpdate, role_from_renet.in_set(SyncSet::ResolveRole));
    }
}

#[cfg(test)]
mod tests {
    use bevy::prelude::*;
    use bevy_renet::renet::{ConnectionConfig, RenetClient, RenetServer};

    use crate::{
        plugin::syncable_plugin::SyncablePlugin,
        settings::SyncSettings,
        sync::{EntityScheduler, HookContext, ReplicatedEntity, register_replicated},
    };

    use super::{NetworkRole, RoleSource};

    #[derive(Component)]
    struct Beacon;

    impl ReplicatedEntity for Beacon {
        type CacheKey = ();
        type CacheValue = ();

        fn update_server(&mut self, _ctx: &mut HookContext<'_, (), ()>) {}
        fn update_client(&mut self, _ctx: &mut HookContext<'_, (), ()>) {}
        fn late_update_client(&mut self, _ctx: &mut HookContext<'_, (), ()>) {}
        fn fixed_update_client(&mut self, _ctx: &mut HookContext<'_, (), ()>) {}
    }

    fn create_renet_app() -> App {
        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            SyncablePlugin::new(SyncSettings::default()).with_role_source(RoleSource::Renet),
        ));
        register_replicated::<Beacon>(&mut app);
        app
    }

    /// Spawns a beacon, runs one frame, and returns the app's role + the role the beacon was attached with
    fn spawn_and_update(app: &mut App) -> (Option<NetworkRole>, Option<NetworkRole>) {
        let entity = app.world_mut().spawn(Beacon).id();
        app.update();

        (
            app.world().get_resource::<NetworkRole>().copied(),
            app.world().get::<EntityScheduler<Beacon>>(entity).and_then(|s| s.role()),
        )
    }

    #[test]
    fn no_transport_is_no_role() {
        let mut app = create_renet_app();

        assert_eq!(spawn_and_update(&mut app), (Some(NetworkRole::None), Some(NetworkRole::None)));
    }

    #[test]
    fn renet_server_is_server_only() {
        let mut app = create_renet_app();
        app.insert_resource(RenetServer::new(ConnectionConfig::default()));

        assert_eq!(
            spawn_and_update(&mut app),
            (Some(NetworkRole::ServerOnly), Some(NetworkRole::ServerOnly))
        );
    }

    #[test]
    fn renet_client_is_client_only() {
        let mut app = create_renet_app();
        app.insert_resource(RenetClient::new(ConnectionConfig::default()));

        assert_eq!(
            spawn_and_update(&mut app),
            (Some(NetworkRole::ClientOnly), Some(NetworkRole::ClientOnly))
        );
    }

    #[test]
    fn renet_server_and_client_is_both() {
        let mut app = create_renet_app();
        app.insert_resource(RenetServer::new(ConnectionConfig::default()))
            .insert_resource(RenetClient::new(ConnectionConfig::default()));

        assert_eq!(spawn_and_update(&mut app), (Some(NetworkRole::Both), Some(NetworkRole::Both)));
    }

    #[test]
    fn role_follows_transport_changes() {
        let mut app = create_renet_app();
        app.insert_resource(RenetServer::new(ConnectionConfig::default()));

        let (_, first) = spawn_and_update(&mut app);
        assert_eq!(first, Some(NetworkRole::ServerOnly));

        app.insert_resource(RenetClient::new(ConnectionConfig::default()));
        assert_eq!(spawn_and_update(&mut app), (Some(NetworkRole::Both), Some(NetworkRole::Both)));

        app.world_mut().remove_resource::<RenetServer>();
        assert_eq!(
            spawn_and_update(&mut app),
            (Some(NetworkRole::ClientOnly), Some(NetworkRole::ClientOnly))
        );
    }

    #[test]
    fn unchanged_role_is_not_reinserted() {
        let mut app = create_renet_app();
        app.insert_resource(RenetServer::new(ConnectionConfig::default()));

        app.update();
        let changed = app.world().get_resource_change_ticks::<NetworkRole>().map(|ticks| ticks.changed);
        assert!(changed.is_some());

        app.update();
        app.update();

        assert_eq!(
            app.world().get_resource_change_ticks::<NetworkRole>().map(|ticks| ticks.changed),
            changed
        );
    }

    #[test]
    fn from_authority_flags() {
        assert_eq!(NetworkRole::from_authority(false, false), NetworkRole::None);
        assert_eq!(NetworkRole::from_authority(false, true), NetworkRole::ClientOnly);
        assert_eq!(NetworkRole::from_authority(true, false), NetworkRole::ServerOnly);
        assert_eq!(NetworkRole::from_authority(true, true), NetworkRole::Both);
    }

    #[test]
    fn capabilities() {
        assert!(!NetworkRole::None.is_client());
        assert!(!NetworkRole::None.is_server());

        assert!(NetworkRole::ClientOnly.is_client());
        assert!(!NetworkRole::ClientOnly.is_server());

        assert!(!NetworkRole::ServerOnly.is_client());
        assert!(NetworkRole::ServerOnly.is_server());

        assert!(NetworkRole::Both.is_client());
        assert!(NetworkRole::Both.is_server());
    }
}
