//! Settings for the server

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, ensure};
use bevy::prelude::*;
use clap::{Parser, ValueEnum};
use syncable_core::{
    netty::role::NetworkRole,
    settings::{RawSyncSettings, SyncSettings},
};

use crate::plugin::server_plugin::ServerPlugin;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
/// The `--role` values accepted on the command line
pub enum RoleArg {
    /// Run nothing
    None,
    /// Only mirror state
    Client,
    /// Only decide state
    Server,
    /// Host a world and play in it
    Both,
}

impl From<RoleArg> for NetworkRole {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::None => Self::None,
            RoleArg::Client => Self::ClientOnly,
            RoleArg::Server => Self::ServerOnly,
            RoleArg::Both => Self::Both,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
/// Command line arguments for the server
pub struct Args {
    /// Which side(s) of the network this instance is responsible for
    #[arg(long, value_enum, default_value_t = RoleArg::Server)]
    role: RoleArg,

    /// A TOML file containing `manager_update_interval` and/or `cache_ttl`.
    ///
    /// Any setting passed on the command line overrides the one in this file.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Seconds between throttled updates (0 = every frame)
    #[arg(long, allow_negative_numbers = true)]
    update_interval: Option<f64>,

    /// Seconds a cached value is kept before it is re-calculated
    #[arg(long, allow_negative_numbers = true)]
    cache_ttl: Option<f64>,

    /// How many frames the host loop runs per second
    #[arg(long, default_value_t = 60.0)]
    tick_rate: f64,

    /// Shut down after this many frames (at least 1). Runs forever if not set.
    #[arg(long)]
    frames: Option<u32>,

    /// How many players to spawn
    #[arg(long, default_value_t = 3)]
    players: u32,

    /// If this flag is set, the first player is controlled by this instance.
    ///
    /// Only makes sense for the `client` or `both` roles.
    #[arg(long, default_value_t = false)]
    local_player: bool,
}

#[derive(Resource, Debug, Clone)]
/// Settings for the server from the command line + settings file
pub struct ServerSettings {
    /// The role handed to every replicated entity
    pub role: NetworkRole,
    /// Validated scheduler intervals
    pub sync: SyncSettings,
    /// Frames per second of the host loop
    pub tick_rate: f64,
    /// Stop after this many frames
    pub frames: Option<u32>,
    /// How many players to spawn
    pub players: u32,
    /// If the first player is controlled by this instance
    pub local_player: bool,
}

impl ServerSettings {
    /// Combines the arguments with the settings file they point to (if any).
    pub fn from_args(args: Args) -> anyhow::Result<Self> {
        let mut raw = match &args.settings {
            Some(path) => {
                let document =
                    fs::read_to_string(path).with_context(|| format!("Unable to read settings file {}", path.display()))?;
                RawSyncSettings::from_toml(&document).with_context(|| format!("Unable to parse settings file {}", path.display()))?
            }
            None => RawSyncSettings::default(),
        };

        if let Some(update_interval) = args.update_interval {
            raw.manager_update_interval = update_interval;
        }
        if let Some(cache_ttl) = args.cache_ttl {
            raw.cache_ttl = cache_ttl;
        }

        let sync = SyncSettings::try_from(raw).context("Invalid scheduler settings")?;

        ensure!(
            args.tick_rate.is_finite() && args.tick_rate > 0.0,
            "Tick rate must be a positive number (got {})",
            args.tick_rate
        );
        ensure!(args.frames != Some(0), "Frame limit must be at least 1 (leave it unset to run forever)");

        Ok(Self {
            role: args.role.into(),
            sync,
            tick_rate: args.tick_rate,
            frames: args.frames,
            players: args.players,
            local_player: args.local_player,
        })
    }

    /// How long each frame of the host loop should take
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate)
    }

    /// Creates the plugin that runs the server with these settings
    pub fn create_server_plugin(&self) -> ServerPlugin {
        ServerPlugin::new(self.clone())
    }
}

/// Reads the server settings passed in from the command line
pub fn read_server_settings() -> anyhow::Result<ServerSettings> {
    ServerSettings::from_args(Args::parse())
}
