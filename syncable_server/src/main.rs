//! Headless host that runs replicated entities with the role and intervals it is given.

#![warn(missing_docs)]

use bevy::{app::ScheduleRunnerPlugin, log::LogPlugin, prelude::*};

pub mod entities;
pub mod plugin;
pub mod settings;

fn main() -> anyhow::Result<()> {
    let server_settings = settings::read_server_settings()?;

    let exit = App::new()
        .add_plugins((
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(server_settings.frame_duration())),
            LogPlugin::default(),
        ))
        .add_plugins(server_settings.create_server_plugin())
        .run();

    if let AppExit::Error(code) = exit {
        anyhow::bail!("Server exited with error code {code}");
    }

    Ok(())
}
