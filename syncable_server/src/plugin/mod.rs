//! Contains the server bevy plugin

pub mod server_plugin;
