//! The plugin that brings the whole scheduler into an app

pub mod syncable_plugin;
