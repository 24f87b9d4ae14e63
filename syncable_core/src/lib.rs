//! Throttled, role-aware update scheduling for replicated entities.
//!
//! Add the [`plugin::syncable_plugin::SyncablePlugin`], insert a [`netty::role::NetworkRole`],
//! implement [`sync::ReplicatedEntity`] for a component and call [`sync::register_replicated`].

#![warn(missing_docs)]

pub mod netty;
pub mod plugin;
pub mod settings;
pub mod sync;
