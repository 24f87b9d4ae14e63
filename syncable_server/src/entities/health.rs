//! Health that regenerates on the server and is eased toward on the client

use std::time::Duration;

use bevy::{prelude::*, time::common_conditions::on_timer};
use syncable_core::{
    netty::role::NetworkRole,
    sync::{HookContext, ReplicatedEntity, register_replicated},
};

/// How much of the gap between displayed and actual health is closed each frame
const DISPLAY_EASING: f32 = 0.2;
/// Below this fraction of max health the client warns about it
const CRITICAL_FRACTION: f32 = 0.25;
const DAMAGE_PER_HIT: f32 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The values derived from a player's level that the server caches
pub enum HealthStat {
    /// See [`max_health_for_level`]
    MaxHealth,
    /// See [`regen_for_level`]
    RegenPerSecond,
}

/// Sums the bonus of every level gained
pub fn max_health_for_level(level: u32) -> f32 {
    100.0 + (1..=level).map(|l| 10.0 + (l as f32).sqrt() * 2.0).sum::<f32>()
}

/// Health regenerated per second at this level
pub fn regen_for_level(level: u32) -> f32 {
    1.0 + level as f32 * 0.5
}

#[derive(Component, Reflect, Debug, Clone, PartialEq)]
/// A player's health
pub struct Health {
    level: u32,
    current: f32,
    /// What the client shows. Eased toward `current` every frame.
    displayed: f32,
    critical: bool,
    last_regen: Option<f64>,
}

impl Health {
    /// Starts at full health for this level
    pub fn new(level: u32) -> Self {
        let max = max_health_for_level(level);

        Self {
            level,
            current: max,
            displayed: max,
            critical: false,
            last_regen: None,
        }
    }

    /// The level this health scales with
    pub fn level(&self) -> u32 {
        self.level
    }

    /// The actual health value
    pub fn current(&self) -> f32 {
        self.current
    }

    /// The value the client displays
    pub fn displayed(&self) -> f32 {
        self.displayed
    }

    /// If the client considers this health critically low
    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Reduces health, never going below 0
    pub fn take_damage(&mut self, amount: f32) {
        self.current = (self.current - amount).max(0.0);
    }

    /// If there is any health left
    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }
}

impl ReplicatedEntity for Health {
    type CacheKey = HealthStat;
    type CacheValue = f32;

    fn update_server(&mut self, ctx: &mut HookContext<'_, HealthStat, f32>) {
        let level = self.level;
        let max = ctx.cached_or_else(HealthStat::MaxHealth, || max_health_for_level(level));
        let regen = ctx.cached_or_else(HealthStat::RegenPerSecond, || regen_for_level(level));
        let now = ctx.now();

        if let Some(last_regen) = self.last_regen {
            if self.is_alive() {
                self.current = (self.current + regen * (now - last_regen) as f32).min(max);
            }
        }

        self.last_regen = Some(now);
    }

    fn update_client(&mut self, ctx: &mut HookContext<'_, HealthStat, f32>) {
        if ctx.is_local_player() {
            debug!("Your health: {:.1}", self.current);
        }
    }

    fn late_update_client(&mut self, _ctx: &mut HookContext<'_, HealthStat, f32>) {
        self.displayed += (self.current - self.displayed) * DISPLAY_EASING;
    }

    fn fixed_update_client(&mut self, ctx: &mut HookContext<'_, HealthStat, f32>) {
        // Computed directly since client-only instances have no cache.
        let critical = self.current < max_health_for_level(self.level) * CRITICAL_FRACTION;

        if critical && !self.critical {
            warn!("{:?}'s health is critical ({:.1})", ctx.entity(), self.current);
        }

        self.critical = critical;
    }
}

fn deal_damage(role: Res<NetworkRole>, mut q_health: Query<(Entity, &mut Health)>) {
    if !role.is_server() {
        return;
    }

    for (entity, mut health) in q_health.iter_mut().filter(|(_, health)| health.is_alive()) {
        health.take_damage(DAMAGE_PER_HIT);

        if !health.is_alive() {
            info!("{entity:?} ran out of health");
        }
    }
}

pub(super) fn register(app: &mut App) {
    register_replicated::<Health>(app);

    app.register_type::<Health>().add_systems(
        Update,
        deal_damage
            .run_if(resource_exists::<NetworkRole>)
            .run_if(on_timer(Duration::from_secs(2))),
    );
}

#[cfg(test)]
mod tests {
    use bevy::prelude::*;
    use syncable_core::{
        netty::role::NetworkRole,
        sync::{DispatchTarget, EntityScheduler},
    };

    use super::{Health, HealthStat, max_health_for_level, regen_for_level};

    fn scheduler(role: NetworkRole) -> EntityScheduler<Health> {
        let mut scheduler = EntityScheduler::<Health>::with_intervals(0.0, 10.0).unwrap();
        scheduler.attach(Some(role));
        scheduler
    }

    fn target(health: &mut Health) -> DispatchTarget<Health, &mut Health> {
        DispatchTarget {
            entity: Entity::PLACEHOLDER,
            component: health,
            local_player: None,
        }
    }

    #[test]
    fn max_health_grows_with_level() {
        assert_eq!(max_health_for_level(0), 100.0);
        assert!(max_health_for_level(5) > max_health_for_level(4));
        assert_eq!(regen_for_level(2), 2.0);
    }

    #[test]
    fn server_regenerates_up_to_max_and_caches_stats() {
        let mut scheduler = scheduler(NetworkRole::ServerOnly);
        let mut health = Health::new(2);
        let max = max_health_for_level(2);

        health.take_damage(10.0);

        for now in [0.0, 1.0, 2.0] {
            scheduler.tick(now, target(&mut health)).unwrap();
        }

        // 2 seconds at 2 hp/s
        assert!((health.current() - (max - 6.0)).abs() < 1e-3);
        let cache = scheduler.cache().unwrap();
        assert_eq!(cache.get(&HealthStat::MaxHealth, 2.0), Some(&max));
        assert_eq!(cache.get(&HealthStat::RegenPerSecond, 2.0), Some(&2.0));

        for now in [3.0, 4.0, 5.0, 6.0] {
            scheduler.tick(now, target(&mut health)).unwrap();
        }

        assert_eq!(health.current(), max);
    }

    #[test]
    fn dead_players_do_not_regenerate() {
        let mut scheduler = scheduler(NetworkRole::ServerOnly);
        let mut health = Health::new(0);

        health.take_damage(1000.0);

        for now in [0.0, 5.0] {
            scheduler.tick(now, target(&mut health)).unwrap();
        }

        assert_eq!(health.current(), 0.0);
        assert!(!health.is_alive());
    }

    #[test]
    fn client_eases_display_and_flags_critical() {
        let mut scheduler = scheduler(NetworkRole::ClientOnly);
        let mut health = Health::new(0);

        assert!(scheduler.cache().is_none());

        health.take_damage(90.0);

        for i in 0..50 {
            scheduler.late_tick(i as f64 * 0.02, target(&mut health)).unwrap();
        }

        assert!((health.displayed() - 10.0).abs() < 0.01);
        assert!(!health.is_critical());

        scheduler.fixed_tick(0.0, target(&mut health)).unwrap();

        assert!(health.is_critical());

        scheduler.tick(1.0, target(&mut health)).unwrap();
        // Mirrors never regenerate on their own
        assert_eq!(health.current(), 10.0);
    }

    #[test]
    fn host_flags_critical_without_using_its_cache() {
        let mut scheduler = scheduler(NetworkRole::Both);
        let mut health = Health::new(0);

        health.take_damage(80.0);
        scheduler.fixed_tick(0.0, target(&mut health)).unwrap();

        assert!(health.is_critical());
        assert!(scheduler.cache().is_some_and(|cache| cache.is_empty()));
    }
}
