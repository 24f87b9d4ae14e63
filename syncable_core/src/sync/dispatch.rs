//! The bevy systems that drive each [`EntityScheduler`] from the app's schedules.

use bevy::prelude::*;

use crate::{
    netty::{local_player::LocalPlayer, role::NetworkRole},
    settings::SyncSettings,
};

use super::{
    ReplicatedEntity, SyncSet,
    scheduler::{DispatchTarget, EntityScheduler, MissingRoleError},
};

fn detach_replicated<T: ReplicatedEntity>(mut commands: Commands, mut removed: RemovedComponents<T>, q_replicated: Query<(), With<T>>) {
    for entity in removed.read() {
        // Re-added since it was removed, so it will be re-attached instead
        if q_replicated.contains(entity) {
            continue;
        }

        let Ok(mut ecmds) = commands.get_entity(entity) else {
            continue;
        };

        ecmds.try_remove::<EntityScheduler<T>>();
        debug!("Detached {} from {entity:?}", std::any::type_name::<T>());
    }
}

fn attach_replicated<T: ReplicatedEntity>(
    mut commands: Commands,
    role: Option<Res<NetworkRole>>,
    settings: Res<SyncSettings>,
    mut q_attached: Query<(Entity, Option<&mut EntityScheduler<T>>), Added<T>>,
) {
    let role = role.map(|role| *role);

    for (entity, scheduler) in q_attached.iter_mut() {
        match scheduler {
            // Whoever spawned this gave it its own settings
            Some(mut scheduler) => scheduler.attach(role),
            None => {
                let mut scheduler = EntityScheduler::<T>::new(*settings);
                scheduler.attach(role);
                commands.entity(entity).insert(scheduler);
            }
        }

        debug!("Attached {} to {entity:?} as {role:?}", std::any::type_name::<T>());
    }
}

fn report_missing_role<T: ReplicatedEntity>(scheduler: &mut EntityScheduler<T>, error: MissingRoleError) {
    if scheduler.should_report_missing_role() {
        warn!(
            "{error} - its {} hooks will not run until it is re-attached.",
            std::any::type_name::<T>()
        );
    }
}

fn dispatch_update<T: ReplicatedEntity>(
    time: Res<Time>,
    local_player: Res<LocalPlayer>,
    mut q_replicated: Query<(Entity, &mut T, &mut EntityScheduler<T>)>,
) {
    let now = time.elapsed_secs_f64();

    for (entity, component, mut scheduler) in q_replicated.iter_mut() {
        let target = DispatchTarget {
            entity,
            component,
            local_player: local_player.entity(),
        };

        if let Err(e) = scheduler.tick(now, target) {
            report_missing_role(&mut scheduler, e);
        }
    }
}

fn dispatch_late_update<T: ReplicatedEntity>(
    time: Res<Time>,
    local_player: Res<LocalPlayer>,
    mut q_replicated: Query<(Entity, &mut T, &mut EntityScheduler<T>)>,
) {
    let now = time.elapsed_secs_f64();

    for (entity, component, mut scheduler) in q_replicated.iter_mut() {
        let target = DispatchTarget {
            entity,
            component,
            local_player: local_player.entity(),
        };

        if let Err(e) = scheduler.late_tick(now, target) {
            report_missing_role(&mut scheduler, e);
        }
    }
}

/// `Time` is the fixed clock while this runs
fn dispatch_fixed_update<T: ReplicatedEntity>(
    time: Res<Time>,
    local_player: Res<LocalPlayer>,
    mut q_replicated: Query<(Entity, &mut T, &mut EntityScheduler<T>)>,
) {
    let now = time.elapsed_secs_f64();

    for (entity, component, mut scheduler) in q_replicated.iter_mut() {
        let target = DispatchTarget {
            entity,
            component,
            local_player: local_player.entity(),
        };

        if let Err(e) = scheduler.fixed_tick(now, target) {
            report_missing_role(&mut scheduler, e);
        }
    }
}

pub(super) fn add_replicated_systems<T: ReplicatedEntity>(app: &mut App) {
    app.add_systems(
        PreUpdate,
        (detach_replicated::<T>, attach_replicated::<T>).chain().in_set(SyncSet::Attach),
    )
    .add_systems(Update, dispatch_update::<T>.in_set(SyncSet::ThrottledUpdate))
    .add_systems(PostUpdate, dispatch_late_update::<T>.in_set(SyncSet::LateUpdate))
    .add_systems(FixedUpdate, dispatch_fixed_update::<T>.in_set(SyncSet::FixedStep));
}
