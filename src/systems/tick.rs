//! Per-step entity updates.

use bevy_ecs::prelude::*;

use crate::components::inputcontrolled::InputControlled;
use crate::components::motion::Motion;
use crate::resources::engineconfig::MovementMode;
use crate::resources::roster::Roster;
use crate::systems::movement::{move_by_tile, movement_mode, update_glide};
use crate::systems::triggers::{EntityHook, run_entity_hook};
use crate::systems::wander::wander_step;

/// Update one entity: its update script, wander AI, held keys, then its glide.
pub fn update_entity(world: &mut World, entity: Entity, dt_ms: u64) {
    run_entity_hook(world, entity, EntityHook::Update, None);
    if world.get_entity(entity).is_err() {
        return;
    }
    wander_step(world, entity, dt_ms);

    let idle = world.get::<Motion>(entity).is_some_and(|m| !m.is_gliding());
    let held = world
        .get::<InputControlled>(entity)
        .and_then(InputControlled::current);
    if let (true, Some(dir)) = (idle, held) {
        move_by_tile(world, entity, dir);
    }

    update_glide(world, entity, dt_ms);
}

/// Update overlays, then characters, then the player.
///
/// Under the stepped discipline characters and the player are skipped: their
/// moves resolve inside the input call.
pub fn update_entities(world: &mut World, dt_ms: u64) {
    let stepped = movement_mode(world) == MovementMode::Turn;
    let roster = world.resource::<Roster>();
    let mut order = roster.overlays().to_vec();
    if !stepped {
        order.extend_from_slice(roster.characters());
        order.extend(roster.player());
    }
    for entity in order {
        if world.get_entity(entity).is_ok() {
            update_entity(world, entity, dt_ms);
        }
    }
}
