//! Applies [`ScriptCmd`]s to an area world.
//!
//! Lua chunks queue commands while they run; the queue is applied here right
//! after the chunk returns. Commands naming entities that no longer exist are
//! dropped with a warning.

use bevy_ecs::prelude::*;
use log::warn;

use crate::coords::{ICoord, IVec2, VICoord};
use crate::resources::redraw::RedrawRequest;
use crate::resources::script::ScriptCmd;
use crate::resources::soundqueue::SoundQueue;
use crate::resources::tile::TileFlag;
use crate::resources::tilegrid::TileGrid;
use crate::resources::timer::Timers;
use crate::systems::movement;
use crate::systems::spawn::despawn_actor;

fn live_entity(world: &World, entity_id: u64) -> Option<Entity> {
    let entity = Entity::from_bits(entity_id);
    if world.get_entity(entity).is_ok() {
        Some(entity)
    } else {
        warn!("script command for unknown entity {}", entity_id);
        None
    }
}

pub fn apply_script_command(world: &mut World, cmd: ScriptCmd) {
    match cmd {
        ScriptCmd::MoveByTile { entity_id, dx, dy } => {
            if let Some(entity) = live_entity(world, entity_id) {
                movement::move_by_tile(world, entity, IVec2::new(dx, dy));
            }
        }
        ScriptCmd::Teleport { entity_id, x, y, z } => {
            if let Some(entity) = live_entity(world, entity_id) {
                movement::teleport(world, entity, VICoord::new(x, y, z));
            }
        }
        ScriptCmd::Despawn { entity_id } => {
            if let Some(entity) = live_entity(world, entity_id) {
                despawn_actor(world, entity);
            }
        }
        ScriptCmd::SetPhase { entity_id, phase } => {
            if let Some(entity) = live_entity(world, entity_id)
                && !movement::set_phase(world, entity, &phase)
            {
                warn!("entity {} has no phase '{}'", entity_id, phase);
            }
        }
        ScriptCmd::SetSpeed {
            entity_id,
            multiplier,
        } => {
            if let Some(entity) = live_entity(world, entity_id) {
                movement::set_speed_multiplier(world, entity, multiplier);
            }
        }
        ScriptCmd::SetFrozen { entity_id, frozen } => {
            if let Some(entity) = live_entity(world, entity_id) {
                movement::set_frozen(world, entity, frozen);
            }
        }
        ScriptCmd::SetTileFlag { x, y, z, flag, on } => {
            let flag = match flag.parse::<TileFlag>() {
                Ok(flag) => flag,
                Err(e) => {
                    warn!("{}", e);
                    return;
                }
            };
            let mut grid = world.resource_mut::<TileGrid>();
            match grid.tile_mut(ICoord::new(x, y, z)) {
                Some(tile) => {
                    tile.flags.manip().set(flag, on);
                }
                None => warn!("no tile at ({}, {}, {})", x, y, z),
            }
        }
        ScriptCmd::PlaySound { name } => {
            if let Some(mut sounds) = world.get_resource_mut::<SoundQueue>() {
                sounds.play(name);
            }
        }
        ScriptCmd::RequestRedraw => {
            if let Some(mut redraw) = world.get_resource_mut::<RedrawRequest>() {
                redraw.request();
            }
        }
        ScriptCmd::TimerRun { name, running } => {
            if let Some(mut timers) = world.get_resource_mut::<Timers>() {
                timers.entry(&name).set_running(running);
            }
        }
        ScriptCmd::TimerReset { name } => {
            if let Some(mut timers) = world.get_resource_mut::<Timers>() {
                timers.entry(&name).reset();
            }
        }
    }
}
