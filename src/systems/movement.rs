//! Tile movement.
//!
//! Moves are attempted with [`move_by_tile`]. What happens next depends on the
//! discipline in [`EngineConfig::movement_mode`]:
//!
//! - `Turn`: the move is resolved inside the call. Leave scripts fire, the
//!   entity is relocated and enter scripts fire before it returns.
//! - `Tile`: the entity starts gliding and [`update_glide`] carries it to the
//!   destination over the following steps.
//! - `NoTile`: a free glide of one tile's worth of pixels with no collision
//!   and no triggers. Overlays always move this way.
//!
//! Scripts fired along the way may teleport or despawn the mover. After every
//! script the mover is checked against where it should be; if it was moved
//! elsewhere the rest of the move is abandoned.
//!
//! [`EngineConfig::movement_mode`]: crate::resources::engineconfig::EngineConfig

use bevy_ecs::prelude::*;
use log::{debug, warn};
use smallvec::{SmallVec, smallvec};

use crate::components::actor::{Actor, ActorKind};
use crate::components::inputcontrolled::InputControlled;
use crate::components::mapposition::MapPosition;
use crate::components::motion::{Facing, Motion, MotionState, Speed};
use crate::components::sprite::{Sprite, moving_phase, standing_phase};
use crate::coords::{ICoord, IVec2, RCoord, VICoord};
use crate::resources::engineconfig::{EngineConfig, MovementMode};
use crate::resources::pendingexit::{ExitRequest, PendingExit};
use crate::resources::redraw::RedrawRequest;
use crate::resources::soundqueue::SoundQueue;
use crate::resources::tile::{Exit, ExitSlot, TileTrigger};
use crate::resources::tilegrid::TileGrid;
use crate::resources::worldtime::WorldTime;
use crate::systems::spawn::despawn_actor;
use crate::systems::triggers::{EntityHook, run_entity_hook, run_tile_script};

/// Bearing components closer to zero than this are treated as zero.
const TRIG_EPSILON: f64 = 1e-6;

/// A resolved tile step.
#[derive(Debug, Clone, Copy)]
struct Step {
    from_tile: ICoord,
    dest_tile: Option<ICoord>,
    dest_coord: RCoord,
}

pub fn movement_mode(world: &World) -> MovementMode {
    world
        .get_resource::<EngineConfig>()
        .map(|c| c.movement_mode)
        .unwrap_or_default()
}

fn now(world: &World) -> u64 {
    world
        .get_resource::<WorldTime>()
        .map(|t| t.now_ms)
        .unwrap_or_default()
}

fn request_redraw(world: &mut World) {
    if let Some(mut redraw) = world.get_resource_mut::<RedrawRequest>() {
        redraw.request();
    }
}

fn is_alive(world: &World, entity: Entity) -> bool {
    world.get_entity(entity).is_ok()
}

/// True if `entity` is alive and standing at `expected`.
fn on_course(world: &World, entity: Entity, expected: RCoord) -> bool {
    world
        .get::<MapPosition>(entity)
        .is_some_and(|p| p.pos == expected)
}

/// Switch the sprite phase, requesting a redraw if the picture changed.
fn show_phase(world: &mut World, entity: Entity, name: &str) {
    let now = now(world);
    let changed = world
        .get_mut::<Sprite>(entity)
        .is_some_and(|mut s| s.set_phase(name, now));
    if changed {
        request_redraw(world);
    }
}

fn current_facing(world: &World, entity: Entity) -> IVec2 {
    world
        .get::<Facing>(entity)
        .map(|f| f.0)
        .unwrap_or_default()
}

// --- attempting moves ---------------------------------------------------

/// Attempt a one-tile move in the direction of `delta`.
///
/// Only the sign of each component counts, so a move never skips tiles.
/// Returns true if the move was started (or, under the stepped discipline,
/// applied). A refused move only turns the entity to face `delta`.
pub fn move_by_tile(world: &mut World, entity: Entity, delta: IVec2) -> bool {
    if delta.is_zero() {
        return false;
    }
    let Some((kind, frozen)) = world.get::<Actor>(entity).map(|a| (a.kind, a.frozen)) else {
        return false;
    };
    let Some(gliding) = world.get::<Motion>(entity).map(Motion::is_gliding) else {
        return false;
    };
    if gliding || frozen {
        return false;
    }

    let facing = delta.signum();
    if let Some(mut f) = world.get_mut::<Facing>(entity) {
        f.0 = facing;
    }

    let mode = movement_mode(world);
    if kind == ActorKind::Overlay || mode == MovementMode::NoTile {
        return start_free_glide(world, entity, facing);
    }

    match resolve_step(world, entity, facing) {
        Some(step) => {
            pre_move(world, entity, facing, step, mode);
            true
        }
        None => {
            if let Some(mut motion) = world.get_mut::<Motion>(entity) {
                motion.still_moving = false;
            }
            show_phase(world, entity, &standing_phase(facing));
            false
        }
    }
}

/// Hold a movement direction and step toward it if idle.
///
/// Entities without held-key input just attempt the move.
pub fn start_movement(world: &mut World, entity: Entity, dir: IVec2) -> bool {
    if let Some(mut input) = world.get_mut::<InputControlled>(entity) {
        input.press(dir);
    }
    let idle = world.get::<Motion>(entity).is_some_and(|m| !m.is_gliding());
    idle && move_by_tile(world, entity, dir)
}

/// Release a held movement direction. A glide in progress still completes.
pub fn stop_movement(world: &mut World, entity: Entity, dir: IVec2) {
    if let Some(mut input) = world.get_mut::<InputControlled>(entity) {
        input.release(dir);
    }
}

/// Whether `entity` may step onto the physical tile `dest`.
///
/// The tile must be in bounds, free of walk-blocking flags that apply to the
/// entity, and not occupied by another colliding entity. Overlays may go
/// anywhere in bounds.
pub fn can_move(world: &mut World, entity: Entity, dest: ICoord) -> bool {
    let grid = world.resource::<TileGrid>();
    if !grid.in_bounds(dest) {
        return false;
    }
    let Some(actor) = world.get::<Actor>(entity) else {
        return false;
    };
    if !actor.collides() {
        return true;
    }
    let blocked = actor
        .nowalk_flags()
        .iter()
        .any(|flag| actor.is_blocked_by(*flag) && grid.has_flag(dest, *flag));
    if blocked {
        return false;
    }
    !is_occupied(world, entity, dest)
}

/// True if a colliding entity other than `except` stands on or is gliding
/// into or out of `dest`.
fn is_occupied(world: &mut World, except: Entity, dest: ICoord) -> bool {
    let mut query = world.query::<(Entity, &Actor, &MapPosition, &Motion)>();
    let grid = world.resource::<TileGrid>();
    let dest = grid.wrap(dest);
    query.iter(world).any(|(e, actor, pos, motion)| {
        if e == except || !actor.collides() {
            return false;
        }
        if motion.is_gliding() {
            motion.from_tile == Some(dest) || motion.dest_tile == Some(dest)
        } else {
            let virt = grid.real_to_virt(pos.pos);
            grid.try_index_of(virt.z)
                .is_some_and(|z| grid.wrap(ICoord::new(virt.x, virt.y, z)) == dest)
        }
    })
}

/// Work out where a tile move by `delta` would go, or `None` if it is refused.
fn resolve_step(world: &mut World, entity: Entity, delta: IVec2) -> Option<Step> {
    let pos = world.get::<MapPosition>(entity)?.pos;
    let facing = delta.signum();

    let (here, candidates, side_exit) = {
        let grid = world.resource::<TileGrid>();
        let here = grid.wrap(grid.real_to_phys(pos));
        let current = grid.tile(here);
        let ahead = here.offset(delta);
        let mut candidates: SmallVec<[ICoord; 2]> = smallvec![ahead];
        if let Some(depth) = current.and_then(|t| t.layermod_at(facing)) {
            candidates.push(ICoord::new(ahead.x, ahead.y, grid.index_of(depth)));
        }
        let side_exit = current.is_some_and(|t| t.exit_at(facing).is_some());
        (here, candidates, side_exit)
    };

    for candidate in &candidates {
        let in_bounds = world.resource::<TileGrid>().in_bounds(*candidate);
        let allowed = if in_bounds {
            can_move(world, entity, *candidate)
        } else {
            side_exit
        };
        if !allowed {
            debug!("move from {} to {} refused", here, candidate);
            return None;
        }
    }

    let dest = *candidates.last()?;
    let grid = world.resource::<TileGrid>();
    let dim = grid.tile_dimensions();
    Some(Step {
        from_tile: here,
        dest_tile: grid.in_bounds(dest).then(|| grid.wrap(dest)),
        dest_coord: RCoord::new(
            f64::from(dest.x * dim.x),
            f64::from(dest.y * dim.y),
            grid.depth_of(dest.z),
        ),
    })
}

fn start_free_glide(world: &mut World, entity: Entity, delta: IVec2) -> bool {
    let Some(pos) = world.get::<MapPosition>(entity).map(|p| p.pos) else {
        return false;
    };
    let dim = world.resource::<TileGrid>().tile_dimensions();
    let dest = RCoord::new(
        pos.x + f64::from(delta.x * dim.x),
        pos.y + f64::from(delta.y * dim.y),
        pos.z,
    );
    if let Some(mut motion) = world.get_mut::<Motion>(entity) {
        let still_moving = motion.still_moving;
        *motion = Motion {
            state: MotionState::Gliding,
            from_coord: pos,
            dest_coord: dest,
            from_tile: None,
            dest_tile: None,
            delta,
            still_moving,
        };
    }
    show_phase(world, entity, &moving_phase(delta.signum()));
    true
}

fn pre_move(world: &mut World, entity: Entity, delta: IVec2, step: Step, mode: MovementMode) {
    let Some(from) = world.get::<MapPosition>(entity).map(|p| p.pos) else {
        return;
    };
    if let Some(mut motion) = world.get_mut::<Motion>(entity) {
        motion.from_coord = from;
        motion.dest_coord = step.dest_coord;
        motion.from_tile = Some(step.from_tile);
        motion.dest_tile = step.dest_tile;
        motion.delta = delta;
        motion.state = match mode {
            MovementMode::Turn => MotionState::Idle,
            _ => MotionState::Gliding,
        };
    }

    // The mover shows on the destination layer straight away.
    let expected = RCoord::new(from.x, from.y, step.dest_coord.z);
    if let Some(mut pos) = world.get_mut::<MapPosition>(entity) {
        pos.pos = expected;
    }
    if mode != MovementMode::Turn {
        show_phase(world, entity, &moving_phase(delta.signum()));
    }

    run_entity_hook(world, entity, EntityHook::TileExit, Some(step.from_tile));
    if !on_course(world, entity, expected) {
        return;
    }
    run_tile_script(world, TileTrigger::Leave, step.from_tile, Some(entity));
    if !on_course(world, entity, expected) {
        return;
    }

    if mode == MovementMode::Turn {
        arrive(world, entity, step.dest_coord);
        post_move(world, entity);
    }
}

fn arrive(world: &mut World, entity: Entity, dest: RCoord) {
    let wrapped = world.resource::<TileGrid>().wrap_real(dest);
    if let Some(mut pos) = world.get_mut::<MapPosition>(entity) {
        pos.pos = wrapped;
    }
    request_redraw(world);
}

/// Finish a move: settle the phase, fire arrival scripts, take exits and
/// continue held movement.
fn post_move(world: &mut World, entity: Entity) {
    let mode = movement_mode(world);
    let Some(motion) = world.get::<Motion>(entity).cloned() else {
        return;
    };
    let Some((kind, step_sound)) = world
        .get::<Actor>(entity)
        .map(|a| (a.kind, a.sound("step").map(str::to_string)))
    else {
        return;
    };
    let held = match mode {
        MovementMode::Turn => None,
        _ => world.get::<InputControlled>(entity).and_then(InputControlled::current),
    };

    if let Some(mut m) = world.get_mut::<Motion>(entity) {
        m.state = MotionState::Idle;
        m.still_moving = held.is_some();
    }
    if held.is_none() {
        let facing = current_facing(world, entity);
        show_phase(world, entity, &standing_phase(facing));
    }

    if let Some(dest) = motion.dest_tile {
        if let (Some(sound), Some(mut queue)) = (step_sound, world.get_resource_mut::<SoundQueue>()) {
            queue.play(sound);
        }
        let Some(expected) = world.get::<MapPosition>(entity).map(|p| p.pos) else {
            return;
        };
        run_tile_script(world, TileTrigger::Enter, dest, Some(entity));
        if !on_course(world, entity, expected) {
            return;
        }
        run_entity_hook(world, entity, EntityHook::TileEntry, Some(dest));
        if !on_course(world, entity, expected) {
            return;
        }
    }

    if let Some(exit) = exit_taken(world, &motion) {
        match kind {
            ActorKind::Npc => {
                debug!("NPC took an exit to '{}' and leaves the area", exit.area);
                despawn_actor(world, entity);
                return;
            }
            ActorKind::Player => {
                debug!("player takes exit to '{}' at {}", exit.area, exit.coords);
                if let Some(mut pending) = world.get_resource_mut::<PendingExit>() {
                    pending.0 = Some(ExitRequest {
                        entity,
                        exit,
                        rollback: motion.from_coord,
                    });
                }
                return;
            }
            ActorKind::Overlay => {}
        }
    }

    if let Some(dir) = held {
        move_by_tile(world, entity, dir);
    }
}

/// The exit a finished tile move goes through: the normal exit of the
/// destination, else the origin's side exit in the direction of travel.
fn exit_taken(world: &World, motion: &Motion) -> Option<Exit> {
    let grid = world.get_resource::<TileGrid>()?;
    let from = motion.from_tile?;
    motion
        .dest_tile
        .and_then(|d| grid.tile(d))
        .and_then(|t| t.exit(ExitSlot::Normal))
        .or_else(|| grid.tile(from).and_then(|t| t.exit_at(motion.delta.signum())))
        .cloned()
}

// --- gliding --------------------------------------------------------------

/// Advance a gliding entity by `dt_ms` milliseconds.
///
/// A glide that ends partway through the step carries the unused time into
/// the next glide if arrival re-armed movement.
pub fn update_glide(world: &mut World, entity: Entity, dt_ms: u64) {
    let tile_width = world.resource::<TileGrid>().tile_dimensions().x;
    let mut left = dt_ms as f64;
    while left > 0.0 {
        let Some(motion) = world.get::<Motion>(entity) else {
            break;
        };
        if !motion.is_gliding() {
            break;
        }
        let dest = motion.dest_coord;
        let Some(speed) = world.get::<Speed>(entity).map(|s| s.px_per_ms(tile_width)) else {
            break;
        };
        let Some(pos) = world.get::<MapPosition>(entity).map(|p| p.pos) else {
            break;
        };
        if speed <= 0.0 {
            break;
        }

        let dist = pos.distance_xy(dest);
        let reach = speed * left;
        if dist <= reach {
            left -= dist / speed;
            arrive(world, entity, dest);
            post_move(world, entity);
        } else {
            let bearing = (dest.y - pos.y).atan2(dest.x - pos.x);
            let step = RCoord::new(snap(bearing.cos()) * reach, snap(bearing.sin()) * reach, 0.0);
            if let Some(mut p) = world.get_mut::<MapPosition>(entity) {
                p.pos = p.pos + step;
            }
            request_redraw(world);
            left = 0.0;
        }
    }
}

fn snap(v: f64) -> f64 {
    if v.abs() < TRIG_EPSILON { 0.0 } else { v }
}

// --- direct placement -----------------------------------------------------

/// Place the entity on a virtual tile, cancelling any glide.
///
/// Refused if the tile is out of bounds, on an unknown layer or not walkable
/// for the entity. No triggers fire.
pub fn teleport(world: &mut World, entity: Entity, dest: VICoord) -> bool {
    let phys = {
        let grid = world.resource::<TileGrid>();
        if !grid.in_bounds_virt(dest) {
            warn!("teleport to {} is outside the area", dest);
            return false;
        }
        grid.virt_to_phys(grid.wrap_virt(dest))
    };
    if !can_move(world, entity, phys) {
        debug!("teleport to {} refused", dest);
        return false;
    }
    set_position_phys(world, entity, phys);
    true
}

/// Pixel position.
pub fn position_real(world: &World, entity: Entity) -> Option<RCoord> {
    world.get::<MapPosition>(entity).map(|p| p.pos)
}

/// Tile under the entity's top-left corner, with its layer depth.
pub fn position_virt(world: &World, entity: Entity) -> Option<VICoord> {
    let pos = position_real(world, entity)?;
    Some(world.resource::<TileGrid>().real_to_virt(pos))
}

/// Physical tile under the entity's top-left corner.
///
/// # Panics
///
/// If the entity stands on an unregistered layer depth.
pub fn position_phys(world: &World, entity: Entity) -> Option<ICoord> {
    let pos = position_real(world, entity)?;
    Some(world.resource::<TileGrid>().real_to_phys(pos))
}

/// Set the pixel position unchecked, cancelling any glide.
pub fn set_position_real(world: &mut World, entity: Entity, pos: RCoord) {
    match world.get_mut::<MapPosition>(entity) {
        Some(mut p) => p.pos = pos,
        None => return,
    }
    let was_gliding = world.get_mut::<Motion>(entity).is_some_and(|mut m| {
        let gliding = m.is_gliding();
        m.state = MotionState::Idle;
        m.still_moving = false;
        gliding
    });
    if was_gliding {
        let facing = current_facing(world, entity);
        show_phase(world, entity, &standing_phase(facing));
    }
    request_redraw(world);
}

pub fn set_position_virt(world: &mut World, entity: Entity, pos: VICoord) {
    let real = world.resource::<TileGrid>().virt_to_real(pos);
    set_position_real(world, entity, real);
}

pub fn set_position_phys(world: &mut World, entity: Entity, pos: ICoord) {
    let real = world.resource::<TileGrid>().phys_to_real(pos);
    set_position_real(world, entity, real);
}

// --- facing, speed and phase ---------------------------------------------

pub fn facing(world: &World, entity: Entity) -> Option<IVec2> {
    world.get::<Facing>(entity).map(|f| f.0)
}

/// Face along `dir` (clamped to a compass direction). An idle entity also
/// switches to the matching standing phase.
pub fn set_facing(world: &mut World, entity: Entity, dir: IVec2) {
    let facing = dir.signum();
    match world.get_mut::<Facing>(entity) {
        Some(mut f) => f.0 = facing,
        None => return,
    }
    if world.get::<Motion>(entity).is_some_and(|m| !m.is_gliding()) {
        show_phase(world, entity, &standing_phase(facing));
    }
}

pub fn speed(world: &World, entity: Entity) -> Option<Speed> {
    world.get::<Speed>(entity).copied()
}

pub fn set_speed_multiplier(world: &mut World, entity: Entity, multiplier: f64) {
    if let Some(mut speed) = world.get_mut::<Speed>(entity) {
        speed.multiplier = multiplier.max(0.0);
    }
}

pub fn phase(world: &World, entity: Entity) -> Option<String> {
    world.get::<Sprite>(entity).map(|s| s.phase().to_string())
}

/// Show a named phase. Returns false if the sprite has no such phase.
pub fn set_phase(world: &mut World, entity: Entity, name: &str) -> bool {
    if !world.get::<Sprite>(entity).is_some_and(|s| s.has_phase(name)) {
        return false;
    }
    show_phase(world, entity, name);
    true
}

pub fn set_frozen(world: &mut World, entity: Entity, frozen: bool) {
    if let Some(mut actor) = world.get_mut::<Actor>(entity) {
        actor.frozen = frozen;
    }
}

pub fn is_moving(world: &World, entity: Entity) -> bool {
    is_alive(world, entity) && world.get::<Motion>(entity).is_some_and(Motion::is_gliding)
}
