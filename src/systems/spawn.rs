//! Creating, removing and transferring map entities.
//!
//! Every spawned entity is registered in the area's [`Roster`]; despawning
//! runs the entity's delete script, deregisters it and only then frees it.

use bevy_ecs::prelude::*;
use log::{debug, info};

use crate::components::actor::{Actor, ActorKind};
use crate::components::entityscripts::EntityScripts;
use crate::components::inputcontrolled::InputControlled;
use crate::components::mapposition::MapPosition;
use crate::components::motion::{Facing, Motion, Speed};
use crate::components::sprite::{Sprite, standing_phase};
use crate::components::wander::Wander;
use crate::coords::{IVec2, VICoord};
use crate::resources::pendingexit::PendingExit;
use crate::resources::redraw::RedrawRequest;
use crate::resources::roster::Roster;
use crate::resources::script::ScriptBinding;
use crate::resources::tilegrid::TileGrid;
use crate::resources::viewport::Viewport;
use crate::resources::worldtime::WorldTime;
use crate::systems::triggers::run_script;

/// Everything needed to put an entity on the map.
#[derive(Debug, Clone)]
pub struct ActorSpawn {
    pub kind: ActorKind,
    pub descriptor: String,
    pub position: VICoord,
    pub facing: IVec2,
    pub sprite: Sprite,
    /// Initial phase. Defaults to the standing phase of `facing`.
    pub phase: Option<String>,
    /// Tiles per second.
    pub speed: f64,
    pub scripts: EntityScripts,
    pub wander: Option<Wander>,
    pub sounds: Vec<(String, String)>,
}

impl ActorSpawn {
    pub fn new(kind: ActorKind, descriptor: impl Into<String>, position: VICoord) -> Self {
        Self {
            kind,
            descriptor: descriptor.into(),
            position,
            facing: IVec2::DOWN,
            sprite: Sprite::default(),
            phase: None,
            speed: 1.0,
            scripts: EntityScripts::default(),
            wander: None,
            sounds: Vec::new(),
        }
    }

    pub fn with_sprite(mut self, sprite: Sprite) -> Self {
        self.sprite = sprite;
        self
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    pub fn with_facing(mut self, facing: IVec2) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_scripts(mut self, scripts: EntityScripts) -> Self {
        self.scripts = scripts;
        self
    }

    pub fn with_wander(mut self, wander: Wander) -> Self {
        self.wander = Some(wander);
        self
    }

    pub fn with_sound(mut self, event: impl Into<String>, sound: impl Into<String>) -> Self {
        self.sounds.push((event.into(), sound.into()));
        self
    }
}

/// Spawn an entity and register it with the area.
///
/// # Panics
///
/// If `spawn.position` names an unregistered layer depth.
pub fn spawn_actor(world: &mut World, spawn: ActorSpawn) -> Entity {
    let pos = world.resource::<TileGrid>().virt_to_real(spawn.position);
    let mut actor = Actor::new(spawn.kind, spawn.descriptor);
    actor.sounds.extend(spawn.sounds);
    let facing = if spawn.facing.is_zero() {
        Facing::default()
    } else {
        Facing::toward(spawn.facing)
    };
    let kind = actor.kind;

    let entity = world
        .spawn((
            actor,
            MapPosition::new(pos),
            facing,
            Motion::default(),
            Speed::new(spawn.speed),
            spawn.sprite,
            spawn.scripts,
        ))
        .id();
    if kind == ActorKind::Player {
        world.entity_mut(entity).insert(InputControlled::default());
    }
    if let Some(wander) = spawn.wander {
        world.entity_mut(entity).insert(wander);
    }

    let phase = spawn.phase.unwrap_or_else(|| standing_phase(facing.0));
    let now = world.resource::<WorldTime>().now_ms;
    if let Some(mut sprite) = world.get_mut::<Sprite>(entity) {
        sprite.set_phase(&phase, now);
    }
    world.resource_mut::<Roster>().register(kind, entity);
    world.resource_mut::<RedrawRequest>().request();
    debug!("spawned {:?} {} at {}", kind, entity, spawn.position);
    entity
}

/// Remove an entity from the area.
///
/// The delete script runs first, with the entity still alive. Returns false
/// if the entity was already gone.
pub fn despawn_actor(world: &mut World, entity: Entity) -> bool {
    if world.get_entity(entity).is_err() {
        return false;
    }
    let on_delete: Option<ScriptBinding> = world
        .get_mut::<EntityScripts>(entity)
        .and_then(|mut s| s.on_delete.take());
    if let Some(binding) = on_delete {
        run_script(world, &binding, Some(entity), None);
        if world.get_entity(entity).is_err() {
            return true;
        }
    }

    world.resource_mut::<Roster>().deregister(entity);
    if let Some(mut viewport) = world.get_resource_mut::<Viewport>() {
        viewport.forget(entity);
    }
    if let Some(mut pending) = world.get_resource_mut::<PendingExit>()
        && pending.0.as_ref().is_some_and(|req| req.entity == entity)
    {
        pending.0 = None;
    }
    world.despawn(entity);
    world.resource_mut::<RedrawRequest>().request();
    debug!("despawned {}", entity);
    true
}

/// Take `entity` out of the area without running its delete script, keeping
/// what is needed to restore it elsewhere.
pub fn detach_actor(world: &mut World, entity: Entity) -> Option<ActorSnapshot> {
    let snapshot = ActorSnapshot::capture(world, entity)?;
    world.resource_mut::<Roster>().deregister(entity);
    if let Some(mut viewport) = world.get_resource_mut::<Viewport>() {
        viewport.forget(entity);
    }
    world.despawn(entity);
    world.resource_mut::<RedrawRequest>().request();
    debug!("detached {}", entity);
    Some(snapshot)
}

/// The components of an entity that survive a move to another area.
#[derive(Debug, Clone)]
pub struct ActorSnapshot {
    actor: Actor,
    facing: Facing,
    speed: Speed,
    sprite: Sprite,
    scripts: EntityScripts,
    input: Option<InputControlled>,
}

impl ActorSnapshot {
    /// Copy the transferable state of `entity`.
    pub fn capture(world: &World, entity: Entity) -> Option<Self> {
        Some(Self {
            actor: world.get::<Actor>(entity)?.clone(),
            facing: world.get::<Facing>(entity).copied().unwrap_or_default(),
            speed: world.get::<Speed>(entity).copied().unwrap_or_default(),
            sprite: world.get::<Sprite>(entity).cloned().unwrap_or_default(),
            scripts: world.get::<EntityScripts>(entity).cloned().unwrap_or_default(),
            input: world.get::<InputControlled>(entity).cloned(),
        })
    }

    /// Spawn the captured entity in `world` at `position`, idle.
    ///
    /// # Panics
    ///
    /// If `position` names an unregistered layer depth.
    pub fn restore(self, world: &mut World, position: VICoord) -> Entity {
        let pos = world.resource::<TileGrid>().virt_to_real(position);
        let kind = self.actor.kind;
        let entity = world
            .spawn((
                self.actor,
                MapPosition::new(pos),
                self.facing,
                Motion::default(),
                self.speed,
                self.sprite,
                self.scripts,
            ))
            .id();
        if let Some(input) = self.input {
            world.entity_mut(entity).insert(input);
        }
        world.resource_mut::<Roster>().register(kind, entity);
        world.resource_mut::<RedrawRequest>().request();
        info!("{:?} arrives at {}", kind, position);
        entity
    }
}
