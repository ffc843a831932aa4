//! Script dispatch.
//!
//! Every script the engine fires goes through [`run_script`], which sets the
//! ambient bindings, runs the binding synchronously and applies the strictness
//! setting to failures. Tile triggers fire the instance script first, then the
//! type script.
//!
//! Scripts get the whole world and may despawn or move the entity that
//! triggered them. Callers must re-check the entity after every call.

use bevy_ecs::prelude::*;
use log::{debug, error};

use crate::components::actor::Actor;
use crate::components::entityscripts::EntityScripts;
use crate::coords::ICoord;
use crate::resources::areascripts::{AreaHook, AreaScripts};
use crate::resources::engineconfig::EngineConfig;
use crate::resources::script::{ScriptBinding, ScriptBindings, ScriptContext};
use crate::resources::tile::{TileFlag, TileTrigger};
use crate::resources::tilegrid::TileGrid;
use crate::resources::timer::Timers;

/// Which entity script to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityHook {
    Update,
    TileEntry,
    TileExit,
    Delete,
}

impl EntityHook {
    fn binding(self, scripts: &EntityScripts) -> Option<&ScriptBinding> {
        match self {
            EntityHook::Update => scripts.on_update.as_ref(),
            EntityHook::TileEntry => scripts.on_tile_entry.as_ref(),
            EntityHook::TileExit => scripts.on_tile_exit.as_ref(),
            EntityHook::Delete => scripts.on_delete.as_ref(),
        }
    }
}

/// Run one script with `entity` and `tile` bound.
///
/// Returns false if the script failed. With `halt_on_script_error` set a
/// failure is fatal.
pub fn run_script(
    world: &mut World,
    binding: &ScriptBinding,
    entity: Option<Entity>,
    tile: Option<ICoord>,
) -> bool {
    let area = world
        .get_resource::<AreaScripts>()
        .map(|a| a.area.clone())
        .unwrap_or_default();
    let timers = world
        .get_resource::<Timers>()
        .map(Timers::counts)
        .unwrap_or_default();
    debug!("running script '{}' in '{}'", binding.name(), area);
    let bindings = ScriptBindings {
        entity,
        tile,
        area,
        timers,
    };
    let mut ctx = ScriptContext::new(world, bindings);
    match binding.invoke(&mut ctx) {
        Ok(()) => true,
        Err(err) => {
            error!("script '{}' failed: {}", binding.name(), err);
            let strict = ctx
                .world
                .get_resource::<EngineConfig>()
                .is_some_and(|c| c.halt_on_script_error);
            if strict {
                panic!("script '{}' failed and halt_on_script_error is set", binding.name());
            }
            false
        }
    }
}

/// Fire an area hook, if bound.
pub fn run_area_hook(world: &mut World, hook: AreaHook) {
    let binding = world
        .get_resource::<AreaScripts>()
        .and_then(|s| s.get(hook).cloned());
    if let Some(binding) = binding {
        debug!("area hook {}", hook.name());
        run_script(world, &binding, None, None);
    }
}

/// Fire an entity script, if the entity is alive and has one bound.
pub fn run_entity_hook(world: &mut World, entity: Entity, hook: EntityHook, tile: Option<ICoord>) {
    let binding = world
        .get::<EntityScripts>(entity)
        .and_then(|s| hook.binding(s).cloned());
    if let Some(binding) = binding {
        run_script(world, &binding, Some(entity), tile);
    }
}

/// Fire the `trigger` scripts of the tile at `tile` for `mover`.
///
/// Tiles carrying a player-event or npc-event flag only react to movers of the
/// matching kind. A script on a tile or type with the temporary-event flag is
/// unbound from that tier once it has fired.
pub fn run_tile_script(
    world: &mut World,
    trigger: TileTrigger,
    tile: ICoord,
    mover: Option<Entity>,
) {
    let event_flag = mover
        .and_then(|e| world.get::<Actor>(e))
        .and_then(Actor::event_flag);

    let (instance, type_id, typed, filtered, temp_instance, temp_type) = {
        let Some(grid) = world.get_resource::<TileGrid>() else {
            return;
        };
        let Some(t) = grid.tile(tile) else {
            return;
        };
        let ty = t.type_id.and_then(|id| grid.tile_type(id));
        let filtered =
            grid.has_flag(tile, TileFlag::PlayerEvent) || grid.has_flag(tile, TileFlag::NpcEvent);
        (
            t.scripts.get(trigger).cloned(),
            t.type_id,
            ty.and_then(|ty| ty.scripts.get(trigger).cloned()),
            filtered,
            t.flags.contains(TileFlag::TempEvent),
            ty.is_some_and(|ty| ty.flags.contains(TileFlag::TempEvent)),
        )
    };

    let accepted = event_flag.is_some_and(|flag| world.resource::<TileGrid>().has_flag(tile, flag));
    if filtered && !accepted {
        debug!("{:?} script at {} filtered out for this mover", trigger, tile);
        return;
    }

    if let Some(binding) = instance {
        run_script(world, &binding, mover, Some(tile));
        if temp_instance {
            let mut grid = world.resource_mut::<TileGrid>();
            if let Some(t) = grid.tile_mut(tile) {
                *t.scripts.slot_mut(trigger) = None;
            }
        }
    }
    if let Some(binding) = typed {
        run_script(world, &binding, mover, Some(tile));
        if let (true, Some(id)) = (temp_type, type_id) {
            let mut grid = world.resource_mut::<TileGrid>();
            if let Some(ty) = grid.tile_type_mut(id) {
                *ty.scripts.slot_mut(trigger) = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::components::actor::ActorKind;
    use crate::coords::IVec2;
    use crate::resources::tile::TileType;

    fn world_with_grid() -> World {
        let mut world = World::new();
        let mut grid = TileGrid::new(3, 3, IVec2::new(16, 16));
        grid.push_layer(0.0);
        world.insert_resource(grid);
        world.insert_resource(AreaScripts::named("test"));
        world.insert_resource(EngineConfig::new());
        world
    }

    fn counter(name: &str, hits: &Arc<AtomicUsize>) -> ScriptBinding {
        let hits = Arc::clone(hits);
        ScriptBinding::native(name, move |_ctx| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn instance_then_type_scripts_fire() {
        let mut world = world_with_grid();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let (o1, o2) = (Arc::clone(&order), Arc::clone(&order));
        let mut ty = TileType::default();
        ty.scripts.on_enter = Some(ScriptBinding::native("type", move |_| {
            o2.lock().unwrap().push("type");
            Ok(())
        }));
        {
            let mut grid = world.resource_mut::<TileGrid>();
            let id = grid.add_type(ty);
            let tile = grid.tile_mut(ICoord::new(1, 1, 0)).unwrap();
            tile.type_id = Some(id);
            tile.scripts.on_enter = Some(ScriptBinding::native("instance", move |_| {
                o1.lock().unwrap().push("instance");
                Ok(())
            }));
        }

        run_tile_script(&mut world, TileTrigger::Enter, ICoord::new(1, 1, 0), None);
        assert_eq!(*order.lock().unwrap(), vec!["instance", "type"]);
    }

    #[test]
    fn event_flags_filter_movers() {
        let mut world = world_with_grid();
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let mut grid = world.resource_mut::<TileGrid>();
            let tile = grid.tile_mut(ICoord::new(0, 0, 0)).unwrap();
            tile.flags.manip().set_player_event(true);
            tile.scripts.on_enter = Some(counter("door", &hits));
        }
        let npc = world.spawn(Actor::new(ActorKind::Npc, "guard")).id();
        let player = world.spawn(Actor::new(ActorKind::Player, "hero")).id();

        run_tile_script(&mut world, TileTrigger::Enter, ICoord::new(0, 0, 0), Some(npc));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        run_tile_script(&mut world, TileTrigger::Enter, ICoord::new(0, 0, 0), Some(player));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn temporary_scripts_fire_once() {
        let mut world = world_with_grid();
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let mut grid = world.resource_mut::<TileGrid>();
            let tile = grid.tile_mut(ICoord::new(2, 2, 0)).unwrap();
            tile.flags.manip().set_temp_event(true);
            tile.scripts.on_use = Some(counter("chest", &hits));
        }
        for _ in 0..3 {
            run_tile_script(&mut world, TileTrigger::Use, ICoord::new(2, 2, 0), None);
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_scripts_are_logged_not_fatal() {
        let mut world = world_with_grid();
        let bad = ScriptBinding::native("bad", |_| Err(crate::error::ScriptError::failed("bad", "boom")));
        assert!(!run_script(&mut world, &bad, None, None));
    }

    #[test]
    #[should_panic(expected = "halt_on_script_error")]
    fn strict_mode_makes_failures_fatal() {
        let mut world = world_with_grid();
        world.resource_mut::<EngineConfig>().halt_on_script_error = true;
        let bad = ScriptBinding::native("bad", |_| Err(crate::error::ScriptError::failed("bad", "boom")));
        run_script(&mut world, &bad, None, None);
    }

    #[test]
    fn bindings_reach_the_script() {
        let mut world = world_with_grid();
        let seen = Arc::new(std::sync::Mutex::new(None));
        let s = Arc::clone(&seen);
        let probe = ScriptBinding::native("probe", move |ctx| {
            *s.lock().unwrap() = Some((ctx.tile(), ctx.area().to_string()));
            Ok(())
        });
        run_script(&mut world, &probe, None, Some(ICoord::new(1, 2, 0)));
        assert_eq!(
            *seen.lock().unwrap(),
            Some((Some(ICoord::new(1, 2, 0)), "test".to_string()))
        );
    }
}
