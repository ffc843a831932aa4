//! Lua scripts bound through area descriptors.
#![cfg(feature = "lua")]

use std::path::Path;

use bevy_ecs::prelude::*;

use tilewalk::area::Area;
use tilewalk::components::actor::ActorKind;
use tilewalk::coords::{ICoord, IVec2, VICoord};
use tilewalk::descriptor::AreaDescriptor;
use tilewalk::resources::engineconfig::{EngineConfig, MovementMode};
use tilewalk::resources::script::LuaRuntime;
use tilewalk::resources::tile::TileFlag;
use tilewalk::systems::movement;
use tilewalk::systems::spawn::ActorSpawn;

fn scripted_strip(on_enter: &str) -> Area {
    let json = serde_json::json!({
        "width": 4,
        "height": 1,
        "tile_types": [
            { "frames": ["floor"] },
            { "frames": ["puddle"], "scripts": { "on_enter": { "inline": on_enter } } }
        ],
        "layers": [ { "depth": 0.0, "cells": [0, 1, 0, 0] } ],
        "scripts": { "on_load": { "inline": "engine.timer_start('clock')" } }
    });
    let desc: AreaDescriptor = serde_json::from_value(json).unwrap();
    let mut config = EngineConfig::default();
    config.movement_mode = MovementMode::Turn;
    let mut area = desc.build("strip", &config, Path::new(".")).unwrap();
    area.install_lua(LuaRuntime::new().unwrap());
    area
}

fn walk_right(area: &mut Area) -> Entity {
    let player = area.spawn(ActorSpawn::new(ActorKind::Player, "hero", VICoord::new(0, 0, 0.0)));
    area.focus();
    assert!(movement::move_by_tile(area.world_mut(), player, IVec2::RIGHT));
    player
}

#[test]
fn enter_script_queues_a_sound() {
    let mut area = scripted_strip("engine.play_sound('splash')");
    walk_right(&mut area);
    assert_eq!(area.drain_sounds(), vec!["splash".to_string()]);
}

#[test]
fn enter_script_can_teleport_the_mover() {
    let mut area = scripted_strip("engine.entity_teleport(entity, 3, 0, 0.0)");
    let player = walk_right(&mut area);
    assert_eq!(
        movement::position_virt(area.world(), player),
        Some(VICoord::new(3, 0, 0.0))
    );
}

#[test]
fn enter_script_can_change_tile_flags() {
    let mut area = scripted_strip("engine.tile_set_flag(tile.x + 1, tile.y, tile.z, 'nowalk')");
    let player = walk_right(&mut area);
    assert!(area.grid().has_flag(ICoord::new(2, 0, 0), TileFlag::Nowalk));
    assert!(!movement::move_by_tile(area.world_mut(), player, IVec2::RIGHT));
}

#[test]
fn load_hook_runs_once_and_starts_a_timer() {
    let mut area = scripted_strip("");
    area.focus();
    area.focus();
    area.tick(1500);
    let timers = area.world().resource::<tilewalk::resources::timer::Timers>();
    assert_eq!(timers.get("clock").map(|t| t.count()), Some(1.5));
}

#[test]
fn broken_scripts_are_rejected_at_load() {
    let json = serde_json::json!({
        "width": 1,
        "height": 1,
        "layers": [ { "depth": 0.0, "cells": [null] } ],
        "scripts": { "on_tick": { "inline": "this is not lua" } }
    });
    let desc: AreaDescriptor = serde_json::from_value(json).unwrap();
    assert!(desc.build("bad", &EngineConfig::default(), Path::new(".")).is_err());
}
