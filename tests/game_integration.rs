//! Integration tests for area transitions driven through `Game`.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tilewalk::area::Area;
use tilewalk::components::actor::ActorKind;
use tilewalk::coords::{IVec2, RCoord, VICoord};
use tilewalk::descriptor::AreaDescriptor;
use tilewalk::error::AreaError;
use tilewalk::game::Game;
use tilewalk::resources::engineconfig::{EngineConfig, MovementMode};
use tilewalk::resources::script::ScriptBinding;
use tilewalk::systems::movement;
use tilewalk::systems::spawn::ActorSpawn;

/// A 3x1 strip with one exit on `exit_x`.
fn strip(exit_x: i32, target: &str, tx: i32) -> AreaDescriptor {
    let json = serde_json::json!({
        "width": 3,
        "height": 1,
        "tile_types": [ { "frames": ["floor"] } ],
        "layers": [ { "depth": 0.0, "cells": [0, 0, 0] } ],
        "tiles": [ {
            "x": exit_x, "y": 0,
            "exits": [ { "slot": "normal", "area": target, "x": tx, "y": 0 } ]
        } ]
    });
    serde_json::from_value(json).unwrap()
}

fn config(mode: MovementMode) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.movement_mode = mode;
    config.start_area = "west".to_string();
    config.start_coords = VICoord::new(0, 0, 0.0);
    config
}

fn player() -> ActorSpawn {
    ActorSpawn::new(ActorKind::Player, "hero", VICoord::new(0, 0, 0.0)).with_speed(62.5)
}

#[derive(Default)]
struct Counters {
    loads: AtomicUsize,
    east_load_hook: AtomicUsize,
    east_focus_hook: AtomicUsize,
}

fn counting(name: &str, counters: &Arc<Counters>, pick: fn(&Counters) -> &AtomicUsize) -> ScriptBinding {
    let counters = Arc::clone(counters);
    ScriptBinding::native(name, move |_ctx| {
        pick(&counters).fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

/// "west" has an exit on its east end to "east" (1, 0); "east" has one on its
/// west end back to "west" (1, 0). Anything else fails to load.
fn world_loader(
    counters: Arc<Counters>,
) -> impl FnMut(&str, &EngineConfig) -> Result<Area, AreaError> {
    move |name: &str, config: &EngineConfig| {
        counters.loads.fetch_add(1, Ordering::SeqCst);
        match name {
            "west" => strip(2, "east", 1).build(name, config, Path::new(".")),
            "east" => {
                let mut area = strip(0, "west", 1).build(name, config, Path::new("."))?;
                area.scripts_mut().on_load =
                    Some(counting("load", &counters, |c| &c.east_load_hook));
                area.scripts_mut().on_focus =
                    Some(counting("focus", &counters, |c| &c.east_focus_hook));
                Ok(area)
            }
            "loop" => strip(2, "loop", 0).build(name, config, Path::new(".")),
            "dead_end" => strip(2, "nowhere", 0).build(name, config, Path::new(".")),
            other => Err(AreaError::NotFound(other.to_string())),
        }
    }
}

fn player_at(game: &Game<impl tilewalk::game::AreaLoader>) -> Option<VICoord> {
    movement::position_virt(game.area().world(), game.player())
}

#[test]
fn player_walks_into_the_next_area() {
    let counters = Arc::new(Counters::default());
    let mut game = Game::new(config(MovementMode::Turn), world_loader(Arc::clone(&counters)), player()).unwrap();
    assert_eq!(game.focus_name(), "west");

    assert!(game.move_player(IVec2::RIGHT));
    assert!(game.move_player(IVec2::RIGHT));

    assert_eq!(game.focus_name(), "east");
    assert_eq!(player_at(&game), Some(VICoord::new(1, 0, 0.0)));
    assert_eq!(game.area().player(), Some(game.player()));
    let west = game.loaded("west").unwrap();
    assert_eq!(west.player(), None);
    assert!(west.roster().is_empty());
}

#[test]
fn areas_are_loaded_once_and_load_hook_fires_once() {
    let counters = Arc::new(Counters::default());
    let mut game = Game::new(config(MovementMode::Turn), world_loader(Arc::clone(&counters)), player()).unwrap();

    game.move_player(IVec2::RIGHT);
    game.move_player(IVec2::RIGHT);
    assert_eq!(game.focus_name(), "east");
    game.move_player(IVec2::LEFT);
    assert_eq!(game.focus_name(), "west");
    assert_eq!(player_at(&game), Some(VICoord::new(1, 0, 0.0)));
    game.move_player(IVec2::RIGHT);
    assert_eq!(game.focus_name(), "east");

    assert_eq!(counters.loads.load(Ordering::SeqCst), 2);
    assert_eq!(counters.east_load_hook.load(Ordering::SeqCst), 1);
    assert_eq!(counters.east_focus_hook.load(Ordering::SeqCst), 2);
}

#[test]
fn failed_load_puts_the_player_back() {
    let counters = Arc::new(Counters::default());
    let mut config = config(MovementMode::Turn);
    config.start_area = "dead_end".to_string();
    let mut game = Game::new(config, world_loader(counters), player()).unwrap();

    assert!(game.move_player(IVec2::RIGHT));
    assert!(game.move_player(IVec2::RIGHT));

    assert_eq!(game.focus_name(), "dead_end");
    assert_eq!(
        movement::position_real(game.area().world(), game.player()),
        Some(RCoord::new(16.0, 0.0, 0.0))
    );
    assert!(!movement::is_moving(game.area().world(), game.player()));
}

#[test]
fn exit_into_the_same_area_teleports() {
    let counters = Arc::new(Counters::default());
    let mut config = config(MovementMode::Turn);
    config.start_area = "loop".to_string();
    let mut game = Game::new(config, world_loader(Arc::clone(&counters)), player()).unwrap();

    game.move_player(IVec2::RIGHT);
    game.move_player(IVec2::RIGHT);

    assert_eq!(game.focus_name(), "loop");
    assert_eq!(player_at(&game), Some(VICoord::new(0, 0, 0.0)));
    assert_eq!(counters.loads.load(Ordering::SeqCst), 1);
}

#[test]
fn gliding_player_changes_area_on_arrival() {
    let counters = Arc::new(Counters::default());
    let mut game = Game::new(config(MovementMode::Tile), world_loader(counters), player()).unwrap();

    assert!(game.press(IVec2::RIGHT));
    game.tick(16);
    assert_eq!(game.focus_name(), "west");
    game.release(IVec2::RIGHT);
    game.tick(16);

    assert_eq!(game.focus_name(), "east");
    assert_eq!(player_at(&game), Some(VICoord::new(1, 0, 0.0)));
    assert!(!movement::is_moving(game.area().world(), game.player()));
}

#[test]
fn time_carries_over_between_areas() {
    let counters = Arc::new(Counters::default());
    let mut game = Game::new(config(MovementMode::Tile), world_loader(counters), player()).unwrap();

    game.press(IVec2::RIGHT);
    game.tick(16);
    game.release(IVec2::RIGHT);
    game.tick(16);
    assert_eq!(game.focus_name(), "east");
    assert_eq!(game.area().now(), 32);
}

#[test]
fn start_outside_the_area_is_an_error() {
    let counters = Arc::new(Counters::default());
    let mut config = config(MovementMode::Turn);
    config.start_coords = VICoord::new(9, 9, 0.0);
    assert!(Game::new(config, world_loader(counters), player()).is_err());
}

#[test]
fn unknown_start_area_is_an_error() {
    let counters = Arc::new(Counters::default());
    let mut config = config(MovementMode::Turn);
    config.start_area = "atlantis".to_string();
    let err = Game::new(config, world_loader(counters), player()).err().unwrap();
    assert!(matches!(err, AreaError::NotFound(_)));
}
