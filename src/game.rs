//! The game: area cache, focus and the player's trips between areas.
//!
//! The player lives in the focused area's world. Taking an exit moves the
//! player's components into the target area (loading it on first use), moves
//! the script runtime along and fires the target's focus hooks. If the target
//! cannot be loaded the player is put back where the move started.

use bevy_ecs::prelude::*;
use log::{error, info, warn};
use rustc_hash::FxHashMap;

use crate::area::Area;
use crate::components::inputcontrolled::InputControlled;
use crate::coords::IVec2;
use crate::error::AreaError;
use crate::resources::engineconfig::{EngineConfig, MovementMode};
use crate::resources::pendingexit::ExitRequest;
use crate::systems::movement;
use crate::systems::redraw::Renderer;
use crate::systems::spawn::{ActorSpawn, detach_actor};
use crate::systems::time::sync_world_time;

/// Source of areas by name.
pub trait AreaLoader {
    fn load(&mut self, name: &str, config: &EngineConfig) -> Result<Area, AreaError>;
}

impl<F> AreaLoader for F
where
    F: FnMut(&str, &EngineConfig) -> Result<Area, AreaError>,
{
    fn load(&mut self, name: &str, config: &EngineConfig) -> Result<Area, AreaError> {
        self(name, config)
    }
}

pub struct Game<L: AreaLoader> {
    config: EngineConfig,
    loader: L,
    /// The focused area.
    current: Area,
    /// Every other area loaded so far.
    cache: FxHashMap<String, Area>,
    player: Entity,
}

impl<L: AreaLoader> Game<L> {
    /// Load the start area from `config` and put the player there.
    pub fn new(config: EngineConfig, mut loader: L, player: ActorSpawn) -> Result<Self, AreaError> {
        let start = config.start_area.clone();
        let mut area = loader.load(&start, &config)?;
        if !area.in_bounds_virt(config.start_coords) {
            return Err(AreaError::Malformed {
                area: start,
                reason: format!("start position {} is outside the area", config.start_coords),
            });
        }
        let mut player = player;
        player.position = config.start_coords;
        let player = area.spawn(player);
        area.viewport_mut().track_entity(player);

        #[cfg(feature = "lua")]
        match crate::resources::script::LuaRuntime::new() {
            Ok(runtime) => area.install_lua(runtime),
            Err(e) => error!("Lua runtime unavailable: {}", e),
        }

        info!("starting in '{}' at {}", start, config.start_coords);
        area.focus();
        let mut game = Self {
            config,
            loader,
            current: area,
            cache: FxHashMap::default(),
            player,
        };
        game.process_exits();
        Ok(game)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn player(&self) -> Entity {
        self.player
    }

    pub fn focus_name(&self) -> &str {
        self.current.name()
    }

    /// The area the player is in.
    pub fn area(&self) -> &Area {
        &self.current
    }

    pub fn area_mut(&mut self) -> &mut Area {
        &mut self.current
    }

    /// A loaded area by name, focused or not.
    pub fn loaded(&self, name: &str) -> Option<&Area> {
        if self.current.name() == name {
            Some(&self.current)
        } else {
            self.cache.get(name)
        }
    }

    fn mode(&self) -> MovementMode {
        self.config.movement_mode
    }

    // --- stepping -------------------------------------------------------

    pub fn tick(&mut self, dt_ms: u64) {
        self.area_mut().tick(dt_ms);
        self.process_exits();
    }

    pub fn tick_to(&mut self, now_ms: u64) {
        self.area_mut().tick_to(now_ms);
        self.process_exits();
    }

    pub fn turn(&mut self) {
        self.area_mut().turn();
        self.process_exits();
    }

    // --- player input ---------------------------------------------------

    /// Try to move the player one tile. Under the stepped discipline a
    /// successful move also plays a turn.
    pub fn move_player(&mut self, delta: IVec2) -> bool {
        let player = self.player;
        let moved = movement::move_by_tile(self.area_mut().world_mut(), player, delta);
        if moved && self.mode() == MovementMode::Turn {
            self.area_mut().turn();
        }
        self.process_exits();
        moved
    }

    /// A movement key went down.
    pub fn press(&mut self, dir: IVec2) -> bool {
        if self.mode() == MovementMode::Turn {
            return self.move_player(dir);
        }
        let player = self.player;
        let moved = movement::start_movement(self.area_mut().world_mut(), player, dir);
        self.process_exits();
        moved
    }

    /// A movement key went up.
    pub fn release(&mut self, dir: IVec2) {
        let player = self.player;
        movement::stop_movement(self.area_mut().world_mut(), player, dir);
    }

    /// Fire the use scripts of the tile in front of the player.
    pub fn use_tile(&mut self) {
        let player = self.player;
        self.area_mut().use_tile(player);
        self.process_exits();
    }

    // --- output ---------------------------------------------------------

    pub fn needs_redraw(&self) -> bool {
        self.area().needs_redraw()
    }

    pub fn draw(&mut self, renderer: &mut dyn Renderer) {
        self.area_mut().draw(renderer);
    }

    pub fn drain_sounds(&mut self) -> Vec<String> {
        self.area_mut().drain_sounds()
    }

    // --- area transitions -----------------------------------------------

    fn process_exits(&mut self) {
        while let Some(req) = self.area_mut().take_pending_exit() {
            if req.entity != self.player {
                warn!("ignoring exit request for {}", req.entity);
                continue;
            }
            if let Err(e) = self.take_exit(&req) {
                error!("exit to '{}' failed: {}", req.exit.area, e);
                let player = self.player;
                movement::set_position_real(self.area_mut().world_mut(), player, req.rollback);
            }
        }
    }

    fn ensure_cached(&mut self, name: &str) -> Result<(), AreaError> {
        if !self.cache.contains_key(name) {
            let area = self.loader.load(name, &self.config)?;
            self.cache.insert(name.to_string(), area);
        }
        Ok(())
    }

    fn take_exit(&mut self, req: &ExitRequest) -> Result<(), AreaError> {
        let target = req.exit.area.clone();
        let coords = req.exit.coords;

        if target == self.current.name() {
            let player = self.player;
            if !movement::teleport(self.current.world_mut(), player, coords) {
                return Err(AreaError::Malformed {
                    area: target,
                    reason: format!("exit destination {coords} is not walkable"),
                });
            }
            self.continue_held_movement();
            return Ok(());
        }

        self.ensure_cached(&target)?;
        let mut next = self
            .cache
            .remove(&target)
            .ok_or_else(|| AreaError::NotFound(target.clone()))?;
        if !next.in_bounds_virt(coords) {
            self.cache.insert(target.clone(), next);
            return Err(AreaError::Malformed {
                area: target,
                reason: format!("exit destination {coords} is outside the area"),
            });
        }
        let Some(snapshot) = detach_actor(self.current.world_mut(), self.player) else {
            self.cache.insert(target, next);
            return Err(AreaError::NotFound(format!("player in '{}'", self.current.name())));
        };

        sync_world_time(next.world_mut(), self.current.now());
        #[cfg(feature = "lua")]
        if let Some(runtime) = self.current.take_lua() {
            next.install_lua(runtime);
        }
        let player = snapshot.restore(next.world_mut(), coords);
        next.viewport_mut().track_entity(player);

        info!("player moves from '{}' to '{}'", self.current.name(), target);
        let prev = std::mem::replace(&mut self.current, next);
        self.cache.insert(prev.name().to_string(), prev);
        self.player = player;
        self.current.focus();
        self.continue_held_movement();
        Ok(())
    }

    /// Under tile gliding, keep walking if a movement key is still held.
    fn continue_held_movement(&mut self) {
        if self.mode() != MovementMode::Tile {
            return;
        }
        let player = self.player;
        let world = self.area_mut().world_mut();
        let held = world
            .get::<InputControlled>(player)
            .and_then(InputControlled::current);
        if let Some(dir) = held {
            movement::move_by_tile(world, player, dir);
        }
    }
}
