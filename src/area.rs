//! One loaded map.
//!
//! An [`Area`] owns an ECS [`World`] holding the tile grid, the entities and
//! the per-area resources, plus the schedules run around each step. Areas are
//! cached by the [`Game`](crate::game::Game) and keep their state while the
//! player is elsewhere.

use bevy_ecs::prelude::*;
use log::{debug, info};

use crate::coords::{ICoord, ICube, IVec2, VICoord};
use crate::resources::areascripts::{AreaHook, AreaScripts};
use crate::resources::engineconfig::EngineConfig;
use crate::resources::pendingexit::{ExitRequest, PendingExit};
use crate::resources::redraw::RedrawRequest;
use crate::resources::roster::Roster;
use crate::resources::soundqueue::SoundQueue;
use crate::resources::tile::{Tile, TileSet, TileTrigger};
use crate::resources::tilegrid::TileGrid;
use crate::resources::timer::Timers;
use crate::resources::viewport::Viewport;
use crate::resources::worldtime::WorldTime;
use crate::systems::camera::follow_tracked_entity;
use crate::systems::movement::{self, position_phys};
use crate::systems::redraw::{Renderer, area_needs_redraw, draw_area};
use crate::systems::spawn::{ActorSpawn, despawn_actor, spawn_actor};
use crate::systems::tick::update_entities;
use crate::systems::time::{sync_world_time, update_timers, update_world_time};
use crate::systems::triggers::{run_area_hook, run_tile_script};

pub struct Area {
    name: String,
    world: World,
    pre_update: Schedule,
    post_update: Schedule,
    loaded: bool,
}

impl std::fmt::Debug for Area {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Area")
            .field("name", &self.name)
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

impl Area {
    pub fn new(name: impl Into<String>, grid: TileGrid, config: &EngineConfig) -> Self {
        let name = name.into();
        let (w, h) = config.window_size();
        let mut world = World::new();
        world.insert_resource(grid);
        world.insert_resource(config.clone());
        world.insert_resource(WorldTime::default());
        world.insert_resource(Viewport::new(f64::from(w), f64::from(h)));
        world.insert_resource(Roster::default());
        world.insert_resource(RedrawRequest(true));
        world.insert_resource(AreaScripts::named(name.clone()));
        world.insert_resource(PendingExit::default());
        world.insert_resource(SoundQueue::default());
        world.insert_resource(Timers::default());

        let mut pre_update = Schedule::default();
        pre_update.add_systems(update_timers);
        let mut post_update = Schedule::default();
        post_update.add_systems(follow_tracked_entity);

        Self {
            name,
            world,
            pre_update,
            post_update,
            loaded: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn grid(&self) -> &TileGrid {
        self.world.resource::<TileGrid>()
    }

    pub fn grid_mut(&mut self) -> Mut<'_, TileGrid> {
        self.world.resource_mut::<TileGrid>()
    }

    pub fn scripts_mut(&mut self) -> Mut<'_, AreaScripts> {
        self.world.resource_mut::<AreaScripts>()
    }

    pub fn viewport(&self) -> &Viewport {
        self.world.resource::<Viewport>()
    }

    pub fn viewport_mut(&mut self) -> Mut<'_, Viewport> {
        self.world.resource_mut::<Viewport>()
    }

    pub fn now(&self) -> u64 {
        self.world.resource::<WorldTime>().now_ms
    }

    // --- entities -------------------------------------------------------

    pub fn spawn(&mut self, spawn: ActorSpawn) -> Entity {
        spawn_actor(&mut self.world, spawn)
    }

    pub fn despawn(&mut self, entity: Entity) -> bool {
        despawn_actor(&mut self.world, entity)
    }

    pub fn roster(&self) -> &Roster {
        self.world.resource::<Roster>()
    }

    pub fn player(&self) -> Option<Entity> {
        self.roster().player()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.roster().contains(entity)
    }

    // --- stepping -------------------------------------------------------

    /// Fire the load hook if this is the area's first focus, then the focus hook.
    pub fn focus(&mut self) {
        if !self.loaded {
            self.loaded = true;
            info!("area '{}' loaded", self.name);
            run_area_hook(&mut self.world, AreaHook::Load);
        }
        run_area_hook(&mut self.world, AreaHook::Focus);
        self.post_update.run(&mut self.world);
        self.request_redraw();
    }

    /// Advance the area by `dt_ms` milliseconds.
    pub fn tick(&mut self, dt_ms: u64) {
        let dt = update_world_time(&mut self.world, dt_ms);
        self.step(dt);
    }

    /// Advance the area to the host's monotonic `now_ms`.
    pub fn tick_to(&mut self, now_ms: u64) {
        let dt = sync_world_time(&mut self.world, now_ms);
        self.step(dt);
    }

    fn step(&mut self, dt: u64) {
        self.pre_update.run(&mut self.world);
        run_area_hook(&mut self.world, AreaHook::Tick);
        update_entities(&mut self.world, dt);
        self.post_update.run(&mut self.world);
    }

    /// One turn of the stepped discipline.
    ///
    /// Only overlays are updated here; characters and the player move inside
    /// their input calls.
    pub fn turn(&mut self) {
        debug!("turn in '{}'", self.name);
        run_area_hook(&mut self.world, AreaHook::Turn);
        update_entities(&mut self.world, 0);
        self.post_update.run(&mut self.world);
    }

    /// Fire the use scripts of the tile `entity` is facing.
    pub fn use_tile(&mut self, entity: Entity) {
        let (Some(here), Some(facing)) = (
            position_phys(&self.world, entity),
            movement::facing(&self.world, entity),
        ) else {
            return;
        };
        let target = here.offset(facing);
        let grid = self.grid();
        if !grid.in_bounds(target) {
            return;
        }
        let target = grid.wrap(target);
        run_tile_script(&mut self.world, TileTrigger::Use, target, Some(entity));
    }

    // --- redraw ---------------------------------------------------------

    pub fn needs_redraw(&self) -> bool {
        area_needs_redraw(&self.world)
    }

    pub fn request_redraw(&mut self) {
        self.world.resource_mut::<RedrawRequest>().request();
    }

    pub fn draw(&mut self, renderer: &mut dyn Renderer) {
        draw_area(&mut self.world, renderer);
    }

    // --- outputs --------------------------------------------------------

    pub fn take_pending_exit(&mut self) -> Option<ExitRequest> {
        self.world.resource_mut::<PendingExit>().take()
    }

    pub fn drain_sounds(&mut self) -> Vec<String> {
        self.world.resource_mut::<SoundQueue>().drain()
    }

    // --- map queries ----------------------------------------------------

    pub fn tile(&self, c: ICoord) -> Option<&Tile> {
        self.grid().tile(c)
    }

    pub fn tile_virt(&self, c: VICoord) -> Option<&Tile> {
        self.grid().tile_virt(c)
    }

    pub fn tileset(&self, name: &str) -> Option<&TileSet> {
        self.grid().tileset(name)
    }

    pub fn in_bounds(&self, c: ICoord) -> bool {
        self.grid().in_bounds(c)
    }

    pub fn in_bounds_virt(&self, c: VICoord) -> bool {
        self.grid().in_bounds_virt(c)
    }

    pub fn dimensions(&self) -> ICoord {
        self.grid().dimensions()
    }

    pub fn tile_dimensions(&self) -> IVec2 {
        self.grid().tile_dimensions()
    }

    pub fn visible_tiles(&self) -> ICube {
        let vp = self.viewport();
        self.grid().visible_tiles(vp.offset(), vp.size())
    }

    /// Make the Lua runtime available to scripts of this area.
    #[cfg(feature = "lua")]
    pub fn install_lua(&mut self, runtime: crate::resources::script::LuaRuntime) {
        self.world.insert_non_send_resource(runtime);
    }

    #[cfg(feature = "lua")]
    pub fn take_lua(&mut self) -> Option<crate::resources::script::LuaRuntime> {
        self.world
            .remove_non_send_resource::<crate::resources::script::LuaRuntime>()
    }
}
