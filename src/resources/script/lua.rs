//! Lua scripting runtime.
//!
//! Exposes an `engine` table to Lua chunks. Functions that change the area do
//! not touch it directly: they queue a [`ScriptCmd`] and the queue is drained
//! when the chunk returns.
//!
//! # Example
//!
//! ```lua
//! -- bound as a tile's on-enter script
//! engine.log_info("stepped on " .. tile.x .. "," .. tile.y .. " in " .. area)
//! engine.play_sound("splash")
//! engine.entity_teleport(entity, 2, 3, 0.0)
//! ```

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info, warn};
use mlua::prelude::*;
use rustc_hash::FxHashMap;

use super::commands::ScriptCmd;
use super::context::ScriptBindings;
use crate::error::ScriptError;

/// Shared state reachable from Lua closures through the app data slot.
#[derive(Default)]
struct LuaAppData {
    commands: RefCell<Vec<ScriptCmd>>,
}

/// Holds the Lua interpreter state.
///
/// The Lua state is not thread-safe, so the runtime lives in the area world
/// as a non-send resource and follows the player between areas.
pub struct LuaRuntime {
    lua: Lua,
    sources: RefCell<FxHashMap<PathBuf, Arc<str>>>,
}

/// Registers a Lua function that pushes a command to the queue in `LuaAppData`.
macro_rules! register_cmd {
    ($engine:expr, $lua:expr, $name:expr, |$args:pat_param| $arg_ty:ty, $cmd:expr) => {
        $engine.set(
            $name,
            $lua.create_function(|lua, $args: $arg_ty| {
                lua.app_data_ref::<LuaAppData>()
                    .ok_or_else(|| LuaError::runtime("LuaAppData not found"))?
                    .commands
                    .borrow_mut()
                    .push($cmd);
                Ok(())
            })?,
        )?;
    };
}

impl LuaRuntime {
    /// Creates a new Lua runtime and registers the `engine` API.
    pub fn new() -> LuaResult<Self> {
        let lua = Lua::new();
        lua.set_app_data(LuaAppData::default());
        let runtime = Self {
            lua,
            sources: RefCell::new(FxHashMap::default()),
        };
        runtime.register_engine_api()?;
        Ok(runtime)
    }

    fn register_engine_api(&self) -> LuaResult<()> {
        let lua = &self.lua;
        let engine = lua.create_table()?;

        engine.set(
            "log",
            lua.create_function(|_, msg: String| {
                info!("[Lua] {}", msg);
                Ok(())
            })?,
        )?;
        engine.set(
            "log_info",
            lua.create_function(|_, msg: String| {
                info!("[Lua] {}", msg);
                Ok(())
            })?,
        )?;
        engine.set(
            "log_warn",
            lua.create_function(|_, msg: String| {
                warn!("[Lua] {}", msg);
                Ok(())
            })?,
        )?;
        engine.set(
            "log_error",
            lua.create_function(|_, msg: String| {
                error!("[Lua] {}", msg);
                Ok(())
            })?,
        )?;

        register_cmd!(engine, lua, "entity_move",
            |(entity_id, dx, dy)| (u64, i32, i32), ScriptCmd::MoveByTile { entity_id, dx, dy });
        register_cmd!(engine, lua, "entity_teleport",
            |(entity_id, x, y, z)| (u64, i32, i32, f64), ScriptCmd::Teleport { entity_id, x, y, z });
        register_cmd!(engine, lua, "entity_despawn",
            |entity_id| u64, ScriptCmd::Despawn { entity_id });
        register_cmd!(engine, lua, "entity_set_phase",
            |(entity_id, phase)| (u64, String), ScriptCmd::SetPhase { entity_id, phase });
        register_cmd!(engine, lua, "entity_set_speed",
            |(entity_id, multiplier)| (u64, f64), ScriptCmd::SetSpeed { entity_id, multiplier });
        register_cmd!(engine, lua, "entity_freeze",
            |(entity_id, frozen)| (u64, bool), ScriptCmd::SetFrozen { entity_id, frozen });
        register_cmd!(engine, lua, "tile_set_flag",
            |(x, y, z, flag)| (i32, i32, i32, String),
            ScriptCmd::SetTileFlag { x, y, z, flag, on: true });
        register_cmd!(engine, lua, "tile_clear_flag",
            |(x, y, z, flag)| (i32, i32, i32, String),
            ScriptCmd::SetTileFlag { x, y, z, flag, on: false });
        register_cmd!(engine, lua, "play_sound",
            |name| String, ScriptCmd::PlaySound { name });
        register_cmd!(engine, lua, "request_redraw",
            |()| (), ScriptCmd::RequestRedraw);
        register_cmd!(engine, lua, "timer_start",
            |name| String, ScriptCmd::TimerRun { name, running: true });
        register_cmd!(engine, lua, "timer_stop",
            |name| String, ScriptCmd::TimerRun { name, running: false });
        register_cmd!(engine, lua, "timer_reset",
            |name| String, ScriptCmd::TimerReset { name });

        lua.globals().set("engine", engine)?;
        Ok(())
    }

    /// Compile `source` without running it.
    pub fn check_syntax(name: &str, source: &str) -> Result<(), ScriptError> {
        let lua = Lua::new();
        lua.load(source)
            .set_name(name)
            .into_function()
            .map(|_| ())
            .map_err(|source| ScriptError::Lua {
                name: name.to_string(),
                source,
            })
    }

    /// Source of a script file, read once and cached.
    pub fn source_for(&self, path: &Path) -> Result<Arc<str>, ScriptError> {
        if let Some(src) = self.sources.borrow().get(path) {
            return Ok(Arc::clone(src));
        }
        let name = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|_| ScriptError::MissingFile(name))?;
        let src: Arc<str> = text.into();
        self.sources
            .borrow_mut()
            .insert(path.to_path_buf(), Arc::clone(&src));
        Ok(src)
    }

    /// Run a chunk with the ambient bindings set and return the commands it queued.
    pub fn run_chunk(
        &self,
        name: &str,
        source: &str,
        bindings: &ScriptBindings,
    ) -> Result<Vec<ScriptCmd>, ScriptError> {
        let lua_err = |source: LuaError| ScriptError::Lua {
            name: name.to_string(),
            source,
        };
        self.set_bindings(bindings).map_err(lua_err)?;
        debug!("running Lua chunk '{}'", name);
        let result = self.lua.load(source).set_name(name).exec();
        let queued = self.take_commands();
        result.map_err(lua_err)?;
        Ok(queued)
    }

    fn set_bindings(&self, bindings: &ScriptBindings) -> LuaResult<()> {
        let globals = self.lua.globals();
        match bindings.entity {
            Some(entity) => globals.set("entity", entity.to_bits())?,
            None => globals.set("entity", LuaValue::Nil)?,
        }
        match bindings.tile {
            Some(tile) => {
                let t = self.lua.create_table()?;
                t.set("x", tile.x)?;
                t.set("y", tile.y)?;
                t.set("z", tile.z)?;
                globals.set("tile", t)?;
            }
            None => globals.set("tile", LuaValue::Nil)?,
        }
        globals.set("area", bindings.area.as_str())?;
        let timers = self.lua.create_table()?;
        for (name, count) in &bindings.timers {
            timers.set(name.as_str(), *count)?;
        }
        globals.set("timers", timers)?;
        Ok(())
    }

    fn take_commands(&self) -> Vec<ScriptCmd> {
        self.lua
            .app_data_ref::<LuaAppData>()
            .map(|data| std::mem::take(&mut *data.commands.borrow_mut()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::ICoord;

    fn bindings() -> ScriptBindings {
        ScriptBindings {
            entity: None,
            tile: Some(ICoord::new(1, 2, 0)),
            area: "grove".to_string(),
            timers: vec![("clock".to_string(), 1.5)],
        }
    }

    #[test]
    fn chunk_queues_commands() {
        let runtime = LuaRuntime::new().unwrap();
        let cmds = runtime
            .run_chunk(
                "test",
                "engine.play_sound('splash'); engine.request_redraw()",
                &bindings(),
            )
            .unwrap();
        assert_eq!(
            cmds,
            vec![
                ScriptCmd::PlaySound {
                    name: "splash".to_string()
                },
                ScriptCmd::RequestRedraw
            ]
        );
    }

    #[test]
    fn ambient_bindings_are_visible() {
        let runtime = LuaRuntime::new().unwrap();
        let cmds = runtime
            .run_chunk(
                "test",
                "if tile.x == 1 and tile.y == 2 and area == 'grove' and entity == nil then \
                 engine.tile_set_flag(tile.x, tile.y, tile.z, 'nowalk') end",
                &bindings(),
            )
            .unwrap();
        assert_eq!(cmds.len(), 1);
    }

    #[test]
    fn timers_are_readable_and_controllable() {
        let runtime = LuaRuntime::new().unwrap();
        let cmds = runtime
            .run_chunk(
                "test",
                "if timers.clock > 1.0 then engine.timer_reset('clock') end \
                 engine.timer_start('door')",
                &bindings(),
            )
            .unwrap();
        assert_eq!(
            cmds,
            vec![
                ScriptCmd::TimerReset {
                    name: "clock".to_string()
                },
                ScriptCmd::TimerRun {
                    name: "door".to_string(),
                    running: true
                },
            ]
        );
    }

    #[test]
    fn runtime_errors_are_reported() {
        let runtime = LuaRuntime::new().unwrap();
        let err = runtime
            .run_chunk("broken", "error('boom')", &bindings())
            .unwrap_err();
        assert!(matches!(err, ScriptError::Lua { .. }));
    }

    #[test]
    fn syntax_check_rejects_bad_chunks() {
        assert!(LuaRuntime::check_syntax("ok", "local x = 1").is_ok());
        assert!(LuaRuntime::check_syntax("bad", "local = = 1").is_err());
    }
}
