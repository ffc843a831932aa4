use bevy_ecs::prelude::*;

use super::commands::ScriptCmd;
use crate::coords::ICoord;
#[cfg(feature = "lua")]
use crate::error::ScriptError;
#[cfg(feature = "lua")]
use crate::resources::script::lua::LuaRuntime;

/// Ambient names visible to a script for the duration of one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptBindings {
    /// The entity acting, if any (the mover for tile triggers).
    pub entity: Option<Entity>,
    /// The tile the trigger belongs to, if any.
    pub tile: Option<ICoord>,
    /// Name of the area the script runs in.
    pub area: String,
    /// Area timer counts in seconds when the script started.
    pub timers: Vec<(String, f64)>,
}

/// Everything a script may touch while it runs.
///
/// The script gets the whole area world. It may move, teleport or despawn the
/// entity that triggered it; callers re-check the entity after every call.
pub struct ScriptContext<'w> {
    pub world: &'w mut World,
    pub bindings: ScriptBindings,
}

impl<'w> ScriptContext<'w> {
    pub fn new(world: &'w mut World, bindings: ScriptBindings) -> Self {
        Self { world, bindings }
    }

    pub fn entity(&self) -> Option<Entity> {
        self.bindings.entity
    }

    pub fn tile(&self) -> Option<ICoord> {
        self.bindings.tile
    }

    pub fn area(&self) -> &str {
        &self.bindings.area
    }

    /// Apply an engine command right away.
    pub fn apply(&mut self, cmd: ScriptCmd) {
        crate::systems::script_commands::apply_script_command(self.world, cmd);
    }

    /// Lend the Lua runtime to `run`, then apply the commands the chunk queued.
    ///
    /// The runtime is put back before the commands are applied so scripts
    /// triggered by those commands can run too.
    #[cfg(feature = "lua")]
    pub(super) fn with_lua<F>(&mut self, name: &str, run: F) -> Result<(), ScriptError>
    where
        F: FnOnce(&LuaRuntime, &ScriptBindings) -> Result<Vec<ScriptCmd>, ScriptError>,
    {
        let runtime = self
            .world
            .remove_non_send_resource::<LuaRuntime>()
            .ok_or_else(|| ScriptError::NoRuntime(name.to_string()))?;
        let result = run(&runtime, &self.bindings);
        self.world.insert_non_send_resource(runtime);
        for cmd in result? {
            self.apply(cmd);
        }
        Ok(())
    }
}
