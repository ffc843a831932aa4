//! Area identity and area-level script hooks.

use bevy_ecs::prelude::Resource;

use crate::resources::script::ScriptBinding;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaHook {
    /// Once, when the area is first loaded.
    Load,
    /// Every time the player enters the area.
    Focus,
    /// Every simulation step under the continuous disciplines.
    Tick,
    /// Every turn under the stepped discipline.
    Turn,
}

impl AreaHook {
    pub fn name(self) -> &'static str {
        match self {
            AreaHook::Load => "on_load",
            AreaHook::Focus => "on_focus",
            AreaHook::Tick => "on_tick",
            AreaHook::Turn => "on_turn",
        }
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct AreaScripts {
    /// Name of the area, as used by exits.
    pub area: String,
    pub on_load: Option<ScriptBinding>,
    pub on_focus: Option<ScriptBinding>,
    pub on_tick: Option<ScriptBinding>,
    pub on_turn: Option<ScriptBinding>,
}

impl AreaScripts {
    pub fn named(area: impl Into<String>) -> Self {
        Self {
            area: area.into(),
            ..Self::default()
        }
    }

    pub fn get(&self, hook: AreaHook) -> Option<&ScriptBinding> {
        match hook {
            AreaHook::Load => self.on_load.as_ref(),
            AreaHook::Focus => self.on_focus.as_ref(),
            AreaHook::Tick => self.on_tick.as_ref(),
            AreaHook::Turn => self.on_turn.as_ref(),
        }
    }
}
