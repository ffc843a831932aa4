use bevy_ecs::prelude::Component;

use crate::resources::script::ScriptBinding;

/// Scripts bound to one entity.
///
/// The acting entity is bound as `entity` while they run; tile scripts also
/// see the tile.
#[derive(Component, Clone, Debug, Default)]
pub struct EntityScripts {
    /// Every step, before movement is advanced.
    pub on_update: Option<ScriptBinding>,
    /// After the entity arrives on a tile.
    pub on_tile_entry: Option<ScriptBinding>,
    /// When the entity starts leaving a tile.
    pub on_tile_exit: Option<ScriptBinding>,
    /// Right before the entity is despawned.
    pub on_delete: Option<ScriptBinding>,
}
