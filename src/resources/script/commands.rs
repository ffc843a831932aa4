//! Commands scripts can issue against the area.
//!
//! Lua chunks queue these through the `engine` table and the queue is applied
//! as soon as the chunk returns. Native scripts can apply them directly with
//! [`ScriptContext::apply`](super::ScriptContext::apply).

/// Engine commands available to scripts. Entity ids are [`Entity::to_bits`] values.
///
/// [`Entity::to_bits`]: bevy_ecs::entity::Entity::to_bits
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCmd {
    /// Attempt a one-tile move, as if the entity had been told to walk.
    MoveByTile { entity_id: u64, dx: i32, dy: i32 },
    /// Place the entity on a virtual tile coordinate, cancelling any glide.
    Teleport {
        entity_id: u64,
        x: i32,
        y: i32,
        z: f64,
    },
    /// Remove the entity from the area.
    Despawn { entity_id: u64 },
    /// Switch the entity's animation phase.
    SetPhase { entity_id: u64, phase: String },
    /// Change the entity's speed multiplier.
    SetSpeed { entity_id: u64, multiplier: f64 },
    /// Freeze or unfreeze the entity.
    SetFrozen { entity_id: u64, frozen: bool },
    /// Set or clear a named flag on the instance level of a tile.
    SetTileFlag {
        x: i32,
        y: i32,
        z: i32,
        flag: String,
        on: bool,
    },
    /// Ask the host audio backend to play a sound.
    PlaySound { name: String },
    /// Force a redraw on the next frame.
    RequestRedraw,
    /// Start or stop an area timer, creating it if needed.
    TimerRun { name: String, running: bool },
    /// Reset an area timer to zero.
    TimerReset { name: String },
}
