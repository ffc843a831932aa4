//! Engine systems.
//!
//! Most of these are plain functions over `&mut World` rather than scheduled
//! systems: scripts run synchronously inside them and may change anything.
//!
//! Submodules overview
//! - [`camera`] – keep the viewport on its tracked entity
//! - [`movement`] – tile steps, collision, glides and placement
//! - [`redraw`] – redraw detection and the draw pass
//! - [`script_commands`] – apply commands queued by scripts
//! - [`spawn`] – spawn, despawn and transfer entities
//! - [`tick`] – per-step entity updates
//! - [`time`] – world time and timers
//! - [`triggers`] – script dispatch for tiles, entities and areas
//! - [`wander`] – NPC random walk

pub mod camera;
pub mod movement;
pub mod redraw;
pub mod script_commands;
pub mod spawn;
pub mod tick;
pub mod time;
pub mod triggers;
pub mod wander;
