//! ECS resources held by each area world.
//!
//! Overview
//! - `areascripts` – area name and its load/focus/tick/turn hooks
//! - `engineconfig` – INI-backed engine settings
//! - `pendingexit` – exit the player stepped on, for the game to resolve
//! - `redraw` – explicit redraw request flag
//! - `roster` – entities of the area in update order
//! - `script` – script bindings, their context and the Lua bridge
//! - `soundqueue` – sounds waiting for the host audio backend
//! - `tile` – tile flags, exits, scripts, types and tilesets
//! - `tilegrid` – tile storage and coordinate algebra
//! - `timer` – named stopwatch timers
//! - `viewport` – visible window onto the map
//! - `worldtime` – simulation time and delta
pub mod areascripts;
pub mod engineconfig;
pub mod pendingexit;
pub mod redraw;
pub mod roster;
pub mod script;
pub mod soundqueue;
pub mod tile;
pub mod tilegrid;
pub mod timer;
pub mod viewport;
pub mod worldtime;
