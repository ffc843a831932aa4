//! Tilewalk engine library.
//!
//! A tile-based 2D map engine: layered tile grids with optional looping axes,
//! entities gliding from tile to tile, scripted tile triggers and exits
//! between cached areas. Rendering, audio and input devices are left to the
//! host through [`systems::redraw::Renderer`], the sound queue and the
//! [`game::Game`] input calls.

pub mod area;
pub mod components;
pub mod coords;
pub mod descriptor;
pub mod error;
pub mod game;
pub mod resources;
pub mod systems;
