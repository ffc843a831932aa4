//! ECS components for map entities.
//!
//! Submodules overview:
//! - [`actor`] – entity kind, descriptor name, freeze state, walk exemptions and sounds
//! - [`animation`] – time-driven animation clock shared by sprites and tile types
//! - [`entityscripts`] – scripts fired on update, tile entry/exit and deletion
//! - [`inputcontrolled`] – movement keys currently held for the player
//! - [`mapposition`] – real (pixel) position of an entity
//! - [`motion`] – facing, glide state and speed
//! - [`sprite`] – named animation phases and the one shown
//! - [`wander`] – random walk for NPCs

pub mod actor;
pub mod animation;
pub mod entityscripts;
pub mod inputcontrolled;
pub mod mapposition;
pub mod motion;
pub mod sprite;
pub mod wander;
