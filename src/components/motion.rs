//! Facing, speed and glide state.
//!
//! An entity is either idle or gliding between two tiles. While gliding the
//! from/destination pair is meaningful; when idle it holds the last move.

use bevy_ecs::prelude::Component;

use crate::coords::{ICoord, IVec2, RCoord};

/// One of the eight compass directions, or zero for "no direction yet".
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Facing(pub IVec2);

impl Default for Facing {
    fn default() -> Self {
        Facing(IVec2::DOWN)
    }
}

impl Facing {
    /// Face along `delta`, clamping each axis to -1..=1.
    pub fn toward(delta: IVec2) -> Self {
        Facing(delta.signum())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionState {
    #[default]
    Idle,
    Gliding,
}

#[derive(Component, Clone, Debug, Default, PartialEq)]
pub struct Motion {
    pub state: MotionState,
    pub from_coord: RCoord,
    pub dest_coord: RCoord,
    /// Physical tile left. `None` for free-form moves.
    pub from_tile: Option<ICoord>,
    /// Physical tile entered. `None` when the move leaves the grid or is free-form.
    pub dest_tile: Option<ICoord>,
    /// Tile delta of the last move.
    pub delta: IVec2,
    /// Keep the walking phase when a glide ends, because another step follows.
    pub still_moving: bool,
}

impl Motion {
    pub fn is_gliding(&self) -> bool {
        self.state == MotionState::Gliding
    }
}

/// Base speed in tiles per second and a script-controlled multiplier.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Speed {
    pub base: f64,
    pub multiplier: f64,
}

impl Default for Speed {
    fn default() -> Self {
        Speed {
            base: 1.0,
            multiplier: 1.0,
        }
    }
}

impl Speed {
    pub fn new(base: f64) -> Self {
        Speed {
            base,
            multiplier: 1.0,
        }
    }

    /// Glide speed in pixels per millisecond on a map with `tile_width` pixel tiles.
    pub fn px_per_ms(&self, tile_width: i32) -> f64 {
        self.base * self.multiplier * f64::from(tile_width) / 1000.0
    }
}
