//! Coordinate value types.
//!
//! Three coordinate spaces coexist in an area:
//!
//! - [`ICoord`] – *physical*: integer grid index. `z` is a layer slot, not a depth.
//! - [`VICoord`] – *virtual*: integer `x`/`y` plus the authored layer depth.
//! - [`RCoord`] – *real*: pixel position plus depth.
//!
//! Conversions between spaces need the area's tile size and depth table and
//! live on [`TileGrid`](crate::resources::tilegrid::TileGrid).

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Physical integer coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ICoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ICoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Offset on the x/y plane, keeping the layer.
    pub fn offset(self, d: IVec2) -> Self {
        Self::new(self.x + d.x, self.y + d.y, self.z)
    }
}

impl Add for ICoord {
    type Output = ICoord;

    fn add(self, rhs: ICoord) -> ICoord {
        ICoord::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl fmt::Display for ICoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Virtual coordinate: tile `x`/`y` plus a layer depth meaningful to content authors.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VICoord {
    pub x: i32,
    pub y: i32,
    pub z: f64,
}

impl VICoord {
    pub const fn new(x: i32, y: i32, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for VICoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {:.3})", self.x, self.y, self.z)
    }
}

/// Real (pixel) coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RCoord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RCoord {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar distance, ignoring depth.
    pub fn distance_xy(self, other: RCoord) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl Add for RCoord {
    type Output = RCoord;

    fn add(self, rhs: RCoord) -> RCoord {
        RCoord::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for RCoord {
    type Output = RCoord;

    fn sub(self, rhs: RCoord) -> RCoord {
        RCoord::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for RCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.3})", self.x, self.y, self.z)
    }
}

/// Planar integer vector, used for movement deltas and facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IVec2 {
    pub x: i32,
    pub y: i32,
}

impl IVec2 {
    pub const ZERO: IVec2 = IVec2::new(0, 0);
    pub const UP: IVec2 = IVec2::new(0, -1);
    pub const DOWN: IVec2 = IVec2::new(0, 1);
    pub const LEFT: IVec2 = IVec2::new(-1, 0);
    pub const RIGHT: IVec2 = IVec2::new(1, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Clamp each axis independently to {-1, 0, 1}.
    pub fn signum(self) -> Self {
        Self::new(self.x.signum(), self.y.signum())
    }

    pub fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Compass name of a unit facing, e.g. `"down"` or `"up-left"`.
    ///
    /// Returns `"stance"` for the zero vector.
    pub fn direction_name(self) -> &'static str {
        match (self.x.signum(), self.y.signum()) {
            (0, -1) => "up",
            (0, 1) => "down",
            (-1, 0) => "left",
            (1, 0) => "right",
            (-1, -1) => "up-left",
            (1, -1) => "up-right",
            (-1, 1) => "down-left",
            (1, 1) => "down-right",
            _ => "stance",
        }
    }
}

/// Inclusive-exclusive integer cube, used for visible tile ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ICube {
    pub x1: i32,
    pub y1: i32,
    pub z1: i32,
    pub x2: i32,
    pub y2: i32,
    pub z2: i32,
}

/// Wrap `value` onto a looping axis of length `max`.
///
/// `max` is added until `value >= min`, then the result is reduced modulo
/// `max`. With `min == 0` the result is always in `[0, max)`.
pub fn wrap(min: i32, value: i32, max: i32) -> i32 {
    debug_assert!(max > 0, "wrap on an axis of length {max}");
    let mut v = value;
    if v < min {
        let short = i64::from(min) - i64::from(v);
        let laps = (short + i64::from(max) - 1) / i64::from(max);
        v = (i64::from(v) + laps * i64::from(max)) as i32;
    }
    v % max
}

/// Floating point counterpart of [`wrap`] for pixel coordinates.
pub fn wrap_f64(min: f64, value: f64, max: f64) -> f64 {
    debug_assert!(max > 0.0);
    let mut v = value;
    if v < min {
        v += ((min - v) / max).ceil() * max;
    }
    v % max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_negative_values() {
        assert_eq!(wrap(0, -1, 10), 9);
        assert_eq!(wrap(0, -10, 10), 0);
        assert_eq!(wrap(0, -21, 10), 9);
    }

    #[test]
    fn wrap_values_past_the_end() {
        assert_eq!(wrap(0, 10, 10), 0);
        assert_eq!(wrap(0, 23, 10), 3);
        assert_eq!(wrap(0, 4, 10), 4);
    }

    #[test]
    fn wrap_f64_handles_fractions() {
        assert!((wrap_f64(0.0, -8.0, 64.0) - 56.0).abs() < 1e-9);
        assert!((wrap_f64(0.0, 70.5, 64.0) - 6.5).abs() < 1e-9);
    }

    #[test]
    fn signum_clamps_each_axis() {
        assert_eq!(IVec2::new(5, -3).signum(), IVec2::new(1, -1));
        assert_eq!(IVec2::new(0, 9).signum(), IVec2::DOWN);
    }

    #[test]
    fn direction_names() {
        assert_eq!(IVec2::UP.direction_name(), "up");
        assert_eq!(IVec2::new(-1, 1).direction_name(), "down-left");
        assert_eq!(IVec2::ZERO.direction_name(), "stance");
    }
}
