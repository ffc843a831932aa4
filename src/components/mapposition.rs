use bevy_ecs::prelude::Component;

use crate::coords::RCoord;

/// Pixel position of an entity's top-left corner. `pos.z` is the layer depth.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct MapPosition {
    pub pos: RCoord,
}

impl MapPosition {
    pub fn new(pos: RCoord) -> Self {
        Self { pos }
    }
}
