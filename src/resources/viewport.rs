//! Area viewport.
//!
//! The viewport is the window onto the map: a pixel size and the pixel offset
//! of its top-left corner. It can stay where it was put or follow an entity,
//! in which case the camera system re-centers it every step.

use bevy_ecs::prelude::{Entity, Resource};

use crate::coords::RCoord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingMode {
    /// Offset only changes when set explicitly.
    #[default]
    Manual,
    /// Keep the entity centered.
    FollowEntity(Entity),
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Viewport {
    size: (f64, f64),
    offset: (f64, f64),
    mode: TrackingMode,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: (width, height),
            offset: (0.0, 0.0),
            mode: TrackingMode::Manual,
        }
    }

    pub fn size(&self) -> (f64, f64) {
        self.size
    }

    /// Pixel offset of the top-left corner.
    pub fn offset(&self) -> (f64, f64) {
        self.offset
    }

    pub fn mode(&self) -> TrackingMode {
        self.mode
    }

    /// Put the top-left corner at `offset` and stop tracking.
    pub fn jump_to(&mut self, offset: (f64, f64)) {
        self.mode = TrackingMode::Manual;
        self.offset = offset;
    }

    /// Center on `pos` once and stop tracking.
    pub fn jump_to_position(&mut self, pos: RCoord) {
        self.mode = TrackingMode::Manual;
        self.center_on(pos);
    }

    /// Keep `entity` centered from now on.
    pub fn track_entity(&mut self, entity: Entity) {
        self.mode = TrackingMode::FollowEntity(entity);
    }

    pub fn tracked_entity(&self) -> Option<Entity> {
        match self.mode {
            TrackingMode::FollowEntity(e) => Some(e),
            TrackingMode::Manual => None,
        }
    }

    /// Drop tracking of an entity that is going away.
    pub fn forget(&mut self, entity: Entity) {
        if self.tracked_entity() == Some(entity) {
            self.mode = TrackingMode::Manual;
        }
    }

    pub(crate) fn center_on(&mut self, pos: RCoord) {
        self.offset = (pos.x - self.size.0 / 2.0, pos.y - self.size.1 / 2.0);
    }
}
