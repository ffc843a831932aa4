use bevy_ecs::prelude::*;

use crate::components::mapposition::MapPosition;
use crate::resources::viewport::Viewport;

/// Keep the tracked entity centered in the viewport.
pub fn follow_tracked_entity(mut viewport: ResMut<Viewport>, positions: Query<&MapPosition>) {
    if let Some(entity) = viewport.tracked_entity()
        && let Ok(pos) = positions.get(entity)
    {
        viewport.center_on(pos.pos);
    }
}
