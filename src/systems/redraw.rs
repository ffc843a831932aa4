//! Redraw detection and the draw pass.
//!
//! A frame needs redrawing if something asked for it explicitly, if any
//! entity's animation moved to another frame, or if any tile type visible
//! through the viewport did. Drawing hands every visible image to a
//! [`Renderer`] and clears the explicit request.

use bevy_ecs::prelude::*;
use rustc_hash::FxHashSet;

use crate::components::animation::ImageKey;
use crate::components::mapposition::MapPosition;
use crate::components::sprite::Sprite;
use crate::coords::ICoord;
use crate::resources::redraw::RedrawRequest;
use crate::resources::roster::Roster;
use crate::resources::tilegrid::TileGrid;
use crate::resources::viewport::Viewport;
use crate::resources::worldtime::WorldTime;

/// Backend that puts images on screen.
pub trait Renderer {
    /// Draw `image` with its top-left corner at pixel (`x`, `y`). Higher `z`
    /// draws on top.
    fn draw_image(&mut self, image: &ImageKey, x: f64, y: f64, z: f64);
}

/// Visible cells as (unwrapped, wrapped) physical coordinates.
fn visible_cells(grid: &TileGrid, viewport: &Viewport) -> Vec<(ICoord, ICoord)> {
    let cube = grid.visible_tiles(viewport.offset(), viewport.size());
    let mut cells = Vec::new();
    for z in cube.z1..cube.z2 {
        for y in cube.y1..cube.y2 {
            for x in cube.x1..cube.x2 {
                let at = ICoord::new(x, y, z);
                let wrapped = grid.wrap(at);
                if grid.in_bounds(wrapped) {
                    cells.push((at, wrapped));
                }
            }
        }
    }
    cells
}

pub fn area_needs_redraw(world: &World) -> bool {
    if world.resource::<RedrawRequest>().is_requested() {
        return true;
    }
    let now = world.resource::<WorldTime>().now_ms;
    let roster = world.resource::<Roster>();
    let entity_changed = roster
        .update_order()
        .into_iter()
        .any(|e| world.get::<Sprite>(e).is_some_and(|s| s.needs_redraw(now)));
    if entity_changed {
        return true;
    }

    let grid = world.resource::<TileGrid>();
    let viewport = world.resource::<Viewport>();
    let mut checked = FxHashSet::default();
    visible_cells(grid, viewport).into_iter().any(|(_, cell)| {
        grid.tile(cell)
            .and_then(|t| t.type_id)
            .filter(|id| checked.insert(*id))
            .and_then(|id| grid.tile_type(id))
            .is_some_and(|ty| ty.anim.needs_redraw(now))
    })
}

/// Draw the visible tiles, then every entity, and clear the redraw request.
pub fn draw_area(world: &mut World, renderer: &mut dyn Renderer) {
    let now = world.resource::<WorldTime>().now_ms;
    let viewport = world.resource::<Viewport>().clone();

    {
        let mut grid = world.resource_mut::<TileGrid>();
        let dim = grid.tile_dimensions();
        for (at, cell) in visible_cells(&grid, &viewport) {
            let depth = grid.depth_of(cell.z);
            let Some(id) = grid.tile(cell).and_then(|t| t.type_id) else {
                continue;
            };
            if let Some(ty) = grid.tile_type_mut(id)
                && let Some(image) = ty.anim.frame(now)
            {
                renderer.draw_image(
                    image,
                    f64::from(at.x * dim.x),
                    f64::from(at.y * dim.y),
                    depth,
                );
            }
        }
    }

    let order = world.resource::<Roster>().update_order();
    for entity in order {
        let Some(pos) = world.get::<MapPosition>(entity).map(|p| p.pos) else {
            continue;
        };
        let z = pos.z + world.resource::<TileGrid>().isometric_z_off(pos.y);
        if let Some(mut sprite) = world.get_mut::<Sprite>(entity)
            && let Some(image) = sprite.frame(now)
        {
            renderer.draw_image(image, pos.x, pos.y, z);
        }
    }

    world.resource_mut::<RedrawRequest>().take();
}
