//! Tile storage and coordinate algebra for one area.
//!
//! The grid is `width × height × layers`. Every layer has an authored depth
//! (a float) and a physical slot index; the two are kept in a strict
//! bijection. Asking for the slot of a depth that was never registered means
//! the loaded content is inconsistent and is fatal.
//!
//! X and Y may loop. On a looping axis any coordinate is in bounds and is
//! wrapped before indexing; on a non-looping axis coordinates must lie in
//! `[0, dimension)`.

use bevy_ecs::prelude::Resource;
use log::error;
use rustc_hash::FxHashMap;

use crate::coords::{ICoord, ICube, IVec2, RCoord, VICoord, wrap, wrap_f64};
use crate::resources::tile::{Tile, TileFlag, TileSet, TileType, TileTypeId};

/// Depth units added per tile row of pixel y, for isometric draw ordering.
pub const ISOMETRIC_ZOFF_PER_TILE: f64 = 0.001;

#[derive(Resource, Debug, Clone)]
pub struct TileGrid {
    width: i32,
    height: i32,
    tile_dim: IVec2,
    loop_x: bool,
    loop_y: bool,
    /// Layer depth by physical slot.
    depths: Vec<f64>,
    /// Physical slot by depth bits.
    depth_index: FxHashMap<u64, i32>,
    /// Tiles in layer-major, then row-major order.
    tiles: Vec<Tile>,
    types: Vec<TileType>,
    tilesets: FxHashMap<String, TileSet>,
}

impl TileGrid {
    /// An empty grid with no layers. `tile_dim` is the pixel size of a tile.
    pub fn new(width: i32, height: i32, tile_dim: IVec2) -> Self {
        Self {
            width: width.max(0),
            height: height.max(0),
            tile_dim,
            loop_x: false,
            loop_y: false,
            depths: Vec::new(),
            depth_index: FxHashMap::default(),
            tiles: Vec::new(),
            types: Vec::new(),
            tilesets: FxHashMap::default(),
        }
    }

    pub fn with_looping(mut self, loop_x: bool, loop_y: bool) -> Self {
        self.loop_x = loop_x;
        self.loop_y = loop_y;
        self
    }

    /// Append a layer at `depth`, filled with untyped tiles.
    ///
    /// Returns the new physical slot, or `None` if `depth` is already taken.
    pub fn push_layer(&mut self, depth: f64) -> Option<i32> {
        let key = depth_key(depth);
        if self.depth_index.contains_key(&key) {
            return None;
        }
        let idx = self.depths.len() as i32;
        self.depths.push(depth);
        self.depth_index.insert(key, idx);
        let cells = (self.width * self.height) as usize;
        self.tiles.resize_with(self.tiles.len() + cells, Tile::default);
        Some(idx)
    }

    /// Register a tile type, returning its id.
    pub fn add_type(&mut self, ty: TileType) -> TileTypeId {
        self.types.push(ty);
        TileTypeId(self.types.len() as u32 - 1)
    }

    pub fn add_tileset(&mut self, name: impl Into<String>, set: TileSet) {
        self.tilesets.insert(name.into(), set);
    }

    // --- dimensions -----------------------------------------------------

    /// Grid size as (width, height, layer count).
    pub fn dimensions(&self) -> ICoord {
        ICoord::new(self.width, self.height, self.depths.len() as i32)
    }

    pub fn tile_dimensions(&self) -> IVec2 {
        self.tile_dim
    }

    pub fn loops_x(&self) -> bool {
        self.loop_x
    }

    pub fn loops_y(&self) -> bool {
        self.loop_y
    }

    /// Map size in pixels.
    pub fn pixel_size(&self) -> (f64, f64) {
        (
            f64::from(self.width * self.tile_dim.x),
            f64::from(self.height * self.tile_dim.y),
        )
    }

    // --- depth table ----------------------------------------------------

    /// Physical slot of a registered depth.
    ///
    /// # Panics
    ///
    /// If `depth` was never registered. Content referring to an unknown layer
    /// cannot be interpreted.
    pub fn index_of(&self, depth: f64) -> i32 {
        match self.try_index_of(depth) {
            Some(idx) => idx,
            None => {
                error!("unregistered layer depth {depth}; known depths: {:?}", self.depths);
                panic!("unregistered layer depth {depth}");
            }
        }
    }

    pub fn try_index_of(&self, depth: f64) -> Option<i32> {
        self.depth_index.get(&depth_key(depth)).copied()
    }

    /// Depth of a physical slot produced by this grid.
    pub fn depth_of(&self, index: i32) -> f64 {
        self.depths[index as usize]
    }

    pub fn depths(&self) -> &[f64] {
        &self.depths
    }

    // --- conversions ----------------------------------------------------

    pub fn phys_to_virt(&self, c: ICoord) -> VICoord {
        VICoord::new(c.x, c.y, self.depth_of(c.z))
    }

    pub fn virt_to_phys(&self, c: VICoord) -> ICoord {
        ICoord::new(c.x, c.y, self.index_of(c.z))
    }

    /// Pixel position of the top-left corner of a virtual tile.
    pub fn virt_to_real(&self, c: VICoord) -> RCoord {
        RCoord::new(
            f64::from(c.x * self.tile_dim.x),
            f64::from(c.y * self.tile_dim.y),
            c.z,
        )
    }

    /// Tile containing a pixel position. The depth is taken as is.
    pub fn real_to_virt(&self, r: RCoord) -> VICoord {
        VICoord::new(
            (r.x / f64::from(self.tile_dim.x)).floor() as i32,
            (r.y / f64::from(self.tile_dim.y)).floor() as i32,
            r.z,
        )
    }

    pub fn phys_to_real(&self, c: ICoord) -> RCoord {
        self.virt_to_real(self.phys_to_virt(c))
    }

    pub fn real_to_phys(&self, r: RCoord) -> ICoord {
        self.virt_to_phys(self.real_to_virt(r))
    }

    /// Depth offset for isometric ordering at pixel row `y`.
    pub fn isometric_z_off(&self, y: f64) -> f64 {
        y / f64::from(self.tile_dim.y) * ISOMETRIC_ZOFF_PER_TILE
    }

    // --- bounds and wrapping -------------------------------------------

    pub fn in_bounds(&self, c: ICoord) -> bool {
        (self.loop_x || (0..self.width).contains(&c.x))
            && (self.loop_y || (0..self.height).contains(&c.y))
            && (0..self.depths.len() as i32).contains(&c.z)
    }

    pub fn in_bounds_virt(&self, c: VICoord) -> bool {
        self.try_index_of(c.z)
            .is_some_and(|z| self.in_bounds(ICoord::new(c.x, c.y, z)))
    }

    pub fn in_bounds_real(&self, r: RCoord) -> bool {
        self.in_bounds_virt(self.real_to_virt(r))
    }

    /// Wrap looping axes. Non-looping axes are returned unchanged.
    pub fn wrap(&self, c: ICoord) -> ICoord {
        ICoord::new(
            if self.loop_x && self.width > 0 { wrap(0, c.x, self.width) } else { c.x },
            if self.loop_y && self.height > 0 { wrap(0, c.y, self.height) } else { c.y },
            c.z,
        )
    }

    pub fn wrap_virt(&self, c: VICoord) -> VICoord {
        let w = self.wrap(ICoord::new(c.x, c.y, 0));
        VICoord::new(w.x, w.y, c.z)
    }

    pub fn wrap_real(&self, r: RCoord) -> RCoord {
        let (pw, ph) = self.pixel_size();
        RCoord::new(
            if self.loop_x && pw > 0.0 { wrap_f64(0.0, r.x, pw) } else { r.x },
            if self.loop_y && ph > 0.0 { wrap_f64(0.0, r.y, ph) } else { r.y },
            r.z,
        )
    }

    // --- lookup ---------------------------------------------------------

    pub fn tile(&self, c: ICoord) -> Option<&Tile> {
        self.cell(c).map(|i| &self.tiles[i])
    }

    pub fn tile_mut(&mut self, c: ICoord) -> Option<&mut Tile> {
        self.cell(c).map(|i| &mut self.tiles[i])
    }

    pub fn tile_virt(&self, c: VICoord) -> Option<&Tile> {
        self.try_index_of(c.z)
            .and_then(|z| self.tile(ICoord::new(c.x, c.y, z)))
    }

    pub fn tile_type(&self, id: TileTypeId) -> Option<&TileType> {
        self.types.get(id.0 as usize)
    }

    pub fn tile_type_mut(&mut self, id: TileTypeId) -> Option<&mut TileType> {
        self.types.get_mut(id.0 as usize)
    }

    /// Type bound to the tile at `c`, if any.
    pub fn type_at(&self, c: ICoord) -> Option<&TileType> {
        self.tile(c)
            .and_then(|t| t.type_id)
            .and_then(|id| self.tile_type(id))
    }

    pub fn types(&self) -> &[TileType] {
        &self.types
    }

    pub fn tileset(&self, name: &str) -> Option<&TileSet> {
        self.tilesets.get(name)
    }

    /// Two-tier flag query for the tile at `c`. Missing tiles have no flags.
    pub fn has_flag(&self, c: ICoord, flag: TileFlag) -> bool {
        self.tile(c).is_some_and(|tile| {
            let ty = tile.type_id.and_then(|id| self.tile_type(id));
            tile.has_flag(flag, ty)
        })
    }

    /// Tiles overlapping a viewport at pixel `offset` of pixel `size`.
    ///
    /// Clamped to the map on non-looping axes only; on looping axes the range
    /// may extend past the map and callers wrap each coordinate.
    pub fn visible_tiles(&self, offset: (f64, f64), size: (f64, f64)) -> ICube {
        let tw = f64::from(self.tile_dim.x);
        let th = f64::from(self.tile_dim.y);
        let mut cube = ICube {
            x1: (offset.0 / tw).floor() as i32,
            y1: (offset.1 / th).floor() as i32,
            z1: 0,
            x2: ((offset.0 + size.0) / tw).ceil() as i32,
            y2: ((offset.1 + size.1) / th).ceil() as i32,
            z2: self.depths.len() as i32,
        };
        if !self.loop_x {
            cube.x1 = cube.x1.clamp(0, self.width);
            cube.x2 = cube.x2.clamp(0, self.width);
        }
        if !self.loop_y {
            cube.y1 = cube.y1.clamp(0, self.height);
            cube.y2 = cube.y2.clamp(0, self.height);
        }
        cube
    }

    fn cell(&self, c: ICoord) -> Option<usize> {
        if !self.in_bounds(c) {
            return None;
        }
        let c = self.wrap(c);
        Some(((c.z * self.height + c.y) * self.width + c.x) as usize)
    }
}

/// Hash key of a depth. `-0.0` and `0.0` are the same layer.
fn depth_key(depth: f64) -> u64 {
    if depth == 0.0 { 0.0f64.to_bits() } else { depth.to_bits() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> TileGrid {
        let mut g = TileGrid::new(4, 3, IVec2::new(32, 16));
        g.push_layer(0.0);
        g.push_layer(1.5);
        g
    }

    #[test]
    fn depth_table_is_a_bijection() {
        let g = grid();
        for i in 0..2 {
            assert_eq!(g.index_of(g.depth_of(i)), i);
        }
        assert_eq!(g.depth_of(g.index_of(1.5)), 1.5);
        assert_eq!(g.try_index_of(-0.0), Some(0));
    }

    #[test]
    fn duplicate_depths_are_refused() {
        let mut g = grid();
        assert_eq!(g.push_layer(1.5), None);
        assert_eq!(g.dimensions(), ICoord::new(4, 3, 2));
    }

    #[test]
    #[should_panic(expected = "unregistered layer depth")]
    fn unknown_depth_is_fatal() {
        grid().index_of(7.0);
    }

    #[test]
    fn virtual_real_conversion_floors() {
        let g = grid();
        let r = g.virt_to_real(VICoord::new(2, 1, 1.5));
        assert_eq!(r, RCoord::new(64.0, 16.0, 1.5));
        assert_eq!(g.real_to_virt(RCoord::new(63.9, 31.9, 1.5)), VICoord::new(1, 1, 1.5));
        assert_eq!(g.real_to_virt(RCoord::new(-0.5, 0.0, 0.0)), VICoord::new(-1, 0, 0.0));
        assert_eq!(g.real_to_phys(r), ICoord::new(2, 1, 1));
    }

    #[test]
    fn bounds_respect_looping_axes() {
        let g = grid();
        assert!(g.in_bounds(ICoord::new(3, 2, 1)));
        assert!(!g.in_bounds(ICoord::new(4, 0, 0)));
        assert!(!g.in_bounds(ICoord::new(0, -1, 0)));
        assert!(!g.in_bounds(ICoord::new(0, 0, 2)));

        let g = grid().with_looping(true, false);
        assert!(g.in_bounds(ICoord::new(-7, 0, 0)));
        assert!(!g.in_bounds(ICoord::new(0, 3, 0)));
        assert_eq!(g.wrap(ICoord::new(-1, 5, 0)), ICoord::new(3, 5, 0));
    }

    #[test]
    fn looping_lookup_wraps_to_the_same_tile() {
        let mut g = grid().with_looping(true, true);
        g.tile_mut(ICoord::new(0, 0, 0)).unwrap().flags.manip().set_nowalk(true);
        assert!(g.has_flag(ICoord::new(4, 3, 0), TileFlag::Nowalk));
        assert!(g.has_flag(ICoord::new(-4, -3, 0), TileFlag::Nowalk));
    }

    #[test]
    fn isometric_offset_is_linear_in_y() {
        let g = grid();
        assert!((g.isometric_z_off(32.0) - 0.002).abs() < 1e-12);
        assert_eq!(g.isometric_z_off(0.0), 0.0);
    }

    #[test]
    fn visible_tiles_clamp_only_non_looping_axes() {
        let g = grid();
        let cube = g.visible_tiles((-40.0, -8.0), (100.0, 40.0));
        assert_eq!((cube.x1, cube.x2, cube.y1, cube.y2), (0, 2, 0, 2));

        let g = grid().with_looping(true, false);
        let cube = g.visible_tiles((-40.0, -8.0), (100.0, 40.0));
        assert_eq!((cube.x1, cube.x2), (-2, 2));
        assert_eq!((cube.y1, cube.y2), (0, 2));
    }

    #[test]
    fn type_flags_apply_through_the_grid() {
        let mut g = grid();
        let mut ty = TileType::default();
        ty.flags.manip().set_nowalk_player(true);
        let id = g.add_type(ty);
        g.tile_mut(ICoord::new(1, 1, 0)).unwrap().type_id = Some(id);
        assert!(g.has_flag(ICoord::new(1, 1, 0), TileFlag::NowalkPlayer));
        assert!(!g.has_flag(ICoord::new(1, 2, 0), TileFlag::NowalkPlayer));
    }
}
