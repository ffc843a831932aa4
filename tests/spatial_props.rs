//! Property tests for coordinate wrapping and the layer depth bijection.

use proptest::prelude::*;

use tilewalk::coords::{ICoord, IVec2, VICoord, wrap};
use tilewalk::resources::tilegrid::TileGrid;

/// Distinct, finite layer depths.
fn depths() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::btree_set(-500i32..500, 1..8)
        .prop_map(|set| set.into_iter().map(|d| f64::from(d) * 0.25).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn wrap_lands_in_range(value in any::<i32>(), max in 1i32..10_000) {
        let w = wrap(0, value, max);
        prop_assert!((0..max).contains(&w));
        prop_assert_eq!((i64::from(w) - i64::from(value)).rem_euclid(i64::from(max)), 0);
    }

    #[test]
    fn wrap_keeps_in_range_values(max in 1i32..10_000, frac in 0.0f64..1.0) {
        let value = ((f64::from(max) * frac) as i32).min(max - 1);
        prop_assert_eq!(wrap(0, value, max), value);
    }

    #[test]
    fn depth_and_slot_are_a_bijection(depths in depths()) {
        let mut grid = TileGrid::new(2, 2, IVec2::new(16, 16));
        for (i, d) in depths.iter().enumerate() {
            prop_assert_eq!(grid.push_layer(*d), Some(i as i32));
        }
        for (i, d) in depths.iter().enumerate() {
            prop_assert_eq!(grid.index_of(*d), i as i32);
            prop_assert_eq!(grid.depth_of(i as i32), *d);
        }
        for d in &depths {
            prop_assert_eq!(grid.push_layer(*d), None);
        }
    }

    #[test]
    fn virtual_and_physical_round_trip(x in 0i32..2, y in 0i32..2, depths in depths(), pick in any::<prop::sample::Index>()) {
        let mut grid = TileGrid::new(2, 2, IVec2::new(16, 16));
        for d in &depths {
            grid.push_layer(*d);
        }
        let z = pick.index(depths.len()) as i32;
        let phys = ICoord::new(x, y, z);
        let virt = grid.phys_to_virt(phys);
        prop_assert_eq!(virt, VICoord::new(x, y, depths[z as usize]));
        prop_assert_eq!(grid.virt_to_phys(virt), phys);
        prop_assert_eq!(grid.real_to_virt(grid.virt_to_real(virt)), virt);
    }

    #[test]
    fn looping_grids_accept_any_column(x in -10_000i32..10_000, y in 0i32..3) {
        let mut grid = TileGrid::new(5, 3, IVec2::new(8, 8)).with_looping(true, false);
        grid.push_layer(0.0);
        let c = ICoord::new(x, y, 0);
        prop_assert!(grid.in_bounds(c));
        let w = grid.wrap(c);
        prop_assert!((0..5).contains(&w.x));
        prop_assert_eq!(w.y, y);
        prop_assert!(grid.tile(c).is_some());
    }
}
