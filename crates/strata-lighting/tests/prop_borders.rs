use proptest::prelude::*;
use strata_lighting::{LightBorders, LightingStore};

fn dims() -> impl Strategy<Value = (usize, usize, usize)> {
    (1usize..=3, 1usize..=3, 1usize..=3)
}

fn plane(n: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(0.0f32..=1.0, n)
}

proptest! {
    // Neighbor mapping: the store hands each chunk the planes its
    // neighbors point at it, keyed by the opposite face.
    #[test]
    fn neighbor_borders_mapping(((sx, sy, sz), xn, xp, zn, zp) in dims().prop_flat_map(|d| {
        let (sx, sy, sz) = d;
        (Just(d), plane(sy * sz), plane(sy * sz), plane(sy * sx), plane(sy * sx))
    })) {
        let store = LightingStore::new();

        // Left neighbor provides its +X to our -X.
        let mut left = LightBorders::new(sx, sy, sz);
        left.xp = xn.clone();
        prop_assert!(store.update_borders(-1, 0, left));

        // Right neighbor provides its -X to our +X.
        let mut right = LightBorders::new(sx, sy, sz);
        right.xn = xp.clone();
        prop_assert!(store.update_borders(1, 0, right));

        // Front neighbor (negative Z) provides its +Z to our -Z.
        let mut front = LightBorders::new(sx, sy, sz);
        front.zp = zn.clone();
        prop_assert!(store.update_borders(0, -1, front));

        // Back neighbor (positive Z) provides its -Z to our +Z.
        let mut back = LightBorders::new(sx, sy, sz);
        back.zn = zp.clone();
        prop_assert!(store.update_borders(0, 1, back));

        let nb = store.get_neighbor_borders(0, 0);
        prop_assert_eq!(nb.xn.as_deref(), Some(&xn[..]));
        prop_assert_eq!(nb.xp.as_deref(), Some(&xp[..]));
        prop_assert_eq!(nb.zn.as_deref(), Some(&zn[..]));
        prop_assert_eq!(nb.zp.as_deref(), Some(&zp[..]));
    }

    // Republishing identical planes must not report a change.
    #[test]
    fn republish_same_planes_is_quiet((sx, sy, sz) in dims()) {
        let store = LightingStore::new();
        let b = LightBorders::new(sx, sy, sz);
        prop_assert!(store.update_borders(5, -5, b.clone()));
        prop_assert!(!store.update_borders(5, -5, b));
    }
}
