use std::fmt;

/// Chunk coordinate in the horizontal plane. Chunks span the full world
/// height, so there is no vertical component.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    /// Cantor pairing over the sign-folded coordinates. Stable cache and
    /// save-file key.
    pub fn key(self) -> u64 {
        let a = fold(self.cx);
        let b = fold(self.cz);
        (a + b) * (a + b + 1) / 2 + b
    }

    #[inline]
    pub fn dist2_to(self, other: ChunkCoord) -> i64 {
        let dx = (self.cx - other.cx) as i64;
        let dz = (self.cz - other.cz) as i64;
        dx * dx + dz * dz
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> ChunkCoord {
        ChunkCoord::new(self.cx + dx, self.cz + dz)
    }
}

#[inline]
fn fold(v: i32) -> u64 {
    // Interleave negatives: 0, -1, 1, -2, 2, ...
    if v >= 0 {
        (v as u64) * 2
    } else {
        ((-(v as i64)) as u64) * 2 - 1
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.cx, self.cz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn keys_are_unique_over_a_window() {
        let mut seen = HashSet::new();
        for cx in -40..40 {
            for cz in -40..40 {
                assert!(seen.insert(ChunkCoord::new(cx, cz).key()), "collision at {},{}", cx, cz);
            }
        }
    }

    #[test]
    fn dist2_is_symmetric() {
        let a = ChunkCoord::new(3, -7);
        let b = ChunkCoord::new(-2, 5);
        assert_eq!(a.dist2_to(b), b.dist2_to(a));
        assert_eq!(a.dist2_to(a), 0);
    }

    proptest! {
        #[test]
        fn distinct_coords_get_distinct_keys(
            ax in -10_000i32..10_000, az in -10_000i32..10_000,
            bx in -10_000i32..10_000, bz in -10_000i32..10_000,
        ) {
            let a = ChunkCoord::new(ax, az);
            let b = ChunkCoord::new(bx, bz);
            prop_assert_eq!(a.key() == b.key(), a == b);
        }
    }
}
