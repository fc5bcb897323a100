use strata_geom::Vec3;

/// Growable CPU-side vertex arrays for one render-pass bucket.
#[derive(Default, Clone)]
pub struct MeshBuild {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub col: Vec<u8>,
    pub idx: Vec<u32>,
}

impl MeshBuild {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    #[inline]
    pub fn reserve_quads(&mut self, n_quads: usize) {
        self.pos.reserve(n_quads * 4 * 3);
        self.norm.reserve(n_quads * 4 * 3);
        self.uv.reserve(n_quads * 4 * 2);
        self.col.reserve(n_quads * 4 * 4);
        self.idx.reserve(n_quads * 6);
    }

    /// Appends a quad as two triangles. Corners must already be wound
    /// counter-clockwise for the intended normal.
    pub fn add_quad(
        &mut self,
        corners: [Vec3; 4],
        normal: Vec3,
        uvs: [(f32, f32); 4],
        cols: [[u8; 4]; 4],
    ) {
        let base = (self.pos.len() / 3) as u32;
        for i in 0..4 {
            let p = corners[i];
            self.pos.extend_from_slice(&[p.x, p.y, p.z]);
            self.norm.extend_from_slice(&[normal.x, normal.y, normal.z]);
            self.uv.extend_from_slice(&[uvs[i].0, uvs[i].1]);
            self.col.extend_from_slice(&cols[i]);
        }
        self.idx
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    pub fn quad_count(&self) -> usize {
        self.idx.len() / 6
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn quad_appends_consistent_arrays() {
        let mut m = MeshBuild::default();
        let c = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        m.add_quad(c, Vec3::new(0.0, 0.0, -1.0), [(0.0, 0.0); 4], [[255; 4]; 4]);
        m.add_quad(c, Vec3::new(0.0, 0.0, -1.0), [(0.0, 0.0); 4], [[255; 4]; 4]);
        assert_eq!(m.vertex_count(), 8);
        assert_eq!(m.norm.len(), 24);
        assert_eq!(m.uv.len(), 16);
        assert_eq!(m.col.len(), 32);
        assert_eq!(m.quad_count(), 2);
        // Indices only reference vertices this build appended.
        let max = *m.idx.iter().max().unwrap();
        assert!((max as usize) < m.vertex_count());
    }

    proptest! {
        #[test]
        fn indices_always_reference_appended_vertices(n_quads in 1usize..64) {
            let mut m = MeshBuild::default();
            let c = [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ];
            for _ in 0..n_quads {
                m.add_quad(c, Vec3::new(0.0, 0.0, -1.0), [(0.0, 0.0); 4], [[255; 4]; 4]);
            }
            prop_assert_eq!(m.quad_count(), n_quads);
            prop_assert_eq!(m.vertex_count(), n_quads * 4);
            prop_assert!(m.idx.iter().all(|&i| (i as usize) < m.vertex_count()));
        }
    }
}
