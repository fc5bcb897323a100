//! Sunlight casting, flood-fill propagation, and border exchange between
//! neighboring chunks.
#![forbid(unsafe_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use strata_blocks::BlockRegistry;
use strata_chunk::{ChunkBuf, MAX_LIGHT};

pub const MIN_LIGHT: f32 = 0.2;
/// Light lost per cell crossed during flood fill.
pub const LIGHT_ABSORPTION: f32 = 0.0625;
pub const BLOCK_SIDE_DIMMING: f32 = 0.075;
pub const OCCLUSION_INTENS: f32 = 0.0625;

const EPS: f32 = 1e-6;

/// Light values captured from the four side faces of a chunk.
///
/// X planes are `sy * sz` with index `y * sz + z`; Z planes are `sy * sx`
/// with index `y * sx + x`.
#[derive(Clone, Debug)]
pub struct LightBorders {
    pub xn: Vec<f32>,
    pub xp: Vec<f32>,
    pub zn: Vec<f32>,
    pub zp: Vec<f32>,
}

impl LightBorders {
    pub fn new(sx: usize, sy: usize, sz: usize) -> Self {
        Self {
            xn: vec![0.0; sy * sz],
            xp: vec![0.0; sy * sz],
            zn: vec![0.0; sy * sx],
            zp: vec![0.0; sy * sx],
        }
    }

    pub fn from_buf(buf: &ChunkBuf) -> Self {
        let (sx, sy, sz) = (buf.sx, buf.sy, buf.sz);
        let mut b = Self::new(sx, sy, sz);
        for y in 0..sy {
            for z in 0..sz {
                b.xn[y * sz + z] = buf.light[buf.idx(0, y, z)];
                b.xp[y * sz + z] = buf.light[buf.idx(sx - 1, y, z)];
            }
            for x in 0..sx {
                b.zn[y * sx + x] = buf.light[buf.idx(x, y, 0)];
                b.zp[y * sx + x] = buf.light[buf.idx(x, y, sz - 1)];
            }
        }
        b
    }

    fn differs(&self, other: &LightBorders) -> bool {
        let ne = |a: &[f32], b: &[f32]| {
            a.len() != b.len() || a.iter().zip(b).any(|(x, y)| (x - y).abs() > EPS)
        };
        ne(&self.xn, &other.xn)
            || ne(&self.xp, &other.xp)
            || ne(&self.zn, &other.zn)
            || ne(&self.zp, &other.zp)
    }
}

/// Border planes contributed by the four lateral neighbors, if built.
#[derive(Default)]
pub struct NeighborBorders {
    pub xn: Option<Vec<f32>>,
    pub xp: Option<Vec<f32>>,
    pub zn: Option<Vec<f32>>,
    pub zp: Option<Vec<f32>>,
}

/// Shared store of per-chunk border planes. Workers publish planes after
/// relighting; neighbors read them when they build.
pub struct LightingStore {
    inner: Mutex<HashMap<(i32, i32), LightBorders>>,
}

impl Default for LightingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LightingStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Publishes a chunk's planes. Returns true when they changed, which
    /// means lateral neighbors should be re-queued.
    pub fn update_borders(&self, cx: i32, cz: i32, borders: LightBorders) -> bool {
        let mut m = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match m.get(&(cx, cz)) {
            Some(prev) if !prev.differs(&borders) => false,
            _ => {
                m.insert((cx, cz), borders);
                true
            }
        }
    }

    /// Planes facing chunk (cx, cz) from its four lateral neighbors: the
    /// -X neighbor contributes its +X plane, and so on.
    pub fn get_neighbor_borders(&self, cx: i32, cz: i32) -> NeighborBorders {
        let m = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        NeighborBorders {
            xn: m.get(&(cx - 1, cz)).map(|b| b.xp.clone()),
            xp: m.get(&(cx + 1, cz)).map(|b| b.xn.clone()),
            zn: m.get(&(cx, cz - 1)).map(|b| b.zp.clone()),
            zp: m.get(&(cx, cz + 1)).map(|b| b.zn.clone()),
        }
    }

    pub fn clear_chunk(&self, cx: i32, cz: i32) {
        let mut m = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        m.remove(&(cx, cz));
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Top-down sunlight: each column is fully lit until the first
/// light-blocking block, dark below it.
pub fn cast_sunlight(buf: &mut ChunkBuf, reg: &BlockRegistry) {
    for z in 0..buf.sz {
        for x in 0..buf.sx {
            let mut open_above = true;
            for y in (0..buf.sy).rev() {
                let i = buf.idx(x, y, z);
                if open_above && reg.blocks_light(buf.blocks[i]) {
                    open_above = false;
                }
                buf.light[i] = if open_above { MAX_LIGHT } else { 0.0 };
            }
        }
    }
}

/// BFS flood fill from every lit cell and the neighbor border planes.
/// Each step into a translucent cell costs LIGHT_ABSORPTION; the fill
/// stops when no cell can be brightened.
pub fn flood_fill(buf: &mut ChunkBuf, reg: &BlockRegistry, nb: &NeighborBorders) {
    let (sx, sy, sz) = (buf.sx, buf.sy, buf.sz);
    let mut q: VecDeque<(usize, usize, usize)> = VecDeque::new();
    for z in 0..sz {
        for y in 0..sy {
            for x in 0..sx {
                if buf.light[buf.idx(x, y, z)] > LIGHT_ABSORPTION + EPS {
                    q.push_back((x, y, z));
                }
            }
        }
    }
    // Neighbor planes act as extra sources one absorption step away.
    let mut seed = |x: usize, y: usize, z: usize, v: f32, buf: &mut ChunkBuf, q: &mut VecDeque<(usize, usize, usize)>| {
        let i = buf.idx(x, y, z);
        let incoming = (v - LIGHT_ABSORPTION).clamp(0.0, MAX_LIGHT);
        if incoming > buf.light[i] + EPS && !reg.blocks_light(buf.blocks[i]) {
            buf.light[i] = incoming;
            q.push_back((x, y, z));
        }
    };
    if let Some(plane) = &nb.xn {
        for y in 0..sy {
            for z in 0..sz {
                seed(0, y, z, plane[y * sz + z], buf, &mut q);
            }
        }
    }
    if let Some(plane) = &nb.xp {
        for y in 0..sy {
            for z in 0..sz {
                seed(sx - 1, y, z, plane[y * sz + z], buf, &mut q);
            }
        }
    }
    if let Some(plane) = &nb.zn {
        for y in 0..sy {
            for x in 0..sx {
                seed(x, y, 0, plane[y * sx + x], buf, &mut q);
            }
        }
    }
    if let Some(plane) = &nb.zp {
        for y in 0..sy {
            for x in 0..sx {
                seed(x, y, sz - 1, plane[y * sx + x], buf, &mut q);
            }
        }
    }
    while let Some((x, y, z)) = q.pop_front() {
        let level = buf.light[buf.idx(x, y, z)];
        let spread = level - LIGHT_ABSORPTION;
        if spread <= EPS {
            continue;
        }
        let steps = [
            (x as i32 + 1, y as i32, z as i32),
            (x as i32 - 1, y as i32, z as i32),
            (x as i32, y as i32 + 1, z as i32),
            (x as i32, y as i32 - 1, z as i32),
            (x as i32, y as i32, z as i32 + 1),
            (x as i32, y as i32, z as i32 - 1),
        ];
        for (nx, ny, nz) in steps {
            if !buf.in_bounds(nx, ny, nz) {
                continue;
            }
            let (nxu, nyu, nzu) = (nx as usize, ny as usize, nz as usize);
            let i = buf.idx(nxu, nyu, nzu);
            if reg.blocks_light(buf.blocks[i]) {
                continue;
            }
            if spread > buf.light[i] + EPS {
                buf.light[i] = spread;
                q.push_back((nxu, nyu, nzu));
            }
        }
    }
}

/// Full relight: sunlight cast, then flood fill seeded from the store's
/// neighbor planes. Clears `light_dirty` and returns the chunk's own
/// border planes for publishing.
pub fn compute_light_with_borders(
    buf: &mut ChunkBuf,
    store: &LightingStore,
    reg: &BlockRegistry,
) -> LightBorders {
    cast_sunlight(buf, reg);
    let nb = store.get_neighbor_borders(buf.coord.cx, buf.coord.cz);
    flood_fill(buf, reg, &nb);
    buf.light_dirty = false;
    LightBorders::from_buf(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_chunk::ChunkCoord;

    fn reg() -> BlockRegistry {
        BlockRegistry::default_catalog()
    }

    fn buf(sx: usize, sy: usize, sz: usize) -> ChunkBuf {
        ChunkBuf::with_dims(ChunkCoord::new(0, 0), sx, sy, sz)
    }

    #[test]
    fn open_column_is_fully_sunlit() {
        let r = reg();
        let mut c = buf(4, 16, 4);
        cast_sunlight(&mut c, &r);
        for y in 0..16 {
            assert_eq!(c.get_light(1, y, 1), Some(MAX_LIGHT));
        }
    }

    #[test]
    fn sunlight_stops_at_first_blocker() {
        let r = reg();
        let mut c = buf(4, 16, 4);
        let stone = r.id_by_name("stone").unwrap();
        c.set_block(1, 10, 1, stone);
        cast_sunlight(&mut c, &r);
        assert_eq!(c.get_light(1, 12, 1), Some(MAX_LIGHT));
        assert_eq!(c.get_light(1, 10, 1), Some(0.0));
        assert_eq!(c.get_light(1, 3, 1), Some(0.0));
    }

    #[test]
    fn sunlight_passes_translucents() {
        let r = reg();
        let mut c = buf(4, 16, 4);
        c.set_block(1, 10, 1, r.id_by_name("leaf").unwrap());
        c.set_block(1, 8, 1, r.id_by_name("water").unwrap());
        cast_sunlight(&mut c, &r);
        assert_eq!(c.get_light(1, 10, 1), Some(MAX_LIGHT));
        assert_eq!(c.get_light(1, 8, 1), Some(MAX_LIGHT));
        assert_eq!(c.get_light(1, 0, 1), Some(MAX_LIGHT));
    }

    #[test]
    fn flood_decays_into_overhangs() {
        let r = reg();
        let stone = r.id_by_name("stone").unwrap();
        let mut c = buf(8, 8, 8);
        // Roof over x in 1..8, open at x == 0.
        for x in 1..8 {
            for z in 0..8 {
                c.set_block(x, 6, z, stone);
            }
        }
        cast_sunlight(&mut c, &r);
        flood_fill(&mut c, &r, &NeighborBorders::default());
        let l1 = c.get_light(1, 3, 3).unwrap();
        let l2 = c.get_light(2, 3, 3).unwrap();
        assert!((l1 - (MAX_LIGHT - LIGHT_ABSORPTION)).abs() < 1e-5);
        assert!((l2 - (MAX_LIGHT - 2.0 * LIGHT_ABSORPTION)).abs() < 1e-5);
        assert!(l2 < l1);
    }

    #[test]
    fn flood_never_exceeds_sources() {
        let r = reg();
        let mut c = buf(6, 6, 6);
        cast_sunlight(&mut c, &r);
        flood_fill(&mut c, &r, &NeighborBorders::default());
        for v in &c.light {
            assert!(*v >= 0.0 && *v <= MAX_LIGHT);
        }
    }

    #[test]
    fn flood_does_not_enter_solids() {
        let r = reg();
        let stone = r.id_by_name("stone").unwrap();
        let mut c = buf(4, 8, 4);
        c.set_block(2, 2, 2, stone);
        cast_sunlight(&mut c, &r);
        flood_fill(&mut c, &r, &NeighborBorders::default());
        assert_eq!(c.get_light(2, 2, 2), Some(0.0));
    }

    #[test]
    fn neighbor_plane_seeds_dark_chunk() {
        let r = reg();
        let stone = r.id_by_name("stone").unwrap();
        let mut c = buf(4, 4, 4);
        // Full roof: no sunlight anywhere inside.
        for x in 0..4 {
            for z in 0..4 {
                c.set_block(x, 3, z, stone);
            }
        }
        cast_sunlight(&mut c, &r);
        let mut nb = NeighborBorders::default();
        nb.xn = Some(vec![MAX_LIGHT; 4 * 4]);
        flood_fill(&mut c, &r, &nb);
        let edge = c.get_light(0, 1, 1).unwrap();
        assert!((edge - (MAX_LIGHT - LIGHT_ABSORPTION)).abs() < 1e-5);
        let deeper = c.get_light(1, 1, 1).unwrap();
        assert!((deeper - (MAX_LIGHT - 2.0 * LIGHT_ABSORPTION)).abs() < 1e-5);
    }

    #[test]
    fn compute_clears_light_dirty_and_publishes() {
        let r = reg();
        let store = LightingStore::new();
        let mut c = buf(4, 8, 4);
        let borders = compute_light_with_borders(&mut c, &store, &r);
        assert!(!c.light_dirty);
        assert!(store.update_borders(0, 0, borders.clone()));
        // Unchanged planes do not count as an update.
        assert!(!store.update_borders(0, 0, borders));
    }
}
