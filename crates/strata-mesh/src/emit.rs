use std::collections::HashMap;

use strata_blocks::{ATLAS_CELL, Block, BlockRegistry, FaceRole, RenderPass};
use strata_chunk::ChunkBuf;
use strata_geom::{Aabb, Vec3};
use strata_lighting::{BLOCK_SIDE_DIMMING, MIN_LIGHT, OCCLUSION_INTENS};

use crate::chunk::ChunkMeshCPU;
use crate::face::Face;
use crate::mesh_build::MeshBuild;

/// Which lateral neighbor chunks were loaded when a build was scheduled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NeighborsLoaded {
    pub xn: bool,
    pub xp: bool,
    pub zn: bool,
    pub zp: bool,
}

impl NeighborsLoaded {
    pub fn all(&self) -> bool {
        self.xn && self.xp && self.zn && self.zp
    }
}

/// Borrowed block/light data from the four lateral neighbor chunks.
/// Missing neighbors read as air, so seam faces err on the side of being
/// drawn (they are rebuilt once the neighbor arrives).
#[derive(Default)]
pub struct NeighborBufs<'a> {
    pub xn: Option<&'a ChunkBuf>,
    pub xp: Option<&'a ChunkBuf>,
    pub zn: Option<&'a ChunkBuf>,
    pub zp: Option<&'a ChunkBuf>,
}

impl<'a> NeighborBufs<'a> {
    fn block(&self, buf: &ChunkBuf, x: i32, y: i32, z: i32) -> Block {
        if y < 0 || y >= buf.sy as i32 {
            return Block::AIR;
        }
        if buf.in_bounds(x, y, z) {
            return buf.blocks[buf.idx(x as usize, y as usize, z as usize)];
        }
        let (sx, sz) = (buf.sx as i32, buf.sz as i32);
        let pick = |nb: Option<&ChunkBuf>, lx: i32, lz: i32| -> Block {
            nb.and_then(|n| n.get_block(lx, y, lz)).unwrap_or(Block::AIR)
        };
        if x < 0 && (0..sz).contains(&z) {
            pick(self.xn, x + sx, z)
        } else if x >= sx && (0..sz).contains(&z) {
            pick(self.xp, x - sx, z)
        } else if z < 0 && (0..sx).contains(&x) {
            pick(self.zn, x, z + sz)
        } else if z >= sz && (0..sx).contains(&x) {
            pick(self.zp, x, z - sz)
        } else {
            // Diagonal neighbor; not tracked.
            Block::AIR
        }
    }

    fn light(&self, buf: &ChunkBuf, x: i32, y: i32, z: i32) -> f32 {
        if buf.in_bounds(x, y, z) {
            return buf.light[buf.idx(x as usize, y as usize, z as usize)];
        }
        let (sx, sz) = (buf.sx as i32, buf.sz as i32);
        let yy = y.clamp(0, buf.sy as i32 - 1);
        let pick = |nb: Option<&ChunkBuf>, lx: i32, lz: i32| -> Option<f32> {
            nb.and_then(|n| n.get_light(lx, yy, lz))
        };
        let v = if x < 0 && (0..sz).contains(&z) {
            pick(self.xn, x + sx, z)
        } else if x >= sx && (0..sz).contains(&z) {
            pick(self.xp, x - sx, z)
        } else if z < 0 && (0..sx).contains(&x) {
            pick(self.zn, x, z + sz)
        } else if z >= sz && (0..sx).contains(&x) {
            pick(self.zp, x, z - sz)
        } else {
            None
        };
        // Fall back to the nearest in-chunk cell so seams don't flash dark.
        v.unwrap_or_else(|| {
            let cx = x.clamp(0, sx - 1);
            let cz = z.clamp(0, sz - 1);
            buf.light[buf.idx(cx as usize, yy as usize, cz as usize)]
        })
    }
}

/// A face of `current` is emitted iff `neighbor` does not hide it:
/// air and billboards never hide, leaves never hide (so foliage reads as
/// a volume), a translucent neighbor hides only an identical translucent
/// block.
pub fn face_visible(reg: &BlockRegistry, current: Block, neighbor: Block) -> bool {
    let Some(n) = reg.get(neighbor) else {
        return true;
    };
    if n.invisible || n.billboard || n.porous {
        return true;
    }
    if n.translucent {
        return current != neighbor;
    }
    false
}

#[inline]
fn shade(light: f32, face: Face, occluders: u32) -> f32 {
    let dimming = if face == Face::PosY {
        0.0
    } else {
        BLOCK_SIDE_DIMMING
    };
    (light - dimming - occluders as f32 * OCCLUSION_INTENS).max(MIN_LIGHT)
}

#[inline]
fn color(tint: [f32; 3], shade: f32, daylight: f32) -> [u8; 4] {
    let s = shade * daylight;
    [
        (tint[0] * s * 255.0).round().clamp(0.0, 255.0) as u8,
        (tint[1] * s * 255.0).round().clamp(0.0, 255.0) as u8,
        (tint[2] * s * 255.0).round().clamp(0.0, 255.0) as u8,
        255,
    ]
}

/// Counts occluding blocks around one face corner in the plane the face
/// opens into. Classic three-cell corner darkening.
fn corner_occluders(
    reg: &BlockRegistry,
    buf: &ChunkBuf,
    nbs: &NeighborBufs,
    x: i32,
    y: i32,
    z: i32,
    face: Face,
    corner: Vec3,
) -> u32 {
    let (dx, dy, dz) = face.delta();
    let (px, py, pz) = (x + dx, y + dy, z + dz);
    // Signed step toward the corner along the two in-plane axes.
    let su = |c: f32| if c > 0.5 { 1 } else { -1 };
    let (ux, uy, uz, vx, vy, vz) = match face {
        Face::PosY | Face::NegY => (su(corner.x), 0, 0, 0, 0, su(corner.z)),
        Face::PosX | Face::NegX => (0, 0, su(corner.z), 0, su(corner.y), 0),
        Face::PosZ | Face::NegZ => (su(corner.x), 0, 0, 0, su(corner.y), 0),
    };
    let cells = [
        (px + ux, py + uy, pz + uz),
        (px + vx, py + vy, pz + vz),
        (px + ux + vx, py + uy + vy, pz + uz + vz),
    ];
    cells
        .iter()
        .filter(|&&(cx, cy, cz)| reg.occludes(nbs.block(buf, cx, cy, cz)))
        .count() as u32
}

fn face_uvs(def_cell: (f32, f32), face: Face, corners: &[Vec3; 4]) -> [(f32, f32); 4] {
    let (u0, v0) = def_cell;
    let mut uvs = [(0.0, 0.0); 4];
    for (i, c) in corners.iter().enumerate() {
        // Corner components are exactly 0 or 1 on a unit cube.
        let (u, v) = match face {
            Face::PosY | Face::NegY => (c.x, c.z),
            Face::PosX | Face::NegX => (c.z, 1.0 - c.y),
            Face::PosZ | Face::NegZ => (c.x, 1.0 - c.y),
        };
        uvs[i] = (u0 + u * ATLAS_CELL, v0 + v * ATLAS_CELL);
    }
    uvs
}

fn emit_billboard(
    part: &mut MeshBuild,
    def_cell: (f32, f32),
    tint: [f32; 3],
    light: f32,
    daylight: f32,
    wx: f32,
    wy: f32,
    wz: f32,
) {
    let c = color(tint, light.max(MIN_LIGHT), daylight);
    let (u0, v0) = def_cell;
    let uvs = [
        (u0, v0 + ATLAS_CELL),
        (u0 + ATLAS_CELL, v0 + ATLAS_CELL),
        (u0 + ATLAS_CELL, v0),
        (u0, v0),
    ];
    let up = Vec3::new(0.0, 1.0, 0.0);
    // Two quads across the cell diagonals; the renderer draws this pass
    // without backface culling.
    part.add_quad(
        [
            Vec3::new(wx, wy, wz),
            Vec3::new(wx + 1.0, wy, wz + 1.0),
            Vec3::new(wx + 1.0, wy + 1.0, wz + 1.0),
            Vec3::new(wx, wy + 1.0, wz),
        ],
        up,
        uvs,
        [c; 4],
    );
    part.add_quad(
        [
            Vec3::new(wx + 1.0, wy, wz),
            Vec3::new(wx, wy, wz + 1.0),
            Vec3::new(wx, wy + 1.0, wz + 1.0),
            Vec3::new(wx + 1.0, wy + 1.0, wz),
        ],
        up,
        uvs,
        [c; 4],
    );
}

/// Builds the chunk's CPU mesh. Vertex colors fold together the per-face
/// tint, the light at the cell the face opens into, corner occlusion, and
/// the global daylight scalar. Returns None when nothing is visible.
pub fn build_chunk_mesh(
    buf: &ChunkBuf,
    nbs: &NeighborBufs,
    reg: &BlockRegistry,
    daylight: f32,
) -> Option<ChunkMeshCPU> {
    let base_x = buf.coord.cx * buf.sx as i32;
    let base_z = buf.coord.cz * buf.sz as i32;
    let mut parts: HashMap<RenderPass, MeshBuild> = HashMap::new();
    for z in 0..buf.sz {
        for y in 0..buf.sy {
            for x in 0..buf.sx {
                let b = buf.blocks[buf.idx(x, y, z)];
                let Some(def) = reg.get(b) else {
                    continue;
                };
                if def.invisible {
                    continue;
                }
                let (lx, ly, lz) = (x as i32, y as i32, z as i32);
                let wx = (base_x + lx) as f32;
                let wy = ly as f32;
                let wz = (base_z + lz) as f32;
                if def.billboard {
                    let light = buf.light[buf.idx(x, y, z)];
                    emit_billboard(
                        parts.entry(def.pass).or_default(),
                        def.atlas_cell(FaceRole::Side),
                        def.tint(FaceRole::Side),
                        light,
                        daylight,
                        wx,
                        wy,
                        wz,
                    );
                    continue;
                }
                for face in Face::ALL {
                    let (dx, dy, dz) = face.delta();
                    let neighbor = nbs.block(buf, lx + dx, ly + dy, lz + dz);
                    if !face_visible(reg, b, neighbor) {
                        continue;
                    }
                    let role = face.role();
                    let light = nbs.light(buf, lx + dx, ly + dy, lz + dz);
                    let tint = def.tint(role);
                    let rel = face.corners();
                    let mut corners = [Vec3::ZERO; 4];
                    let mut cols = [[0u8; 4]; 4];
                    for i in 0..4 {
                        corners[i] = Vec3::new(wx + rel[i].x, wy + rel[i].y, wz + rel[i].z);
                        let occ = corner_occluders(reg, buf, nbs, lx, ly, lz, face, rel[i]);
                        cols[i] = color(tint, shade(light, face, occ), daylight);
                    }
                    let uvs = face_uvs(def.atlas_cell(role), face, &rel);
                    parts
                        .entry(def.pass)
                        .or_default()
                        .add_quad(corners, face.normal(), uvs, cols);
                }
            }
        }
    }
    parts.retain(|_, m| !m.is_empty());
    if parts.is_empty() {
        log::trace!("chunk {} produced no geometry", buf.coord);
        return None;
    }
    let bbox = Aabb::new(
        Vec3::new(base_x as f32, 0.0, base_z as f32),
        Vec3::new(
            (base_x + buf.sx as i32) as f32,
            buf.sy as f32,
            (base_z + buf.sz as i32) as f32,
        ),
    );
    Some(ChunkMeshCPU {
        coord: buf.coord,
        bbox,
        parts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_chunk::ChunkCoord;
    use strata_lighting::{NeighborBorders, cast_sunlight, flood_fill};

    fn reg() -> BlockRegistry {
        BlockRegistry::default_catalog()
    }

    fn lit_buf(sx: usize, sy: usize, sz: usize) -> ChunkBuf {
        ChunkBuf::with_dims(ChunkCoord::new(0, 0), sx, sy, sz)
    }

    fn relight(buf: &mut ChunkBuf, reg: &BlockRegistry) {
        cast_sunlight(buf, reg);
        flood_fill(buf, reg, &NeighborBorders::default());
    }

    #[test]
    fn lone_cube_has_six_faces() {
        let r = reg();
        let mut c = lit_buf(4, 8, 4);
        c.set_block(1, 1, 1, r.id_by_name("stone").unwrap());
        relight(&mut c, &r);
        let m = build_chunk_mesh(&c, &NeighborBufs::default(), &r, 1.0).unwrap();
        assert_eq!(m.parts[&RenderPass::Opaque].quad_count(), 6);
    }

    #[test]
    fn touching_cubes_drop_shared_faces() {
        let r = reg();
        let stone = r.id_by_name("stone").unwrap();
        let mut c = lit_buf(4, 8, 4);
        c.set_block(1, 1, 1, stone);
        c.set_block(2, 1, 1, stone);
        relight(&mut c, &r);
        let m = build_chunk_mesh(&c, &NeighborBufs::default(), &r, 1.0).unwrap();
        // 12 faces minus the two on the shared plane.
        assert_eq!(m.parts[&RenderPass::Opaque].quad_count(), 10);
    }

    #[test]
    fn empty_chunk_builds_nothing() {
        let r = reg();
        let c = lit_buf(4, 8, 4);
        assert!(build_chunk_mesh(&c, &NeighborBufs::default(), &r, 1.0).is_none());
    }

    #[test]
    fn water_faces_only_against_non_water() {
        let r = reg();
        let water = r.id_by_name("water").unwrap();
        let mut c = lit_buf(4, 8, 4);
        c.set_block(1, 1, 1, water);
        c.set_block(2, 1, 1, water);
        relight(&mut c, &r);
        let m = build_chunk_mesh(&c, &NeighborBufs::default(), &r, 1.0).unwrap();
        // Two water cells, 12 faces, minus the two water-water faces.
        assert_eq!(m.parts[&RenderPass::Water].quad_count(), 10);
        assert!(!m.parts.contains_key(&RenderPass::Opaque));
    }

    #[test]
    fn leaves_keep_faces_between_each_other() {
        let r = reg();
        let leaf = r.id_by_name("leaf").unwrap();
        let mut c = lit_buf(4, 8, 4);
        c.set_block(1, 1, 1, leaf);
        c.set_block(2, 1, 1, leaf);
        relight(&mut c, &r);
        let m = build_chunk_mesh(&c, &NeighborBufs::default(), &r, 1.0).unwrap();
        assert_eq!(m.parts[&RenderPass::Translucent].quad_count(), 12);
    }

    #[test]
    fn billboards_emit_crossed_quads() {
        let r = reg();
        let mut c = lit_buf(4, 8, 4);
        c.set_block(1, 1, 1, r.id_by_name("tall_grass").unwrap());
        relight(&mut c, &r);
        let m = build_chunk_mesh(&c, &NeighborBufs::default(), &r, 1.0).unwrap();
        assert_eq!(m.parts[&RenderPass::Billboard].quad_count(), 2);
    }

    #[test]
    fn neighbor_chunk_occludes_seam_face() {
        let r = reg();
        let stone = r.id_by_name("stone").unwrap();
        let mut c = lit_buf(4, 8, 4);
        c.set_block(0, 1, 1, stone);
        relight(&mut c, &r);
        let mut left = ChunkBuf::with_dims(ChunkCoord::new(-1, 0), 4, 8, 4);
        left.set_block(3, 1, 1, stone);
        relight(&mut left, &r);
        let without = build_chunk_mesh(&c, &NeighborBufs::default(), &r, 1.0).unwrap();
        let nbs = NeighborBufs {
            xn: Some(&left),
            ..Default::default()
        };
        let with = build_chunk_mesh(&c, &nbs, &r, 1.0).unwrap();
        assert_eq!(without.parts[&RenderPass::Opaque].quad_count(), 6);
        assert_eq!(with.parts[&RenderPass::Opaque].quad_count(), 5);
    }

    #[test]
    fn daylight_scales_vertex_colors() {
        let r = reg();
        let mut c = lit_buf(4, 8, 4);
        c.set_block(1, 1, 1, r.id_by_name("stone").unwrap());
        relight(&mut c, &r);
        let day = build_chunk_mesh(&c, &NeighborBufs::default(), &r, 1.0).unwrap();
        let dusk = build_chunk_mesh(&c, &NeighborBufs::default(), &r, 0.4).unwrap();
        let sum = |m: &ChunkMeshCPU| -> u64 {
            m.parts[&RenderPass::Opaque]
                .col
                .iter()
                .map(|&v| v as u64)
                .sum()
        };
        assert!(sum(&dusk) < sum(&day));
    }

    #[test]
    fn face_rule_is_symmetric_for_opaque_pairs() {
        let r = reg();
        let stone = r.id_by_name("stone").unwrap();
        let dirt = r.id_by_name("dirt").unwrap();
        assert!(!face_visible(&r, stone, dirt));
        assert!(!face_visible(&r, dirt, stone));
    }
}
