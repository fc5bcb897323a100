//! Chunk storage: block grid, light grid, and the on-disk chunk format.
#![forbid(unsafe_code)]

mod coord;
mod disk;

pub use coord::ChunkCoord;

use strata_blocks::{Block, BlockRegistry};

pub const CHUNK_SIZE_X: usize = 16;
pub const CHUNK_SIZE_Y: usize = 128;
pub const CHUNK_SIZE_Z: usize = 16;

/// Upper bound on per-cell light; light values live in [0, MAX_LIGHT].
pub const MAX_LIGHT: f32 = 1.0;

/// One chunk's worth of blocks plus the per-cell light grid.
///
/// `dirty` means the mesh is stale, `light_dirty` means light must be
/// recomputed first, `fresh` distinguishes a never-meshed chunk from one
/// invalidated by an edit.
#[derive(Clone, Debug)]
pub struct ChunkBuf {
    pub coord: ChunkCoord,
    pub sx: usize,
    pub sy: usize,
    pub sz: usize,
    pub blocks: Vec<Block>,
    pub light: Vec<f32>,
    pub dirty: bool,
    pub fresh: bool,
    pub light_dirty: bool,
}

impl ChunkBuf {
    pub fn new(coord: ChunkCoord) -> Self {
        Self::with_dims(coord, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z)
    }

    pub fn with_dims(coord: ChunkCoord, sx: usize, sy: usize, sz: usize) -> Self {
        let n = sx * sy * sz;
        Self {
            coord,
            sx,
            sy,
            sz,
            blocks: vec![Block::AIR; n],
            light: vec![0.0; n],
            dirty: true,
            fresh: true,
            light_dirty: true,
        }
    }

    pub fn from_blocks(
        coord: ChunkCoord,
        sx: usize,
        sy: usize,
        sz: usize,
        blocks: Vec<Block>,
    ) -> Self {
        let mut b = blocks;
        b.resize(sx * sy * sz, Block::AIR);
        let n = b.len();
        Self {
            coord,
            sx,
            sy,
            sz,
            blocks: b,
            light: vec![0.0; n],
            dirty: true,
            fresh: true,
            light_dirty: true,
        }
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (y * self.sz + z) * self.sx + x
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as usize) < self.sx
            && (y as usize) < self.sy
            && (z as usize) < self.sz
    }

    #[inline]
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Option<Block> {
        if !self.in_bounds(x, y, z) {
            return None;
        }
        Some(self.blocks[self.idx(x as usize, y as usize, z as usize)])
    }

    /// Writes a block, marking the chunk dirty. Returns false when the
    /// position is out of bounds.
    #[inline]
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, b: Block) -> bool {
        if !self.in_bounds(x, y, z) {
            return false;
        }
        let i = self.idx(x as usize, y as usize, z as usize);
        if self.blocks[i] != b {
            self.blocks[i] = b;
            self.dirty = true;
            self.light_dirty = true;
        }
        true
    }

    #[inline]
    pub fn get_light(&self, x: i32, y: i32, z: i32) -> Option<f32> {
        if !self.in_bounds(x, y, z) {
            return None;
        }
        Some(self.light[self.idx(x as usize, y as usize, z as usize)])
    }

    #[inline]
    pub fn set_light(&mut self, x: i32, y: i32, z: i32, v: f32) -> bool {
        if !self.in_bounds(x, y, z) {
            return false;
        }
        let i = self.idx(x as usize, y as usize, z as usize);
        self.light[i] = v.clamp(0.0, MAX_LIGHT);
        true
    }

    /// True when no light-blocking block sits above (x, y, z).
    pub fn can_see_sky(&self, reg: &BlockRegistry, x: i32, y: i32, z: i32) -> bool {
        if !self.in_bounds(x, y, z) {
            return false;
        }
        for yy in (y + 1)..self.sy as i32 {
            let b = self.blocks[self.idx(x as usize, yy as usize, z as usize)];
            if reg.blocks_light(b) {
                return false;
            }
        }
        true
    }

    /// Highest y with a solid block in the column, or None for empty air.
    pub fn top_solid_y(&self, reg: &BlockRegistry, x: i32, z: i32) -> Option<i32> {
        if x < 0 || z < 0 || x as usize >= self.sx || z as usize >= self.sz {
            return None;
        }
        for y in (0..self.sy).rev() {
            let b = self.blocks[self.idx(x as usize, y, z as usize)];
            if reg.get(b).is_some_and(|d| d.solid) {
                return Some(y as i32);
            }
        }
        None
    }

    #[inline]
    pub fn has_non_air(&self) -> bool {
        self.blocks.iter().any(|b| !b.is_air())
    }
}
