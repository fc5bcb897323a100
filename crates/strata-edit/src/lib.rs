//! Persistent block edits layered over generation, with revision stamps
//! that drive chunk rebuilds.
#![forbid(unsafe_code)]

use std::collections::HashMap;

use strata_blocks::Block;
use strata_chunk::ChunkCoord;

#[derive(Default, Debug, Clone, Copy)]
pub struct EditStoreStats {
    pub chunk_entries: usize,
    pub block_edits: usize,
    pub rev_entries: usize,
    pub built_entries: usize,
}

/// World edits bucketed by owning chunk, plus per-chunk revision stamps.
/// A chunk whose `rev` is ahead of its `built_rev` needs a rebuild; worker
/// results carrying an older rev are stale and get dropped.
pub struct EditStore {
    sx: i32,
    sz: i32,
    inner: HashMap<ChunkCoord, HashMap<(i32, i32, i32), Block>>,
    rev: HashMap<ChunkCoord, u64>,
    built: HashMap<ChunkCoord, u64>,
    counter: u64,
}

impl EditStore {
    pub fn new(sx: usize, sz: usize) -> Self {
        Self {
            sx: sx as i32,
            sz: sz as i32,
            inner: HashMap::new(),
            rev: HashMap::new(),
            built: HashMap::new(),
            counter: 0,
        }
    }

    #[inline]
    fn owner(&self, wx: i32, wz: i32) -> ChunkCoord {
        ChunkCoord::new(wx.div_euclid(self.sx), wz.div_euclid(self.sz))
    }

    pub fn get(&self, wx: i32, wy: i32, wz: i32) -> Option<Block> {
        self.inner
            .get(&self.owner(wx, wz))
            .and_then(|m| m.get(&(wx, wy, wz)).copied())
    }

    pub fn set(&mut self, wx: i32, wy: i32, wz: i32, b: Block) {
        let k = self.owner(wx, wz);
        self.inner.entry(k).or_default().insert((wx, wy, wz), b);
    }

    /// All edits belonging to one chunk.
    pub fn snapshot_for_chunk(&self, coord: ChunkCoord) -> Vec<((i32, i32, i32), Block)> {
        self.inner
            .get(&coord)
            .map(|m| m.iter().map(|(k, v)| (*k, *v)).collect())
            .unwrap_or_default()
    }

    /// Stamps the edited chunk, and any lateral neighbor whose seam the
    /// edit touches, with a fresh revision. Returns the stamp.
    pub fn bump_region_around(&mut self, wx: i32, wy: i32, wz: i32) -> u64 {
        let _ = wy;
        self.counter = self.counter.wrapping_add(1).max(1);
        let stamp = self.counter;
        for coord in self.affected_chunks(wx, wz) {
            self.rev.insert(coord, stamp);
        }
        stamp
    }

    /// The edited chunk plus lateral neighbors sharing the touched seam.
    pub fn affected_chunks(&self, wx: i32, wz: i32) -> Vec<ChunkCoord> {
        let c = self.owner(wx, wz);
        let lx = wx - c.cx * self.sx;
        let lz = wz - c.cz * self.sz;
        let mut offsets_x = vec![0];
        let mut offsets_z = vec![0];
        if lx == 0 {
            offsets_x.push(-1);
        }
        if lx == self.sx - 1 {
            offsets_x.push(1);
        }
        if lz == 0 {
            offsets_z.push(-1);
        }
        if lz == self.sz - 1 {
            offsets_z.push(1);
        }
        let mut out = Vec::new();
        for dx in &offsets_x {
            for dz in &offsets_z {
                let k = c.offset(*dx, *dz);
                if !out.contains(&k) {
                    out.push(k);
                }
            }
        }
        out
    }

    pub fn get_rev(&self, coord: ChunkCoord) -> u64 {
        self.rev.get(&coord).copied().unwrap_or(0)
    }

    pub fn get_built_rev(&self, coord: ChunkCoord) -> u64 {
        self.built.get(&coord).copied().unwrap_or(0)
    }

    pub fn mark_built(&mut self, coord: ChunkCoord, rev: u64) {
        let e = self.built.entry(coord).or_insert(0);
        if rev > *e {
            *e = rev;
        }
    }

    pub fn needs_rebuild(&self, coord: ChunkCoord) -> bool {
        self.get_rev(coord) > self.get_built_rev(coord)
    }

    /// Drops the revision stamps for a chunk leaving the active window.
    /// The block edits themselves stay: they are the durable record and
    /// get replayed when the chunk is rebuilt. Without this the stamp
    /// maps grow with every chunk ever touched.
    pub fn forget_revs(&mut self, coord: ChunkCoord) {
        self.rev.remove(&coord);
        self.built.remove(&coord);
    }

    pub fn stats(&self) -> EditStoreStats {
        EditStoreStats {
            chunk_entries: self.inner.len(),
            block_edits: self.inner.values().map(|m| m.len()).sum(),
            rev_entries: self.rev.len(),
            built_entries: self.built.len(),
        }
    }
}
