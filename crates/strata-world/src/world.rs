use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use strata_blocks::{Block, BlockRegistry};
use strata_chunk::{ChunkBuf, ChunkCoord};
use strata_noise::seed_hash;

use crate::cache::ChunkCache;
use crate::r#gen::{self, BlockIds, GenCtx};
use crate::worldgen::WorldGenParams;

/// The world facade. Generation is pure per chunk; loaded chunks live in
/// the cache behind a mutex so build workers and the game thread can
/// share one instance. External collaborators drive edits through
/// `set_block`/`get_block`.
pub struct World {
    pub seed: String,
    seed_hash: i32,
    pub sx: usize,
    pub sy: usize,
    pub sz: usize,
    reg: Arc<BlockRegistry>,
    params: RwLock<WorldGenParams>,
    ctx: GenCtx,
    ids: BlockIds,
    cache: Mutex<ChunkCache>,
}

impl World {
    pub fn new(
        seed: &str,
        reg: Arc<BlockRegistry>,
        params: WorldGenParams,
        view_dist: usize,
        save_dir: Option<PathBuf>,
    ) -> Result<Self, String> {
        let hash = seed_hash(seed);
        let ids = BlockIds::resolve(&reg)?;
        Ok(Self {
            seed: seed.to_string(),
            seed_hash: hash,
            sx: strata_chunk::CHUNK_SIZE_X,
            sy: strata_chunk::CHUNK_SIZE_Y,
            sz: strata_chunk::CHUNK_SIZE_Z,
            reg,
            params: RwLock::new(params),
            ctx: GenCtx::new(hash),
            ids,
            cache: Mutex::new(ChunkCache::new(view_dist, save_dir)),
        })
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.reg
    }

    #[inline]
    pub fn chunk_coord_at(&self, wx: i32, wz: i32) -> ChunkCoord {
        ChunkCoord::new(
            wx.div_euclid(self.sx as i32),
            wz.div_euclid(self.sz as i32),
        )
    }

    /// Pure generation from seed and current params; does not touch the
    /// cache.
    pub fn generate_chunk(&self, coord: ChunkCoord) -> ChunkBuf {
        let params = self.params();
        r#gen::generate_chunk(
            &self.ctx,
            &self.ids,
            &params,
            self.seed_hash,
            coord,
            self.sx,
            self.sy,
            self.sz,
        )
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, ChunkCache> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Loads the chunk (cache, then disk, then generation) and returns an
    /// owned copy for background work.
    pub fn snapshot_chunk(&self, coord: ChunkCoord) -> ChunkBuf {
        if let Some(b) = self.lock_cache().get(coord) {
            return b.clone();
        }
        // Generate outside the lock so workers do not serialize on it.
        let from_disk = self.lock_cache().load_from_disk(coord);
        let fresh = from_disk.unwrap_or_else(|| self.generate_chunk(coord));
        let mut cache = self.lock_cache();
        if let Some(b) = cache.get(coord) {
            return b.clone();
        }
        cache.insert(fresh.clone());
        fresh
    }

    /// Copy of a chunk only if it is resident; never triggers generation.
    pub fn snapshot_loaded(&self, coord: ChunkCoord) -> Option<ChunkBuf> {
        self.lock_cache().get(coord).cloned()
    }

    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.lock_cache().contains(coord)
    }

    /// Installs a worker-built chunk. Skipped when the resident chunk has
    /// been edited since the build was scheduled (it is dirty again and a
    /// newer build is coming).
    pub fn store_chunk(&self, buf: ChunkBuf) {
        let mut cache = self.lock_cache();
        if let Some(existing) = cache.get(buf.coord) {
            if existing.dirty && !existing.fresh {
                return;
            }
        }
        cache.insert(buf);
    }

    pub fn get_block(&self, wx: i32, wy: i32, wz: i32) -> Option<Block> {
        if wy < 0 || wy >= self.sy as i32 {
            return None;
        }
        let coord = self.chunk_coord_at(wx, wz);
        let lx = wx - coord.cx * self.sx as i32;
        let lz = wz - coord.cz * self.sz as i32;
        if let Some(b) = self.lock_cache().get(coord) {
            return b.get_block(lx, wy, lz);
        }
        let snap = self.snapshot_chunk(coord);
        snap.get_block(lx, wy, lz)
    }

    /// Writes a block through to the owning chunk, loading it if needed.
    /// The chunk is marked dirty; resident lateral neighbors touching the
    /// edited seam are marked dirty too so their meshes get rebuilt.
    pub fn set_block(&self, wx: i32, wy: i32, wz: i32, b: Block) -> bool {
        if wy < 0 || wy >= self.sy as i32 {
            return false;
        }
        let coord = self.chunk_coord_at(wx, wz);
        let lx = wx - coord.cx * self.sx as i32;
        let lz = wz - coord.cz * self.sz as i32;
        if !self.is_loaded(coord) {
            let snap = self.snapshot_chunk(coord);
            drop(snap);
        }
        let mut cache = self.lock_cache();
        let Some(chunk) = cache.get_mut(coord) else {
            return false;
        };
        if !chunk.set_block(lx, wy, lz, b) {
            return false;
        }
        chunk.fresh = false;
        let sx = self.sx as i32;
        let sz = self.sz as i32;
        let mut neighbors = Vec::new();
        if lx == 0 {
            neighbors.push(coord.offset(-1, 0));
        }
        if lx == sx - 1 {
            neighbors.push(coord.offset(1, 0));
        }
        if lz == 0 {
            neighbors.push(coord.offset(0, -1));
        }
        if lz == sz - 1 {
            neighbors.push(coord.offset(0, 1));
        }
        for n in neighbors {
            if let Some(nb) = cache.get_mut(n) {
                nb.dirty = true;
                nb.light_dirty = true;
            }
        }
        true
    }

    /// Drops all resident chunks so the next load regenerates them.
    pub fn clear_loaded(&self) {
        self.lock_cache().clear();
    }

    pub fn set_focus(&self, coord: ChunkCoord) {
        self.lock_cache().set_focus(coord);
    }

    pub fn loaded_count(&self) -> usize {
        self.lock_cache().len()
    }

    pub fn params(&self) -> WorldGenParams {
        self.params
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Swaps in new generation parameters. Already-loaded chunks keep
    /// their shape; only future generation sees the change.
    pub fn update_params(&self, p: WorldGenParams) {
        *self.params.write().unwrap_or_else(|e| e.into_inner()) = p;
        log::info!("worldgen parameters updated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(
            "test-seed",
            Arc::new(BlockRegistry::default_catalog()),
            WorldGenParams::default(),
            4,
            None,
        )
        .unwrap()
    }

    #[test]
    fn generation_is_deterministic() {
        let w1 = world();
        let w2 = world();
        let c = ChunkCoord::new(3, -2);
        assert_eq!(w1.generate_chunk(c).blocks, w2.generate_chunk(c).blocks);
    }

    #[test]
    fn different_seeds_differ() {
        let reg = Arc::new(BlockRegistry::default_catalog());
        let w1 = World::new("alpha", reg.clone(), WorldGenParams::default(), 4, None).unwrap();
        let w2 = World::new("omega", reg, WorldGenParams::default(), 4, None).unwrap();
        let c = ChunkCoord::new(0, 0);
        assert_ne!(w1.generate_chunk(c).blocks, w2.generate_chunk(c).blocks);
    }

    #[test]
    fn bedrock_floors_every_column() {
        let w = world();
        let buf = w.generate_chunk(ChunkCoord::new(1, 1));
        let bedrock = w.registry().id_by_name("bedrock").unwrap();
        for z in 0..buf.sz as i32 {
            for x in 0..buf.sx as i32 {
                assert_eq!(buf.get_block(x, 0, z), Some(bedrock));
            }
        }
    }

    #[test]
    fn no_water_above_sea_level() {
        let w = world();
        let water = w.registry().id_by_name("water").unwrap();
        let sea = w.params().levels.sea;
        for cc in [ChunkCoord::new(0, 0), ChunkCoord::new(-3, 5)] {
            let buf = w.generate_chunk(cc);
            for z in 0..buf.sz as i32 {
                for x in 0..buf.sx as i32 {
                    for y in (sea + 1)..buf.sy as i32 {
                        assert_ne!(buf.get_block(x, y, z), Some(water));
                    }
                }
            }
        }
    }

    #[test]
    fn get_set_block_roundtrip_across_chunks() {
        let w = world();
        let stone = w.registry().id_by_name("stone").unwrap();
        assert!(w.set_block(100, 64, -40, stone));
        assert_eq!(w.get_block(100, 64, -40), Some(stone));
        assert_eq!(w.get_block(100, -1, -40), None);
        assert!(!w.set_block(100, 999, -40, stone));
    }

    #[test]
    fn seam_edit_dirties_resident_neighbor() {
        let w = world();
        let a = ChunkCoord::new(0, 0);
        let b = ChunkCoord::new(1, 0);
        // Make both resident and pretend they were meshed.
        let _ = w.snapshot_chunk(a);
        let _ = w.snapshot_chunk(b);
        {
            let mut cache = w.lock_cache();
            for c in [a, b] {
                let ch = cache.get_mut(c).unwrap();
                ch.dirty = false;
                ch.fresh = false;
            }
        }
        let stone = w.registry().id_by_name("stone").unwrap();
        assert!(w.set_block(15, 60, 4, stone));
        let cache = w.lock_cache();
        assert!(cache.get(a).unwrap().dirty);
        assert!(cache.get(b).unwrap().dirty);
    }

    #[test]
    fn snapshot_then_store_roundtrip() {
        let w = world();
        let c = ChunkCoord::new(2, 2);
        let mut snap = w.snapshot_chunk(c);
        snap.dirty = false;
        snap.fresh = false;
        w.store_chunk(snap);
        assert!(w.is_loaded(c));
        assert!(!w.snapshot_loaded(c).unwrap().dirty);
    }
}
