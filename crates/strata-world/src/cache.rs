use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use std::collections::HashMap;

use strata_chunk::{ChunkBuf, ChunkCoord};

/// Bounded in-memory chunk set. When full, the chunk farthest from the
/// focus coordinate is evicted; dirty chunks are spilled to disk first so
/// edits survive the round trip.
pub struct ChunkCache {
    capacity: usize,
    focus: ChunkCoord,
    chunks: HashMap<ChunkCoord, ChunkBuf>,
    save_dir: Option<PathBuf>,
}

impl ChunkCache {
    pub fn new(view_dist: usize, save_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = &save_dir {
            if let Err(e) = std::fs::create_dir_all(dir) {
                log::warn!("cannot create save dir {}: {}", dir.display(), e);
            }
        }
        Self {
            capacity: view_dist * view_dist + 256,
            focus: ChunkCoord::new(0, 0),
            chunks: HashMap::new(),
            save_dir,
        }
    }

    pub fn set_focus(&mut self, focus: ChunkCoord) {
        self.focus = focus;
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<&ChunkBuf> {
        self.chunks.get(&coord)
    }

    pub fn get_mut(&mut self, coord: ChunkCoord) -> Option<&mut ChunkBuf> {
        self.chunks.get_mut(&coord)
    }

    pub fn insert(&mut self, buf: ChunkBuf) {
        self.chunks.insert(buf.coord, buf);
        self.evict_overflow();
    }

    pub fn remove(&mut self, coord: ChunkCoord) -> Option<ChunkBuf> {
        self.chunks.remove(&coord)
    }

    /// Drops every resident chunk, spilling dirty ones first. Used when
    /// generation parameters change and loaded terrain goes stale.
    pub fn clear(&mut self) {
        for buf in self.chunks.values() {
            if buf.dirty {
                self.spill(buf);
            }
        }
        self.chunks.clear();
    }

    /// Pulls a previously spilled chunk back from disk.
    pub fn load_from_disk(&self, coord: ChunkCoord) -> Option<ChunkBuf> {
        let path = self.chunk_path(coord)?;
        let file = File::open(&path).ok()?;
        match ChunkBuf::read_from(&mut BufReader::new(file)) {
            Ok(buf) if buf.coord == coord => Some(buf),
            Ok(buf) => {
                log::warn!(
                    "chunk file {} holds {} instead of {}",
                    path.display(),
                    buf.coord,
                    coord
                );
                None
            }
            Err(e) => {
                log::warn!("failed to read chunk file {}: {}", path.display(), e);
                None
            }
        }
    }

    fn chunk_path(&self, coord: ChunkCoord) -> Option<PathBuf> {
        self.save_dir
            .as_ref()
            .map(|d| d.join(format!("{}.cnk", coord.key())))
    }

    fn spill(&self, buf: &ChunkBuf) {
        let Some(path) = self.chunk_path(buf.coord) else {
            return;
        };
        match File::create(&path) {
            Ok(file) => {
                let mut w = BufWriter::new(file);
                if let Err(e) = buf.write_to(&mut w) {
                    log::warn!("failed to write chunk file {}: {}", path.display(), e);
                }
            }
            Err(e) => log::warn!("failed to create chunk file {}: {}", path.display(), e),
        }
    }

    fn evict_overflow(&mut self) {
        while self.chunks.len() > self.capacity {
            let Some(victim) = self
                .chunks
                .keys()
                .max_by_key(|c| c.dist2_to(self.focus))
                .copied()
            else {
                break;
            };
            if let Some(buf) = self.chunks.remove(&victim) {
                if buf.dirty {
                    self.spill(&buf);
                }
                log::debug!("evicted chunk {}", victim);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_blocks::Block;

    fn buf_at(cx: i32, cz: i32) -> ChunkBuf {
        ChunkBuf::with_dims(ChunkCoord::new(cx, cz), 4, 8, 4)
    }

    #[test]
    fn evicts_most_distant_first() {
        // view_dist 0 -> capacity 256; shrink by hand for the test.
        let mut cache = ChunkCache::new(0, None);
        cache.capacity = 2;
        cache.set_focus(ChunkCoord::new(0, 0));
        cache.insert(buf_at(0, 0));
        cache.insert(buf_at(1, 0));
        cache.insert(buf_at(50, 50));
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(ChunkCoord::new(50, 50)));
        assert!(cache.contains(ChunkCoord::new(0, 0)));
    }

    #[test]
    fn dirty_chunks_spill_and_reload() {
        let dir = std::env::temp_dir().join(format!("strata-cache-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let mut cache = ChunkCache::new(0, Some(dir.clone()));
        cache.capacity = 1;
        cache.set_focus(ChunkCoord::new(0, 0));
        let mut far = buf_at(9, 9);
        far.set_block(1, 1, 1, Block(3));
        let coord = far.coord;
        cache.insert(far);
        cache.insert(buf_at(0, 0)); // pushes (9,9) out
        assert!(!cache.contains(coord));
        let back = cache.load_from_disk(coord).expect("spilled chunk on disk");
        assert_eq!(back.get_block(1, 1, 1), Some(Block(3)));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_disk_entry_is_none() {
        let cache = ChunkCache::new(0, None);
        assert!(cache.load_from_disk(ChunkCoord::new(7, 7)).is_none());
    }
}
