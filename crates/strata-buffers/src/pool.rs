use std::collections::HashSet;

/// Opaque id for a GPU buffer object owned by the renderer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Pool of buffer ids. A block of ids is minted up front (mirroring a
/// single bulk glGenBuffers at startup); exhaustion mints one fresh id at
/// a time. Released ids go back on the free stack.
pub struct BufferPool {
    free: Vec<u32>,
    live: HashSet<u32>,
    next_id: u32,
}

impl BufferPool {
    pub fn new(capacity: usize) -> Self {
        // Ids start at 1; 0 reads as "no buffer" in GL conventions.
        let free: Vec<u32> = (1..=capacity as u32).rev().collect();
        Self {
            free,
            live: HashSet::new(),
            next_id: capacity as u32 + 1,
        }
    }

    pub fn acquire(&mut self) -> BufferHandle {
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                let id = self.next_id;
                self.next_id += 1;
                log::debug!("buffer pool exhausted, minted id {}", id);
                id
            }
        };
        self.live.insert(id);
        BufferHandle(id)
    }

    /// Returns a handle to the pool. Ignores handles the pool does not
    /// consider live, so a double release cannot corrupt the free stack.
    pub fn release(&mut self, h: BufferHandle) {
        if self.live.remove(&h.0) {
            self.free.push(h.0);
        } else {
            log::warn!("release of unknown buffer handle {}", h.0);
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn no_id_issued_twice_while_live() {
        let mut pool = BufferPool::new(8);
        let mut seen = HashSet::new();
        for _ in 0..32 {
            let h = pool.acquire();
            assert!(seen.insert(h), "id {} issued twice", h.0);
        }
        assert_eq!(pool.live_count(), 32);
    }

    #[test]
    fn released_ids_are_reissued() {
        let mut pool = BufferPool::new(2);
        let a = pool.acquire();
        let b = pool.acquire();
        pool.release(a);
        pool.release(b);
        let c = pool.acquire();
        let d = pool.acquire();
        assert!(c == a || c == b);
        assert!(d == a || d == b);
        assert_ne!(c, d);
    }

    #[test]
    fn double_release_is_harmless() {
        let mut pool = BufferPool::new(2);
        let a = pool.acquire();
        pool.release(a);
        pool.release(a);
        assert_eq!(pool.free_count(), 2);
        let b = pool.acquire();
        let c = pool.acquire();
        assert_ne!(b, c);
    }

    #[test]
    fn exhaustion_mints_fresh_ids() {
        let mut pool = BufferPool::new(1);
        let a = pool.acquire();
        let b = pool.acquire();
        assert_ne!(a, b);
        assert!(b.0 > 1);
    }

    proptest! {
        // Any interleaving of acquires and releases keeps live and free
        // disjoint and never hands out an id that is already live.
        #[test]
        fn acquire_release_interleavings_stay_consistent(ops in prop::collection::vec(any::<bool>(), 1..100)) {
            let mut pool = BufferPool::new(4);
            let mut held: Vec<BufferHandle> = Vec::new();
            for acquire in ops {
                if acquire || held.is_empty() {
                    let h = pool.acquire();
                    prop_assert!(!held.contains(&h), "live id {} reissued", h.0);
                    held.push(h);
                } else {
                    let h = held.swap_remove(held.len() / 2);
                    pool.release(h);
                }
                prop_assert_eq!(pool.live_count(), held.len());
            }
        }
    }
}
