use strata_chunk::ChunkCoord;

/// Square window of loaded chunks around a center, addressed through a
/// toroidal slot grid. A chunk always maps to the same slot while it is
/// inside the window, so moving the center only touches the rim: the
/// slots whose desired occupant changed.
pub struct StreamingWindow {
    n: i32,
    center: ChunkCoord,
    slots: Vec<Option<ChunkCoord>>,
}

/// Chunks that entered and left the window on a retarget.
#[derive(Default)]
pub struct Retarget {
    pub enters: Vec<ChunkCoord>,
    pub exits: Vec<ChunkCoord>,
}

impl StreamingWindow {
    pub fn new(view_dist: usize) -> Self {
        let n = (2 * view_dist + 1) as i32;
        Self {
            n,
            center: ChunkCoord::new(0, 0),
            slots: vec![None; (n * n) as usize],
        }
    }

    pub fn center(&self) -> ChunkCoord {
        self.center
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn wrap(&self, c: i32) -> i32 {
        ((c % self.n) + self.n) % self.n
    }

    #[inline]
    fn slot_index(&self, coord: ChunkCoord) -> usize {
        (self.wrap(coord.cx) * self.n + self.wrap(coord.cz)) as usize
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.slots[self.slot_index(coord)] == Some(coord)
    }

    /// Moves the window. Every desired coordinate claims its slot; a
    /// displaced occupant is reported as an exit exactly once.
    pub fn retarget(&mut self, center: ChunkCoord) -> Retarget {
        self.center = center;
        let r = (self.n - 1) / 2;
        let mut out = Retarget::default();
        for dz in -r..=r {
            for dx in -r..=r {
                let want = center.offset(dx, dz);
                let idx = self.slot_index(want);
                match self.slots[idx] {
                    Some(have) if have == want => {}
                    Some(have) => {
                        out.exits.push(have);
                        self.slots[idx] = Some(want);
                        out.enters.push(want);
                    }
                    None => {
                        self.slots[idx] = Some(want);
                        out.enters.push(want);
                    }
                }
            }
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.slots.iter().filter_map(|s| *s)
    }
}
