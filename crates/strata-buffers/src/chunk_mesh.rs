use strata_blocks::RenderPass;
use strata_mesh::{ChunkMeshCPU, MeshBuild};

use crate::pool::{BufferHandle, BufferPool};

/// One render-pass bucket of a retained chunk mesh. CPU arrays are
/// present until finalize, the handle after.
pub struct MeshPart {
    pub pass: RenderPass,
    pub handle: Option<BufferHandle>,
    pub vertex_count: usize,
    pub index_count: usize,
    cpu: Option<MeshBuild>,
}

impl MeshPart {
    pub fn cpu(&self) -> Option<&MeshBuild> {
        self.cpu.as_ref()
    }
}

/// Retained per-chunk mesh. `finalize` runs exactly once: it acquires a
/// buffer handle per bucket, hands the CPU arrays to the upload callback,
/// then frees them. Calling it again is a no-op, so a chunk queued twice
/// in one frame cannot upload twice or leak handles.
pub struct ChunkMesh {
    pub coord: strata_chunk::ChunkCoord,
    pub bbox: strata_geom::Aabb,
    parts: Vec<MeshPart>,
    generated: bool,
}

impl ChunkMesh {
    pub fn new(cpu: ChunkMeshCPU) -> Self {
        let parts = cpu
            .parts
            .into_iter()
            .map(|(pass, build)| MeshPart {
                pass,
                handle: None,
                vertex_count: build.vertex_count(),
                index_count: build.idx.len(),
                cpu: Some(build),
            })
            .collect();
        Self {
            coord: cpu.coord,
            bbox: cpu.bbox,
            parts,
            generated: false,
        }
    }

    pub fn generated(&self) -> bool {
        self.generated
    }

    pub fn parts(&self) -> &[MeshPart] {
        &self.parts
    }

    /// First call: acquire handles, upload via `f`, drop CPU arrays.
    /// Later calls do nothing.
    pub fn finalize_with<F>(&mut self, pool: &mut BufferPool, mut f: F)
    where
        F: FnMut(BufferHandle, &MeshBuild),
    {
        if self.generated {
            log::debug!("chunk {} mesh already finalized", self.coord);
            return;
        }
        for part in &mut self.parts {
            let handle = pool.acquire();
            if let Some(build) = part.cpu.take() {
                f(handle, &build);
            }
            part.handle = Some(handle);
        }
        self.generated = true;
    }

    pub fn finalize(&mut self, pool: &mut BufferPool) {
        self.finalize_with(pool, |_, _| {});
    }

    /// Returns every acquired handle to the pool.
    pub fn dispose(&mut self, pool: &mut BufferPool) {
        for part in &mut self.parts {
            if let Some(h) = part.handle.take() {
                pool.release(h);
            }
            part.cpu = None;
        }
        self.parts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use strata_chunk::ChunkCoord;
    use strata_geom::{Aabb, Vec3};

    fn cpu_mesh(buckets: usize) -> ChunkMeshCPU {
        let passes = [RenderPass::Opaque, RenderPass::Water, RenderPass::Billboard];
        let mut parts = HashMap::new();
        for pass in passes.iter().take(buckets) {
            let mut m = MeshBuild::default();
            m.add_quad(
                [
                    Vec3::new(0.0, 0.0, 0.0),
                    Vec3::new(1.0, 0.0, 0.0),
                    Vec3::new(1.0, 1.0, 0.0),
                    Vec3::new(0.0, 1.0, 0.0),
                ],
                Vec3::new(0.0, 0.0, -1.0),
                [(0.0, 0.0); 4],
                [[255; 4]; 4],
            );
            parts.insert(*pass, m);
        }
        ChunkMeshCPU {
            coord: ChunkCoord::new(0, 0),
            bbox: Aabb::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0)),
            parts,
        }
    }

    #[test]
    fn finalize_is_one_shot() {
        let mut pool = BufferPool::new(8);
        let mut mesh = ChunkMesh::new(cpu_mesh(2));
        let mut uploads = 0;
        mesh.finalize_with(&mut pool, |_, _| uploads += 1);
        assert!(mesh.generated());
        assert_eq!(uploads, 2);
        assert_eq!(pool.live_count(), 2);
        mesh.finalize_with(&mut pool, |_, _| uploads += 1);
        assert_eq!(uploads, 2, "second finalize must not re-upload");
        assert_eq!(pool.live_count(), 2, "second finalize must not acquire");
    }

    #[test]
    fn finalize_frees_cpu_arrays_and_freezes_counts() {
        let mut pool = BufferPool::new(8);
        let mut mesh = ChunkMesh::new(cpu_mesh(1));
        let before = mesh.parts()[0].vertex_count;
        mesh.finalize(&mut pool);
        let part = &mesh.parts()[0];
        assert!(part.cpu().is_none());
        assert_eq!(part.vertex_count, before);
        assert_eq!(part.index_count, 6);
        assert!(part.handle.is_some());
    }

    #[test]
    fn dispose_returns_handles() {
        let mut pool = BufferPool::new(8);
        let mut mesh = ChunkMesh::new(cpu_mesh(3));
        mesh.finalize(&mut pool);
        assert_eq!(pool.live_count(), 3);
        mesh.dispose(&mut pool);
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.free_count(), 8);
    }
}
