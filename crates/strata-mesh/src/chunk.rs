use std::collections::HashMap;

use strata_blocks::RenderPass;
use strata_chunk::ChunkCoord;
use strata_geom::Aabb;

use crate::mesh_build::MeshBuild;

/// Finished CPU geometry for one chunk, bucketed by render pass. Only
/// non-empty buckets are present.
pub struct ChunkMeshCPU {
    pub coord: ChunkCoord,
    pub bbox: Aabb,
    pub parts: HashMap<RenderPass, MeshBuild>,
}

impl ChunkMeshCPU {
    pub fn total_quads(&self) -> usize {
        self.parts.values().map(|m| m.quad_count()).sum()
    }
}
