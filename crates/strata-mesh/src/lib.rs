//! CPU meshing: face visibility, per-vertex shading, and render-pass
//! bucketing for chunk geometry.
#![forbid(unsafe_code)]

mod chunk;
mod emit;
mod face;
mod mesh_build;

pub use chunk::ChunkMeshCPU;
pub use emit::{NeighborBufs, NeighborsLoaded, build_chunk_mesh, face_visible};
pub use face::Face;
pub use mesh_build::MeshBuild;
