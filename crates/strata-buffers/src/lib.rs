//! Pooled GPU buffer handles and the retained chunk-mesh artifact with
//! its one-shot finalize contract.
#![forbid(unsafe_code)]

mod chunk_mesh;
mod pool;

pub use chunk_mesh::{ChunkMesh, MeshPart};
pub use pool::{BufferHandle, BufferPool};
