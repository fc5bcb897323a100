//! Block identities, render flags, and the TOML-driven registry.
#![forbid(unsafe_code)]

pub mod registry;
pub mod types;

pub use registry::{BlockDef, BlockRegistry};
pub use types::{ATLAS_CELL, Block, FaceRole, RenderPass};
