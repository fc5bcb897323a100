//! Terrain generation, the chunk cache, and the `World` facade external
//! collaborators drive through `get_block`/`set_block`.
#![forbid(unsafe_code)]

mod cache;
mod day_cycle;
mod r#gen;
mod world;
pub mod worldgen;

pub use cache::ChunkCache;
pub use day_cycle::{DAYLIGHT_DUSK, DAYLIGHT_STEP, DayCycle};
pub use r#gen::GenCtx;
pub use world::World;
pub use worldgen::{WorldGenParams, load_params_from_path};
