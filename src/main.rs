//! Headless voxel engine driver: streams terrain around a moving focus,
//! rebuilds chunk meshes on background workers, and soaks edits and the
//! day cycle against the pipeline.

mod app;
mod streaming;

use std::path::PathBuf;

use clap::Parser;

use crate::app::{App, AppConfig};

#[derive(Parser, Debug)]
#[command(name = "strata", about = "Chunked voxel terrain engine (headless driver)")]
struct Args {
    /// World seed string.
    #[arg(long, default_value = "strata")]
    seed: String,

    /// Streaming radius in chunks around the focus.
    #[arg(long, default_value_t = 6)]
    view_dist: usize,

    /// Simulation ticks to run before exiting.
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Simulated seconds per tick.
    #[arg(long, default_value_t = 0.05)]
    tick_dt: f32,

    /// Worldgen parameter TOML; watched for live reloads.
    #[arg(long)]
    worldgen: Option<PathBuf>,

    /// Block catalog TOML; defaults to the built-in catalog.
    #[arg(long)]
    blocks: Option<PathBuf>,

    /// Directory for evicted chunk spills; omit for a memory-only world.
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Seconds between daylight steps.
    #[arg(long, default_value_t = 120.0)]
    day_length: f32,

    /// Ticks between focus steps along +x.
    #[arg(long, default_value_t = 16)]
    walk_interval: u64,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = AppConfig {
        seed: args.seed,
        view_dist: args.view_dist,
        worldgen: args.worldgen,
        blocks: args.blocks,
        save_dir: args.save_dir,
        day_length: args.day_length,
        walk_interval: args.walk_interval,
    };
    match App::new(cfg) {
        Ok(mut app) => app.run(args.ticks, args.tick_dt),
        Err(e) => {
            log::error!("startup failed: {}", e);
            std::process::exit(1);
        }
    }
}
