use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;

use hashbrown::HashMap;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use strata_blocks::{Block, BlockRegistry};
use strata_buffers::{BufferPool, ChunkMesh};
use strata_chunk::ChunkCoord;
use strata_edit::EditStore;
use strata_lighting::LightingStore;
use strata_mesh::NeighborsLoaded;
use strata_runtime::{BuildJob, Runtime};
use strata_world::{DayCycle, World, WorldGenParams, load_params_from_path};

use crate::streaming::StreamingWindow;

/// How many freshly built meshes get their buffers generated per tick.
const FINALIZE_BUDGET: usize = 32;

pub struct AppConfig {
    pub seed: String,
    pub view_dist: usize,
    pub worldgen: Option<PathBuf>,
    pub blocks: Option<PathBuf>,
    pub save_dir: Option<PathBuf>,
    pub day_length: f32,
    pub walk_interval: u64,
}

pub struct App {
    world: Arc<World>,
    lighting: Arc<LightingStore>,
    rt: Runtime,
    edits: EditStore,
    pool: BufferPool,
    meshes: HashMap<ChunkCoord, ChunkMesh>,
    finalize_queue: Vec<ChunkCoord>,
    window: StreamingWindow,
    day: DayCycle,
    worldgen_path: Option<PathBuf>,
    watcher_rx: Option<mpsc::Receiver<PathBuf>>,
    _watcher: Option<RecommendedWatcher>,
    walk_interval: u64,
    edit_phase: bool,
    tick: u64,
    built_chunks: u64,
    quads_total: u64,
    stale_drops: u64,
}

impl App {
    pub fn new(cfg: AppConfig) -> Result<Self, String> {
        let reg = match &cfg.blocks {
            Some(path) => BlockRegistry::load_from_path(path)?,
            None => BlockRegistry::default_catalog(),
        };
        let params = match &cfg.worldgen {
            Some(path) => load_params_from_path(path)?,
            None => WorldGenParams::default(),
        };
        let world = Arc::new(World::new(
            &cfg.seed,
            Arc::new(reg),
            params,
            cfg.view_dist,
            cfg.save_dir.clone(),
        )?);
        let lighting = Arc::new(LightingStore::new());
        let rt = Runtime::new(world.clone(), lighting.clone());
        let window = StreamingWindow::new(cfg.view_dist);
        let pool = BufferPool::new(window.slot_count() * 5);
        let edits = EditStore::new(world.sx, world.sz);

        let (watcher, watcher_rx) = match &cfg.worldgen {
            Some(path) => {
                let (w, rx) = watch_file(path)?;
                (Some(w), Some(rx))
            }
            None => (None, None),
        };

        log::info!(
            "world '{}' ready: view_dist={} workers={}",
            cfg.seed,
            cfg.view_dist,
            rt.worker_count
        );
        Ok(Self {
            world,
            lighting,
            rt,
            edits,
            pool,
            meshes: HashMap::new(),
            finalize_queue: Vec::new(),
            window,
            day: DayCycle::new(cfg.day_length),
            worldgen_path: cfg.worldgen,
            watcher_rx,
            _watcher: watcher,
            walk_interval: cfg.walk_interval.max(1),
            edit_phase: false,
            tick: 0,
            built_chunks: 0,
            quads_total: 0,
            stale_drops: 0,
        })
    }

    pub fn run(&mut self, ticks: u64, dt: f32) {
        self.retarget(ChunkCoord::new(0, 0));
        for _ in 0..ticks {
            self.step(dt);
        }
        log::info!(
            "done after {} ticks: {} chunk builds, {} quads, {} stale results dropped, {} meshes live, pool live/free {}/{}",
            self.tick,
            self.built_chunks,
            self.quads_total,
            self.stale_drops,
            self.meshes.len(),
            self.pool.live_count(),
            self.pool.free_count()
        );
    }

    pub fn step(&mut self, dt: f32) {
        self.tick += 1;

        if self.day.advance(dt) {
            log::debug!("daylight stepped to {:.1}; re-meshing window", self.day.daylight());
            let coords: Vec<ChunkCoord> = self.window.iter().collect();
            for c in coords {
                self.queue_bg(c);
            }
        }

        if self.tick % self.walk_interval == 0 {
            let next = self.window.center().offset(1, 0);
            self.retarget(next);
        }

        if self.tick % 60 == 0 {
            self.soak_edit();
        }

        self.process_worldgen_file_events();
        self.process_worker_results();
        self.finalize_some();

        if self.tick % 100 == 0 {
            let (qe, qb, inflight) = self.rt.queue_debug_counts();
            log::info!(
                "tick {}: center {} loaded {} meshes {} queues e/b/i {}/{}/{} borders {}",
                self.tick,
                self.window.center(),
                self.world.loaded_count(),
                self.meshes.len(),
                qe,
                qb,
                inflight,
                self.lighting.len()
            );
        }
    }

    fn retarget(&mut self, center: ChunkCoord) {
        let moved = self.window.retarget(center);
        self.world.set_focus(center);
        for c in moved.exits {
            if let Some(mut mesh) = self.meshes.remove(&c) {
                mesh.dispose(&mut self.pool);
            }
            self.lighting.clear_chunk(c.cx, c.cz);
            self.rt.forget_chunk(c);
            self.edits.forget_revs(c);
        }
        for c in moved.enters {
            self.queue_bg(c);
        }
    }

    /// Periodically places and removes a block near the window center to
    /// exercise the edit lane and seam invalidation.
    fn soak_edit(&mut self) {
        let center = self.window.center();
        let wx = center.cx * self.world.sx as i32;
        let wz = center.cz * self.world.sz as i32;
        let wy = (self.world.sy as i32) - 16;
        let Some(stone) = self.world.registry().id_by_name("stone") else {
            return;
        };
        let b = if self.edit_phase { Block::AIR } else { stone };
        self.edit_phase = !self.edit_phase;
        self.edits.set(wx, wy, wz, b);
        self.world.set_block(wx, wy, wz, b);
        self.edits.bump_region_around(wx, wy, wz);
        for c in self.edits.affected_chunks(wx, wz) {
            if self.window.contains(c) {
                self.queue_edit(c);
            }
        }
    }

    fn process_worldgen_file_events(&mut self) {
        let Some(rx) = &self.watcher_rx else {
            return;
        };
        let changed = rx.try_iter().count();
        if changed == 0 {
            return;
        }
        let Some(path) = &self.worldgen_path else {
            return;
        };
        match load_params_from_path(path) {
            Ok(params) => {
                log::info!("worldgen file changed; regenerating loaded terrain");
                self.world.update_params(params);
                self.world.clear_loaded();
                let coords: Vec<ChunkCoord> = self.window.iter().collect();
                for c in coords {
                    self.queue_bg(c);
                }
            }
            Err(e) => log::warn!("ignoring worldgen reload: {}", e),
        }
    }

    fn process_worker_results(&mut self) {
        for out in self.rt.drain_worker_results() {
            if !self.rt.is_current(&out) {
                self.stale_drops += 1;
                continue;
            }
            if !self.window.contains(out.coord) {
                continue;
            }
            let coord = out.coord;
            let borders_changed = self
                .lighting
                .update_borders(coord.cx, coord.cz, out.light_borders);
            self.world.store_chunk(out.buf);
            self.edits.mark_built(coord, out.rev);
            self.built_chunks += 1;

            if let Some(mut old) = self.meshes.remove(&coord) {
                old.dispose(&mut self.pool);
            }
            if let Some(cpu) = out.cpu {
                self.quads_total += cpu.total_quads() as u64;
                self.meshes.insert(coord, ChunkMesh::new(cpu));
                self.finalize_queue.push(coord);
            }

            if borders_changed {
                for n in [
                    coord.offset(-1, 0),
                    coord.offset(1, 0),
                    coord.offset(0, -1),
                    coord.offset(0, 1),
                ] {
                    if self.window.contains(n) && self.world.is_loaded(n) {
                        self.queue_bg(n);
                    }
                }
            }
        }
    }

    fn finalize_some(&mut self) {
        let take = self.finalize_queue.len().min(FINALIZE_BUDGET);
        for coord in self.finalize_queue.drain(..take) {
            if let Some(mesh) = self.meshes.get_mut(&coord) {
                mesh.finalize(&mut self.pool);
            }
        }
    }

    fn queue_bg(&self, coord: ChunkCoord) {
        self.rt.submit_build_job_bg(self.make_job(coord));
    }

    fn queue_edit(&self, coord: ChunkCoord) {
        self.rt.submit_build_job_edit(self.make_job(coord));
    }

    fn make_job(&self, coord: ChunkCoord) -> BuildJob {
        BuildJob {
            coord,
            rev: self.edits.get_rev(coord),
            job_id: self.rt.next_job_id(),
            neighbors: NeighborsLoaded {
                xn: self.world.is_loaded(coord.offset(-1, 0)),
                xp: self.world.is_loaded(coord.offset(1, 0)),
                zn: self.world.is_loaded(coord.offset(0, -1)),
                zp: self.world.is_loaded(coord.offset(0, 1)),
            },
            chunk_edits: self.edits.snapshot_for_chunk(coord),
            daylight: self.day.daylight(),
        }
    }
}

fn watch_file(path: &PathBuf) -> Result<(RecommendedWatcher, mpsc::Receiver<PathBuf>), String> {
    let (tx, rx) = mpsc::channel::<PathBuf>();
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        if let Ok(ev) = res {
            if matches!(ev.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                for p in ev.paths {
                    let _ = tx.send(p);
                }
            }
        }
    })
    .map_err(|e| format!("create watcher: {}", e))?;
    watcher
        .watch(path, RecursiveMode::NonRecursive)
        .map_err(|e| format!("watch {}: {}", path.display(), e))?;
    Ok((watcher, rx))
}
