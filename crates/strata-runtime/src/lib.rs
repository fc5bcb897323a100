//! Background chunk build workers: generate, light, mesh.
#![forbid(unsafe_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use hashbrown::HashMap;
use std::sync::Mutex;
use strata_blocks::Block;
use strata_chunk::{ChunkBuf, ChunkCoord};
use strata_lighting::{LightBorders, LightingStore, compute_light_with_borders};
use strata_mesh::{ChunkMeshCPU, NeighborBufs, NeighborsLoaded, build_chunk_mesh};
use strata_world::World;

/// One chunk rebuild request. `rev` is the edit revision the caller saw
/// when scheduling; stale results are recognized by comparing it on the
/// way back. `chunk_edits` are replayed over the generated buffer so a
/// chunk regenerated from seed still carries its edits.
#[derive(Clone, Debug)]
pub struct BuildJob {
    pub coord: ChunkCoord,
    pub rev: u64,
    pub job_id: u64,
    pub neighbors: NeighborsLoaded,
    pub chunk_edits: Vec<((i32, i32, i32), Block)>,
    pub daylight: f32,
}

pub struct JobOut {
    pub coord: ChunkCoord,
    pub rev: u64,
    pub job_id: u64,
    pub cpu: Option<ChunkMeshCPU>,
    pub buf: ChunkBuf,
    pub light_borders: LightBorders,
    pub t_total_ms: u32,
    pub t_light_ms: u32,
    pub t_mesh_ms: u32,
}

fn ms(t: Instant) -> u32 {
    t.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

fn process_build_job(
    job: BuildJob,
    world: &World,
    lighting: &LightingStore,
    tx: &Sender<JobOut>,
) {
    let t_start = Instant::now();
    let mut buf = world.snapshot_chunk(job.coord);

    let base_x = job.coord.cx * buf.sx as i32;
    let base_z = job.coord.cz * buf.sz as i32;
    for ((wx, wy, wz), b) in job.chunk_edits.iter().copied() {
        buf.set_block(wx - base_x, wy, wz - base_z, b);
    }

    let t0 = Instant::now();
    let light_borders = compute_light_with_borders(&mut buf, lighting, world.registry());
    let t_light_ms = ms(t0);

    let t0 = Instant::now();
    let xn = nb_snapshot(world, job.neighbors.xn, job.coord.offset(-1, 0));
    let xp = nb_snapshot(world, job.neighbors.xp, job.coord.offset(1, 0));
    let zn = nb_snapshot(world, job.neighbors.zn, job.coord.offset(0, -1));
    let zp = nb_snapshot(world, job.neighbors.zp, job.coord.offset(0, 1));
    let nbs = NeighborBufs {
        xn: xn.as_ref(),
        xp: xp.as_ref(),
        zn: zn.as_ref(),
        zp: zp.as_ref(),
    };
    let cpu = build_chunk_mesh(&buf, &nbs, world.registry(), job.daylight);
    let t_mesh_ms = ms(t0);

    buf.dirty = false;
    buf.fresh = false;
    let _ = tx.send(JobOut {
        coord: job.coord,
        rev: job.rev,
        job_id: job.job_id,
        cpu,
        buf,
        light_borders,
        t_total_ms: ms(t_start),
        t_light_ms,
        t_mesh_ms,
    });
}

fn nb_snapshot(world: &World, loaded: bool, coord: ChunkCoord) -> Option<ChunkBuf> {
    if loaded {
        world.snapshot_loaded(coord)
    } else {
        None
    }
}

/// Worker pool over two lanes. The edit lane preempts the background
/// lane so player edits never wait behind streaming. Dropping the
/// runtime closes the channels and joins every worker.
pub struct Runtime {
    job_tx_edit: Option<Sender<BuildJob>>,
    job_tx_bg: Option<Sender<BuildJob>>,
    res_rx: Receiver<JobOut>,
    workers: Vec<JoinHandle<()>>,
    q_edit: Arc<AtomicUsize>,
    q_bg: Arc<AtomicUsize>,
    inflight: Arc<AtomicUsize>,
    latest_job: Mutex<HashMap<ChunkCoord, u64>>,
    next_job_id: AtomicUsize,
    pub worker_count: usize,
}

impl Runtime {
    pub fn new(world: Arc<World>, lighting: Arc<LightingStore>) -> Self {
        let (job_tx_edit, job_rx_edit) = unbounded::<BuildJob>();
        let (job_tx_bg, job_rx_bg) = unbounded::<BuildJob>();
        let (res_tx, res_rx) = unbounded::<JobOut>();

        let worker_count = thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1).max(1))
            .unwrap_or(4);

        let q_edit = Arc::new(AtomicUsize::new(0));
        let q_bg = Arc::new(AtomicUsize::new(0));
        let inflight = Arc::new(AtomicUsize::new(0));

        let mut workers = Vec::with_capacity(worker_count);
        for i in 0..worker_count {
            let edit_rx = job_rx_edit.clone();
            let bg_rx = job_rx_bg.clone();
            let tx = res_tx.clone();
            let world = world.clone();
            let lighting = lighting.clone();
            let q_edit = q_edit.clone();
            let q_bg = q_bg.clone();
            let inflight = inflight.clone();
            let handle = thread::Builder::new()
                .name(format!("strata-worker-{i}"))
                .spawn(move || {
                    worker_loop(&edit_rx, &bg_rx, &tx, &world, &lighting, &q_edit, &q_bg, &inflight)
                })
                .expect("worker thread");
            workers.push(handle);
        }
        log::info!("runtime started with {} workers", worker_count);

        Self {
            job_tx_edit: Some(job_tx_edit),
            job_tx_bg: Some(job_tx_bg),
            res_rx,
            workers,
            q_edit,
            q_bg,
            inflight,
            latest_job: Mutex::new(HashMap::new()),
            next_job_id: AtomicUsize::new(1),
            worker_count,
        }
    }

    pub fn next_job_id(&self) -> u64 {
        self.next_job_id.fetch_add(1, Ordering::Relaxed) as u64
    }

    pub fn submit_build_job_edit(&self, job: BuildJob) {
        self.note_latest(job.coord, job.job_id);
        if let Some(tx) = &self.job_tx_edit {
            self.q_edit.fetch_add(1, Ordering::Relaxed);
            if tx.send(job).is_err() {
                self.q_edit.fetch_sub(1, Ordering::Relaxed);
            }
        }
    }

    pub fn submit_build_job_bg(&self, job: BuildJob) {
        self.note_latest(job.coord, job.job_id);
        if let Some(tx) = &self.job_tx_bg {
            self.q_bg.fetch_add(1, Ordering::Relaxed);
            if tx.send(job).is_err() {
                self.q_bg.fetch_sub(1, Ordering::Relaxed);
            }
        }
    }

    fn note_latest(&self, coord: ChunkCoord, job_id: u64) {
        let mut m = self.latest_job.lock().unwrap_or_else(|e| e.into_inner());
        m.insert(coord, job_id);
    }

    /// A result is current if no newer job was submitted for its chunk.
    pub fn is_current(&self, out: &JobOut) -> bool {
        let m = self.latest_job.lock().unwrap_or_else(|e| e.into_inner());
        m.get(&out.coord).copied() == Some(out.job_id)
    }

    /// Drops the latest-job entry for a chunk that left the streaming
    /// window. Any result still in flight for it reads as stale. The map
    /// would otherwise grow with every chunk ever scheduled.
    pub fn forget_chunk(&self, coord: ChunkCoord) {
        let mut m = self.latest_job.lock().unwrap_or_else(|e| e.into_inner());
        m.remove(&coord);
    }

    pub fn tracked_chunks(&self) -> usize {
        let m = self.latest_job.lock().unwrap_or_else(|e| e.into_inner());
        m.len()
    }

    pub fn drain_worker_results(&self) -> Vec<JobOut> {
        self.res_rx.try_iter().collect()
    }

    pub fn queue_debug_counts(&self) -> (usize, usize, usize) {
        (
            self.q_edit.load(Ordering::Relaxed),
            self.q_bg.load(Ordering::Relaxed),
            self.inflight.load(Ordering::Relaxed),
        )
    }

    pub fn idle(&self) -> bool {
        let (qe, qb, inflight) = self.queue_debug_counts();
        qe == 0 && qb == 0 && inflight == 0
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.job_tx_edit.take();
        self.job_tx_bg.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("worker thread panicked during shutdown");
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn worker_loop(
    edit_rx: &Receiver<BuildJob>,
    bg_rx: &Receiver<BuildJob>,
    tx: &Sender<JobOut>,
    world: &World,
    lighting: &LightingStore,
    q_edit: &AtomicUsize,
    q_bg: &AtomicUsize,
    inflight: &AtomicUsize,
) {
    let mut edit_open = true;
    let mut bg_open = true;
    while edit_open || bg_open {
        // Edit jobs first.
        if edit_open {
            match edit_rx.try_recv() {
                Ok(job) => {
                    q_edit.fetch_sub(1, Ordering::Relaxed);
                    inflight.fetch_add(1, Ordering::Relaxed);
                    process_build_job(job, world, lighting, tx);
                    inflight.fetch_sub(1, Ordering::Relaxed);
                    continue;
                }
                Err(TryRecvError::Disconnected) => edit_open = false,
                Err(TryRecvError::Empty) => {}
            }
        }
        if bg_open {
            match bg_rx.try_recv() {
                Ok(job) => {
                    q_bg.fetch_sub(1, Ordering::Relaxed);
                    inflight.fetch_add(1, Ordering::Relaxed);
                    process_build_job(job, world, lighting, tx);
                    inflight.fetch_sub(1, Ordering::Relaxed);
                    continue;
                }
                Err(TryRecvError::Disconnected) => bg_open = false,
                Err(TryRecvError::Empty) => {}
            }
        }
        // Nothing ready on either lane; block until one delivers. A
        // closed lane must not enter the select or it would spin.
        match (edit_open, bg_open) {
            (true, true) => crossbeam_channel::select! {
                recv(edit_rx) -> res => match res {
                    Ok(job) => {
                        q_edit.fetch_sub(1, Ordering::Relaxed);
                        inflight.fetch_add(1, Ordering::Relaxed);
                        process_build_job(job, world, lighting, tx);
                        inflight.fetch_sub(1, Ordering::Relaxed);
                    }
                    Err(_) => edit_open = false,
                },
                recv(bg_rx) -> res => match res {
                    Ok(job) => {
                        q_bg.fetch_sub(1, Ordering::Relaxed);
                        inflight.fetch_add(1, Ordering::Relaxed);
                        process_build_job(job, world, lighting, tx);
                        inflight.fetch_sub(1, Ordering::Relaxed);
                    }
                    Err(_) => bg_open = false,
                },
            },
            (true, false) => match edit_rx.recv() {
                Ok(job) => {
                    q_edit.fetch_sub(1, Ordering::Relaxed);
                    inflight.fetch_add(1, Ordering::Relaxed);
                    process_build_job(job, world, lighting, tx);
                    inflight.fetch_sub(1, Ordering::Relaxed);
                }
                Err(_) => edit_open = false,
            },
            (false, true) => match bg_rx.recv() {
                Ok(job) => {
                    q_bg.fetch_sub(1, Ordering::Relaxed);
                    inflight.fetch_add(1, Ordering::Relaxed);
                    process_build_job(job, world, lighting, tx);
                    inflight.fetch_sub(1, Ordering::Relaxed);
                }
                Err(_) => bg_open = false,
            },
            (false, false) => {}
        }
    }
}
