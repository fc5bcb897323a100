use strata_blocks::{Block, BlockRegistry};
use strata_chunk::{ChunkBuf, ChunkCoord};
use strata_noise::{FastRandom, PerlinNoise};

use crate::worldgen::WorldGenParams;

/// The three noise generators terrain generation draws from, seeded in a
/// fixed order from the world seed so a seed string pins the whole world.
pub struct GenCtx {
    pub terrain: PerlinNoise,
    pub caves: PerlinNoise,
    pub forest: PerlinNoise,
}

impl GenCtx {
    pub fn new(seed_hash: i32) -> Self {
        let mut rng = FastRandom::new(seed_hash as i64);
        let terrain = PerlinNoise::new(rng.rand_i64() as i32);
        let caves = PerlinNoise::new(rng.rand_i64() as i32);
        let forest = PerlinNoise::new(rng.rand_i64() as i32);
        Self {
            terrain,
            caves,
            forest,
        }
    }
}

/// Block ids the generator writes, resolved from the catalog once.
#[derive(Clone, Copy)]
pub struct BlockIds {
    pub grass: Block,
    pub dirt: Block,
    pub stone: Block,
    pub water: Block,
    pub trunk: Block,
    pub leaf: Block,
    pub dark_leaf: Block,
    pub sand: Block,
    pub bedrock: Block,
    pub red_flower: Block,
    pub yellow_flower: Block,
    pub tall_grass: Block,
    pub dry_grass: Block,
    pub cactus: Block,
    pub lava: Block,
    pub snow_grass: Block,
    pub coal_ore: Block,
    pub gold_ore: Block,
    pub diamond_ore: Block,
    pub redstone_ore: Block,
    pub silver_ore: Block,
}

impl BlockIds {
    pub fn resolve(reg: &BlockRegistry) -> Result<Self, String> {
        let get = |name: &str| {
            reg.id_by_name(name)
                .ok_or_else(|| format!("block catalog is missing '{}'", name))
        };
        Ok(Self {
            grass: get("grass")?,
            dirt: get("dirt")?,
            stone: get("stone")?,
            water: get("water")?,
            trunk: get("trunk")?,
            leaf: get("leaf")?,
            dark_leaf: get("dark_leaf")?,
            sand: get("sand")?,
            bedrock: get("bedrock")?,
            red_flower: get("red_flower")?,
            yellow_flower: get("yellow_flower")?,
            tall_grass: get("tall_grass")?,
            dry_grass: get("dry_grass")?,
            cactus: get("cactus")?,
            lava: get("lava")?,
            snow_grass: get("snow_grass")?,
            coal_ore: get("coal_ore")?,
            gold_ore: get("gold_ore")?,
            diamond_ore: get("diamond_ore")?,
            redstone_ore: get("redstone_ore")?,
            silver_ore: get("silver_ore")?,
        })
    }
}

/// Column height from the elevation fractal plus a rough detail term.
pub fn height_at(ctx: &GenCtx, p: &WorldGenParams, sy: usize, wx: i32, wz: i32) -> i32 {
    let f = &p.frequencies;
    let (x, z) = (wx as f64, wz as f64);
    let elevation = ctx
        .terrain
        .multi_fractal(x * f.elevation, 0.0, z * f.elevation, 8, 2.0, 0.86471)
        .abs()
        * 128.0;
    let roughness = ctx
        .terrain
        .multi_fractal(x * f.roughness, 0.0, z * f.roughness, 4, 2.0, 0.86471);
    let detail = ctx.terrain.noise(x * f.detail, 0.0, z * f.detail);
    let h = elevation + roughness * detail * 64.0;
    (h as i32).clamp(1, sy as i32 - 1)
}

/// A cell survives carving only when both cave and canyon densities stay
/// below their cutoffs.
fn keeps_block(ctx: &GenCtx, p: &WorldGenParams, wx: i32, wy: i32, wz: i32) -> bool {
    let f = &p.frequencies;
    let (x, y, z) = (wx as f64, wy as f64, wz as f64);
    let cave = ctx.caves.noise(x * f.cave, y * f.cave, z * f.cave);
    if cave >= 0.5 {
        return false;
    }
    let canyon = ctx.caves.ridged_multi_fractal(
        x * f.canyon,
        y * f.canyon,
        z * f.canyon,
        4,
        2.0,
        0.96461,
        1.0,
        2.0,
    );
    canyon < 0.5
}

/// Forest density in [0, 1) driving tree species and spacing.
pub fn forest_density(ctx: &GenCtx, p: &WorldGenParams, wx: i32, wz: i32) -> f64 {
    let f = p.frequencies.forest;
    ctx.forest.noise(wx as f64 * f, 0.0, wz as f64 * f).abs()
}

fn humidity(ctx: &GenCtx, wx: i32, wz: i32) -> f64 {
    ctx.forest.noise(wx as f64 * 0.08, 0.0, wz as f64 * 0.08).abs()
}

/// Full chunk generation: terrain layering and carving, fluid fill, ores,
/// then flora. Deterministic per (seed, params, coord); chunk-local RNG
/// streams keep neighboring chunks independent of build order.
pub fn generate_chunk(
    ctx: &GenCtx,
    ids: &BlockIds,
    p: &WorldGenParams,
    seed_hash: i32,
    coord: ChunkCoord,
    sx: usize,
    sy: usize,
    sz: usize,
) -> ChunkBuf {
    let mut buf = ChunkBuf::with_dims(coord, sx, sy, sz);
    let base_x = coord.cx * sx as i32;
    let base_z = coord.cz * sz as i32;
    let mut heights = vec![0i32; sx * sz];

    for z in 0..sz {
        for x in 0..sx {
            let wx = base_x + x as i32;
            let wz = base_z + z as i32;
            let h = height_at(ctx, p, sy, wx, wz);
            heights[z * sx + x] = h;
            fill_column(ctx, ids, p, &mut buf, x as i32, z as i32, wx, wz, h);
        }
    }
    fill_fluids(ids, p, &mut buf);
    seed_ores(ids, p, seed_hash, &mut buf);
    grow_flora(ctx, ids, p, seed_hash, &mut buf, &heights);
    buf
}

#[allow(clippy::too_many_arguments)]
fn fill_column(
    ctx: &GenCtx,
    ids: &BlockIds,
    p: &WorldGenParams,
    buf: &mut ChunkBuf,
    x: i32,
    z: i32,
    wx: i32,
    wz: i32,
    h: i32,
) {
    let lv = &p.levels;
    let stone_top = (h as f64 * lv.stone_fraction) as i32;
    for y in 0..=h {
        // Bedrock is unconditional; nothing carves the world floor.
        if y == 0 {
            buf.set_block(x, y, z, ids.bedrock);
            continue;
        }
        if !keeps_block(ctx, p, wx, y, wz) {
            continue;
        }
        let b = if y == h {
            if (lv.beach_low..=lv.beach_high).contains(&y) {
                ids.sand
            } else if y >= lv.snow {
                ids.snow_grass
            } else if y > lv.sea + 2 {
                ids.grass
            } else {
                ids.dirt
            }
        } else if y < stone_top {
            ids.stone
        } else {
            ids.dirt
        };
        buf.set_block(x, y, z, b);
    }
}

/// Water fills open cells up to sea level; lava pools in carved space
/// near the floor.
fn fill_fluids(ids: &BlockIds, p: &WorldGenParams, buf: &mut ChunkBuf) {
    let lv = &p.levels;
    for z in 0..buf.sz as i32 {
        for x in 0..buf.sx as i32 {
            for y in 1..=lv.sea.min(buf.sy as i32 - 1) {
                if buf.get_block(x, y, z) == Some(Block::AIR) {
                    let fluid = if y <= lv.lava { ids.lava } else { ids.water };
                    buf.set_block(x, y, z, fluid);
                }
            }
        }
    }
}

/// Independent normal draws against per-ore thresholds, stone cells only.
fn seed_ores(ids: &BlockIds, p: &WorldGenParams, seed_hash: i32, buf: &mut ChunkBuf) {
    let mut rand = chunk_rand(seed_hash, buf.coord, 0x5eed);
    let ores = &p.ores;
    for z in 0..buf.sz as i32 {
        for x in 0..buf.sx as i32 {
            for y in 0..buf.sy as i32 {
                if buf.get_block(x, y, z) != Some(ids.stone) {
                    continue;
                }
                if rand.std_normal() < ores.coal {
                    buf.set_block(x, y, z, ids.coal_ore);
                }
                if rand.std_normal() < ores.gold {
                    buf.set_block(x, y, z, ids.gold_ore);
                }
                if rand.std_normal() < ores.diamond {
                    buf.set_block(x, y, z, ids.diamond_ore);
                }
                if rand.std_normal() < ores.redstone {
                    buf.set_block(x, y, z, ids.redstone_ore);
                }
                if rand.std_normal() < ores.silver {
                    buf.set_block(x, y, z, ids.silver_ore);
                }
            }
        }
    }
}

fn grow_flora(
    ctx: &GenCtx,
    ids: &BlockIds,
    p: &WorldGenParams,
    seed_hash: i32,
    buf: &mut ChunkBuf,
    heights: &[i32],
) {
    let mut rand = chunk_rand(seed_hash, buf.coord, 0xf10a);
    let base_x = buf.coord.cx * buf.sx as i32;
    let base_z = buf.coord.cz * buf.sz as i32;
    let fl = &p.flora;

    // Tall grass and flowers on exposed grass.
    for z in 0..buf.sz as i32 {
        for x in 0..buf.sx as i32 {
            let h = heights[(z as usize) * buf.sx + x as usize];
            if buf.get_block(x, h, z) != Some(ids.grass) {
                continue;
            }
            let draw = (rand.rand_f64() + 1.0) / 2.0;
            if draw > fl.grass_prob {
                let r = rand.std_normal();
                if (-0.4..0.4).contains(&r) {
                    buf.set_block(x, h + 1, z, ids.tall_grass);
                } else if r >= 0.4 && r < 0.8 {
                    buf.set_block(x, h + 1, z, ids.dry_grass);
                }
                if rand.std_normal() < fl.flower_cutoff {
                    let flower = if rand.rand_bool() {
                        ids.red_flower
                    } else {
                        ids.yellow_flower
                    };
                    buf.set_block(x, h + 1, z, flower);
                }
            }
        }
    }

    // Trees on a sparse lattice, jittered so the grid does not read
    // through. Growth is clipped at chunk bounds.
    let mut x = 2i32;
    while x < buf.sx as i32 {
        let mut z = 2i32;
        while z < buf.sz as i32 {
            let jx = (x + (rand.rand_i64().unsigned_abs() % 3) as i32 - 1)
                .clamp(0, buf.sx as i32 - 1);
            let jz = (z + (rand.rand_i64().unsigned_abs() % 3) as i32 - 1)
                .clamp(0, buf.sz as i32 - 1);
            let h = heights[(jz as usize) * buf.sx + jx as usize];
            let wx = base_x + jx;
            let wz = base_z + jz;
            let surface = buf.get_block(jx, h, jz);
            let density = forest_density(ctx, p, wx, wz);
            let draw = (rand.rand_f64() + 1.0) / 2.0;
            if density >= fl.tree_density_low && draw > fl.tree_prob {
                if surface == Some(ids.sand) && humidity(ctx, wx, wz) < 0.2 {
                    grow_cactus(ids, &mut rand, buf, jx, h + 1, jz);
                } else if surface == Some(ids.grass) || surface == Some(ids.snow_grass) {
                    if density >= fl.tree_density_high {
                        grow_pine(ids, &mut rand, buf, jx, h + 1, jz);
                    } else {
                        grow_tree(ids, &mut rand, buf, jx, h + 1, jz);
                    }
                }
            }
            z += 4;
        }
        x += 4;
    }
}

/// Round-canopy tree: short trunk under a 2-radius leaf blob.
pub fn grow_tree(ids: &BlockIds, rand: &mut FastRandom, buf: &mut ChunkBuf, x: i32, y: i32, z: i32) {
    let trunk_h = 4 + (rand.rand_i64().unsigned_abs() % 2) as i32;
    for dy in 0..trunk_h {
        buf.set_block(x, y + dy, z, ids.trunk);
    }
    for dy in (trunk_h - 2)..=(trunk_h + 1) {
        let r: i32 = if dy < trunk_h { 2 } else { 1 };
        for dx in -r..=r {
            for dz in -r..=r {
                if dx * dx + dz * dz > r * r + 1 {
                    continue;
                }
                if buf.get_block(x + dx, y + dy, z + dz) == Some(Block::AIR) {
                    buf.set_block(x + dx, y + dy, z + dz, ids.leaf);
                }
            }
        }
    }
}

/// Conifer: tall trunk with shrinking dark-leaf discs.
pub fn grow_pine(ids: &BlockIds, rand: &mut FastRandom, buf: &mut ChunkBuf, x: i32, y: i32, z: i32) {
    let trunk_h = 6 + (rand.rand_i64().unsigned_abs() % 2) as i32;
    for dy in 0..trunk_h {
        buf.set_block(x, y + dy, z, ids.trunk);
    }
    for dy in 2..=trunk_h {
        let r = ((trunk_h - dy) / 2 + 1).min(3);
        for dx in -r..=r {
            for dz in -r..=r {
                if dx.abs() + dz.abs() > r + 1 {
                    continue;
                }
                if buf.get_block(x + dx, y + dy, z + dz) == Some(Block::AIR) {
                    buf.set_block(x + dx, y + dy, z + dz, ids.dark_leaf);
                }
            }
        }
    }
    buf.set_block(x, y + trunk_h, z, ids.dark_leaf);
}

pub fn grow_cactus(
    ids: &BlockIds,
    rand: &mut FastRandom,
    buf: &mut ChunkBuf,
    x: i32,
    y: i32,
    z: i32,
) {
    let h = 2 + (rand.rand_i64().unsigned_abs() % 2) as i32;
    for dy in 0..h {
        if buf.get_block(x, y + dy, z) != Some(Block::AIR) {
            break;
        }
        buf.set_block(x, y + dy, z, ids.cactus);
    }
}

/// Per-chunk RNG stream: world seed, chunk key, and a pass tag.
fn chunk_rand(seed_hash: i32, coord: ChunkCoord, pass: u64) -> FastRandom {
    let mix = (seed_hash as i64)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15u64 as i64)
        .wrapping_add(coord.key() as i64)
        .wrapping_add(pass as i64);
    FastRandom::new(mix)
}
