use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::types::{ATLAS_CELL, Block, FaceRole, RenderPass};

/// Resolved definition for one block id.
#[derive(Clone, Debug)]
pub struct BlockDef {
    pub id: u16,
    pub name: String,
    pub solid: bool,
    pub translucent: bool,
    pub billboard: bool,
    /// Faces of neighboring blocks are always drawn against this block
    /// (leaves, so foliage reads as a volume instead of a shell).
    pub porous: bool,
    pub invisible: bool,
    pub casts_shadow: bool,
    pub pass: RenderPass,
    atlas: [[u8; 2]; 3],
    tint: [[f32; 3]; 3],
}

impl BlockDef {
    #[inline]
    pub fn atlas_cell(&self, role: FaceRole) -> (f32, f32) {
        let c = self.atlas[role_idx(role)];
        (c[0] as f32 * ATLAS_CELL, c[1] as f32 * ATLAS_CELL)
    }

    #[inline]
    pub fn tint(&self, role: FaceRole) -> [f32; 3] {
        self.tint[role_idx(role)]
    }
}

#[inline]
fn role_idx(role: FaceRole) -> usize {
    match role {
        FaceRole::Top => 0,
        FaceRole::Bottom => 1,
        FaceRole::Side => 2,
    }
}

/// Id-indexed block table loaded from a TOML catalog.
pub struct BlockRegistry {
    defs: Vec<Option<BlockDef>>,
    by_name: HashMap<String, u16>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    blocks: Vec<RawBlock>,
}

#[derive(Deserialize)]
struct RawBlock {
    id: u16,
    name: String,
    #[serde(default = "default_true")]
    solid: bool,
    #[serde(default)]
    translucent: bool,
    #[serde(default)]
    billboard: bool,
    #[serde(default)]
    porous: bool,
    #[serde(default)]
    invisible: bool,
    #[serde(default)]
    casts_shadow: Option<bool>,
    #[serde(default = "default_pass")]
    pass: String,
    #[serde(default)]
    atlas: RawFaces<[u8; 2]>,
    #[serde(default)]
    tint: RawFaces<[f32; 3]>,
}

#[derive(Deserialize, Default)]
struct RawFaces<T> {
    #[serde(default)]
    all: Option<T>,
    #[serde(default)]
    top: Option<T>,
    #[serde(default)]
    bottom: Option<T>,
    #[serde(default)]
    side: Option<T>,
}

impl<T: Copy> RawFaces<T> {
    fn resolve(&self, fallback: T) -> [T; 3] {
        let base = self.all.unwrap_or(fallback);
        [
            self.top.unwrap_or(base),
            self.bottom.unwrap_or(base),
            self.side.unwrap_or(base),
        ]
    }
}

fn default_true() -> bool {
    true
}

fn default_pass() -> String {
    "opaque".to_string()
}

fn parse_pass(s: &str) -> Result<RenderPass, String> {
    match s {
        "opaque" => Ok(RenderPass::Opaque),
        "translucent" => Ok(RenderPass::Translucent),
        "billboard" => Ok(RenderPass::Billboard),
        "water" => Ok(RenderPass::Water),
        "lava" => Ok(RenderPass::Lava),
        other => Err(format!("unknown render pass '{}'", other)),
    }
}

impl BlockRegistry {
    pub fn from_toml_str(text: &str) -> Result<Self, String> {
        let cat: CatalogFile =
            toml::from_str(text).map_err(|e| format!("block catalog parse error: {}", e))?;
        if cat.blocks.is_empty() {
            return Err("block catalog has no blocks".to_string());
        }
        let max_id = cat.blocks.iter().map(|b| b.id).max().unwrap_or(0);
        let mut defs: Vec<Option<BlockDef>> = vec![None; max_id as usize + 1];
        let mut by_name = HashMap::new();
        for raw in cat.blocks {
            if defs[raw.id as usize].is_some() {
                return Err(format!("duplicate block id {}", raw.id));
            }
            if by_name.contains_key(&raw.name) {
                return Err(format!("duplicate block name '{}'", raw.name));
            }
            let pass = parse_pass(&raw.pass)?;
            let casts_shadow = raw
                .casts_shadow
                .unwrap_or(raw.solid && !raw.translucent && !raw.billboard);
            let def = BlockDef {
                id: raw.id,
                name: raw.name.clone(),
                solid: raw.solid,
                translucent: raw.translucent,
                billboard: raw.billboard,
                porous: raw.porous,
                invisible: raw.invisible,
                casts_shadow,
                pass,
                atlas: raw.atlas.resolve([0, 0]),
                tint: raw.tint.resolve([1.0, 1.0, 1.0]),
            };
            by_name.insert(raw.name, raw.id);
            defs[raw.id as usize] = Some(def);
        }
        if defs.first().and_then(|d| d.as_ref()).is_none_or(|d| !d.invisible) {
            return Err("block id 0 must be defined and invisible (air)".to_string());
        }
        Ok(Self { defs, by_name })
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("read {}: {}", path.display(), e))?;
        Self::from_toml_str(&text)
    }

    /// The catalog compiled into the binary. Covers the stock block set.
    pub fn default_catalog() -> Self {
        // The embedded catalog is validated by tests; a failure here means
        // the crate itself shipped a broken file.
        match Self::from_toml_str(include_str!("../assets/blocks.toml")) {
            Ok(r) => r,
            Err(e) => unreachable!("embedded block catalog invalid: {}", e),
        }
    }

    #[inline]
    pub fn get(&self, b: Block) -> Option<&BlockDef> {
        self.defs.get(b.0 as usize).and_then(|d| d.as_ref())
    }

    #[inline]
    pub fn id_by_name(&self, name: &str) -> Option<Block> {
        self.by_name.get(name).copied().map(Block)
    }

    /// Light passes through air, unknown ids, and translucent blocks.
    #[inline]
    pub fn is_translucent(&self, b: Block) -> bool {
        match self.get(b) {
            None => true,
            Some(d) => d.invisible || d.translucent || d.billboard,
        }
    }

    #[inline]
    pub fn blocks_light(&self, b: Block) -> bool {
        !self.is_translucent(b)
    }

    #[inline]
    pub fn casts_shadow(&self, b: Block) -> bool {
        self.get(b).is_some_and(|d| d.casts_shadow)
    }

    /// Fully occluding cube: hides the touching face of any neighbor.
    #[inline]
    pub fn occludes(&self, b: Block) -> bool {
        self.get(b)
            .is_some_and(|d| d.solid && !d.translucent && !d.billboard && !d.invisible)
    }

    pub fn len(&self) -> usize {
        self.defs.iter().filter(|d| d.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
