/// UV size of one cell in the 16x16 texture atlas.
pub const ATLAS_CELL: f32 = 0.0625;

/// Block id. Id 0 is always air.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Block(pub u16);

impl Block {
    pub const AIR: Block = Block(0);

    #[inline]
    pub fn is_air(self) -> bool {
        self == Block::AIR
    }
}

/// Which bucket a block's quads land in. Buckets are drawn in a fixed
/// order by the renderer (opaque first, water and lava last).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RenderPass {
    Opaque,
    Translucent,
    Billboard,
    Water,
    Lava,
}

impl RenderPass {
    pub const ALL: [RenderPass; 5] = [
        RenderPass::Opaque,
        RenderPass::Translucent,
        RenderPass::Billboard,
        RenderPass::Water,
        RenderPass::Lava,
    ];
}

/// Top/bottom/side classification for per-face atlas cells and tints.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FaceRole {
    Top,
    Bottom,
    Side,
}
