use crate::block::BlockId;

/// One block's packed state: type id, 4-bit metadata, and the two 4-bit
/// light channels.
///
/// Metadata semantics are block-type-specific (orientation, growth stage,
/// power level, fuse timer, ...); only the owning block's callbacks
/// interpret the nibble. Light values are maintained by the lighting
/// collaborator but carried in every read so callbacks can gate on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    pub id: BlockId,
    pub meta: u8,
    pub sky_light: u8,
    pub block_light: u8,
}

impl Cell {
    pub const AIR: Cell = Cell {
        id: BlockId::AIR,
        meta: 0,
        sky_light: 0,
        block_light: 0,
    };

    pub const fn new(id: BlockId, meta: u8) -> Self {
        Self {
            id,
            meta: meta & 0xF,
            sky_light: 0,
            block_light: 0,
        }
    }

    pub const fn is_air(&self) -> bool {
        self.id.0 == BlockId::AIR.0
    }

    /// The brighter of the two light channels, the value gameplay gates
    /// (crop growth, mushroom spread) test against.
    pub const fn light(&self) -> u8 {
        if self.sky_light > self.block_light {
            self.sky_light
        } else {
            self.block_light
        }
    }
}
