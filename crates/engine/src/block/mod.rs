//! Block registry: a fixed 256-entry table of per-type definitions and
//! behavior records.
//!
//! Identity is the array index. The table is populated once at startup and
//! never mutated afterwards; the scheduler and interaction code dispatch
//! through it and never branch on block ids directly.

mod behavior;

pub use behavior::{BlockBehavior, FaceMask, Neighbours};

/// Block type identifier; indexes the registry. 0 is always air.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BlockId(pub u8);

impl BlockId {
    pub const AIR: BlockId = BlockId(0);
}

/// Coarse material class; drives tool effectiveness, flammability defaults
/// and solidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Material {
    Air,
    Rock,
    Soil,
    Sand,
    Wood,
    Plant,
    Glass,
    Metal,
    Water,
    Lava,
    Circuit,
    Cloth,
}

impl Material {
    /// Solid materials get a default full-cube collision box when their
    /// block registers no behavior.
    pub const fn is_solid(self) -> bool {
        !matches!(
            self,
            Material::Air | Material::Plant | Material::Water | Material::Lava | Material::Circuit
        )
    }

    pub const fn is_liquid(self) -> bool {
        matches!(self, Material::Water | Material::Lava)
    }
}

/// A stack of items, as produced by block drops and held in container slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemStack {
    /// Item id; for block items this is the block id.
    pub item: u16,
    pub count: u8,
}

impl ItemStack {
    pub const fn of_block(id: BlockId, count: u8) -> Self {
        Self {
            item: id.0 as u16,
            count,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Immutable per-type definition, one per registered block id.
#[derive(Debug, Clone)]
pub struct BlockDef {
    pub name: &'static str,
    pub material: Material,
    /// Digging hardness; negative means unbreakable (bedrock).
    pub hardness: f32,
    /// Explosion resistance, consumed by the ray walk as `resistance * scale`.
    pub resistance: f32,
    /// Emitted light, 0-15.
    pub luminance: u8,
    /// Light absorbed per cell, 0-15. 0 = fully see-through.
    pub opacity: u8,
    pub transparent: bool,
    pub flammable: bool,
    /// Rendered from both sides (plants, rails); rendering collaborator input.
    pub double_sided: bool,
    /// Placement may overwrite this block (air, fluids, fire).
    pub place_ignore: bool,
    /// Emits binary strong power (lit redstone torch and friends).
    pub power_source: bool,
    /// Capability flags: which event classes this type registers for.
    pub world_tick: bool,
    pub random_tick: bool,
    /// World tick wants the 6-neighbour context gathered up front. An
    /// explicit allow-list, not an automatic cost.
    pub neighbour_context: bool,
    /// Texture tile per face, in `Face::ALL` order.
    pub textures: [u8; 6],
    /// Default drop; `None` leaves drops entirely to the behavior.
    pub drop: Option<ItemStack>,
}

impl BlockDef {
    pub const fn new(name: &'static str, material: Material) -> Self {
        Self {
            name,
            material,
            hardness: 0.0,
            resistance: 0.0,
            luminance: 0,
            opacity: 15,
            transparent: false,
            flammable: false,
            double_sided: false,
            place_ignore: false,
            power_source: false,
            world_tick: false,
            random_tick: false,
            neighbour_context: false,
            textures: [0; 6],
            drop: None,
        }
    }
}

const AIR_DEF: BlockDef = {
    let mut def = BlockDef::new("air", Material::Air);
    def.opacity = 0;
    def.transparent = true;
    def.place_ignore = true;
    def
};

/// The fixed-size block table: definitions plus optional behavior records.
pub struct Registry {
    defs: Vec<Option<BlockDef>>,
    behaviors: Vec<Option<Box<dyn BlockBehavior>>>,
    world_tick_ids: [bool; 256],
}

impl Registry {
    pub fn new() -> Self {
        Self {
            defs: (0..256).map(|_| None).collect(),
            behaviors: (0..256).map(|_| None).collect(),
            world_tick_ids: [false; 256],
        }
    }

    /// Register a block type. Re-registering an id replaces the previous
    /// entry with a warning; the table is meant to be built once.
    pub fn register(
        &mut self,
        id: BlockId,
        def: BlockDef,
        behavior: Option<Box<dyn BlockBehavior>>,
    ) {
        let slot = id.0 as usize;
        if self.defs[slot].is_some() {
            tracing::warn!("block id {} ({}) registered twice", id.0, def.name);
        }
        self.world_tick_ids[slot] = def.world_tick;
        self.defs[slot] = Some(def);
        self.behaviors[slot] = behavior;
    }

    /// Definition for an id. Unregistered ids read as air, per the cell
    /// invariant.
    pub fn def(&self, id: BlockId) -> &BlockDef {
        self.defs[id.0 as usize].as_ref().unwrap_or(&AIR_DEF)
    }

    pub fn behavior(&self, id: BlockId) -> Option<&dyn BlockBehavior> {
        self.behaviors[id.0 as usize].as_deref()
    }

    pub fn is_registered(&self, id: BlockId) -> bool {
        self.defs[id.0 as usize].is_some()
    }

    /// Per-id world-tick membership table for the exhaustive chunk scan.
    pub fn world_tick_ids(&self) -> &[bool; 256] {
        &self.world_tick_ids
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
