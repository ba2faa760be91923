use crate::block::{BlockId, ItemStack};
use crate::geom::{Aabb, Face};
use crate::level::Level;
use crate::world::cell::Cell;
use crate::world::position::BlockPos;

/// 16x16 per-texel face occlusion grid, one row per `u16`. A set bit means
/// the texel is covered; the (external) mesher culls faces whose grid is
/// fully covered by the neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceMask(pub [u16; 16]);

impl FaceMask {
    pub const FULL: FaceMask = FaceMask([u16::MAX; 16]);
    pub const EMPTY: FaceMask = FaceMask([0; 16]);

    /// Covers only the lower `rows` texel rows (slab-like shapes).
    pub const fn lower_rows(rows: usize) -> FaceMask {
        let mut grid = [0u16; 16];
        let mut i = 0;
        while i < rows && i < 16 {
            grid[i] = u16::MAX;
            i += 1;
        }
        FaceMask(grid)
    }

    pub const fn is_full(&self) -> bool {
        let mut i = 0;
        while i < 16 {
            if self.0[i] != u16::MAX {
                return false;
            }
            i += 1;
        }
        true
    }
}

/// Snapshot of the six face-adjacent cells, gathered before a world tick
/// for block types that declare `neighbour_context`.
#[derive(Debug, Clone, Copy)]
pub struct Neighbours {
    cells: [Option<Cell>; 6],
}

impl Neighbours {
    pub fn gather(level: &Level, pos: BlockPos) -> Self {
        let mut cells = [None; 6];
        for face in Face::ALL {
            cells[face.index()] = level.get_block(pos.offset(face));
        }
        Self { cells }
    }

    /// `None` when the neighbour is unloaded or out of range.
    pub fn get(&self, face: Face) -> Option<Cell> {
        self.cells[face.index()]
    }
}

/// Per-block-type behavior record.
///
/// Every method defaults to a no-op (or the definition-driven default), so
/// a block registers only the event classes it cares about -- the
/// "callback absent = no-op" contract. Callbacks receive `&mut Level` and
/// perform their own side effects (world writes, drops, events); the
/// dispatcher's only job is to invoke them.
pub trait BlockBehavior: Send + Sync {
    /// Collision/selection boxes for this cell, appended to `out`.
    ///
    /// May yield zero boxes (fire, fluids), one (the default full cube), or
    /// several (stairs use two for entity collision). `for_entity`
    /// distinguishes entity sweeps from block-placement queries.
    fn bounding_boxes(&self, _cell: Cell, pos: BlockPos, _for_entity: bool, out: &mut Vec<Aabb>) {
        out.push(Aabb::block(pos.x, pos.y, pos.z));
    }

    /// Items dropped when the block is broken, computed at break time.
    /// Side-effecting variants (chest, sign) also release their side-table
    /// slot here.
    fn dropped_items(&self, level: &mut Level, _pos: BlockPos, cell: Cell) -> Vec<ItemStack> {
        level.registry().def(cell.id).drop.into_iter().collect()
    }

    /// Per-texel occlusion toward `face`, given the cell on the other side.
    fn occlusion_mask(&self, _cell: Cell, _face: Face, _neighbour: Cell) -> FaceMask {
        FaceMask::FULL
    }

    /// Sparse sampled event (crop growth, fire spread, mushroom spread).
    fn on_random_tick(&self, _level: &mut Level, _pos: BlockPos, _cell: Cell) {}

    /// Deterministic every-tick state machine. `neighbours` is `Some` only
    /// for types whose definition sets `neighbour_context`.
    fn on_world_tick(
        &self,
        _level: &mut Level,
        _pos: BlockPos,
        _cell: Cell,
        _neighbours: Option<&Neighbours>,
    ) {
    }

    /// Fired after any write to one of the six face-adjacent cells.
    fn on_neighbour_change(&self, _level: &mut Level, _pos: BlockPos, _cell: Cell) {}

    /// Player interaction. Returns false when nothing happened, in which
    /// case the caller falls through to item placement.
    fn on_right_click(&self, _level: &mut Level, _pos: BlockPos, _cell: Cell, _face: Face) -> bool {
        false
    }

    /// Placement-time validation and world write. `pos` is the target cell,
    /// `face` the face of the clicked block. Returns false (without
    /// mutating anything) when placement is invalid; the caller then keeps
    /// the item.
    fn on_place(&self, level: &mut Level, id: BlockId, pos: BlockPos, _face: Face) -> bool {
        level.set_block(pos, id, 0)
    }
}

/// Behavior record carrying nothing but the defaults; used for plain solid
/// blocks that only need definition-driven drops and a full cube.
pub struct DefaultBehavior;

impl BlockBehavior for DefaultBehavior {}
