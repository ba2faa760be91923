//! Water and lava, one parameterized behavior.
//!
//! Metadata is the flow level: 0 is a source, higher values are flowing
//! cells further from one. Each world tick a fluid cell falls before it
//! spreads, spreads one level per step up to the per-kind maximum, and
//! drains back to air when it loses its path to a source.

use cobble_engine::block::{BlockBehavior, BlockId, Neighbours};
use cobble_engine::geom::{Aabb, Face};
use cobble_engine::level::Level;
use cobble_engine::world::cell::Cell;
use cobble_engine::world::position::BlockPos;

use super::{AIR, LAVA, WATER};

pub struct FluidBehavior {
    id: BlockId,
    max_spread: u8,
}

impl FluidBehavior {
    pub fn water() -> Self {
        Self { id: WATER, max_spread: 7 }
    }

    pub fn lava() -> Self {
        Self { id: LAVA, max_spread: 3 }
    }

    /// A flowing cell is supported while it still has a path back toward a
    /// source: the same fluid directly above (falling feed), or a
    /// horizontal neighbour of the same kind with a strictly lower level.
    /// Sources are permanent and always supported.
    fn has_support(&self, level: &Level, pos: BlockPos, flow: u8) -> bool {
        if flow == 0 {
            return true;
        }
        if level.get_block(pos.above()).is_some_and(|c| c.id == self.id) {
            return true;
        }
        pos.horizontal_neighbours().into_iter().any(|npos| {
            level
                .get_block(npos)
                .is_some_and(|c| c.id == self.id && c.meta < flow)
        })
    }
}

impl BlockBehavior for FluidBehavior {
    fn bounding_boxes(&self, _cell: Cell, _pos: BlockPos, _for_entity: bool, _out: &mut Vec<Aabb>) {
        // Fluids never block movement.
    }

    fn on_world_tick(
        &self,
        level: &mut Level,
        pos: BlockPos,
        cell: Cell,
        _neighbours: Option<&Neighbours>,
    ) {
        let flow = cell.meta;

        if !self.has_support(level, pos, flow) {
            level.set_block(pos, AIR, 0);
            return;
        }

        // Falls first; falling fluid restarts at level 1.
        let below = pos.below();
        if level.get_block(below).is_some_and(|c| c.id == AIR) {
            level.set_block(below, self.id, 1);
            return;
        }

        if flow >= self.max_spread {
            return;
        }
        let next = flow + 1;
        for npos in pos.horizontal_neighbours() {
            if level.get_block(npos).is_some_and(|c| c.id == AIR) {
                level.set_block(npos, self.id, next);
            }
        }
    }
}
