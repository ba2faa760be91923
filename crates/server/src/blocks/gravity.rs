//! Falling blocks (sand, gravel).
//!
//! Placement and neighbour changes both trigger the same check: while the
//! cell below is replaceable, swap downward. Each swap is a normal write,
//! so the notification cascade keeps a whole pillar falling without any
//! per-tick bookkeeping.

use cobble_engine::block::{BlockBehavior, BlockId};
use cobble_engine::geom::Face;
use cobble_engine::level::Level;
use cobble_engine::world::cell::Cell;
use cobble_engine::world::position::BlockPos;

use super::AIR;

fn try_fall(level: &mut Level, pos: BlockPos, cell: Cell) {
    // Scan to the resting cell first; one swap per fall, not per step.
    let mut rest = pos;
    loop {
        let below = rest.below();
        let replaceable = level
            .get_block(below)
            .is_some_and(|c| level.registry().def(c.id).place_ignore);
        if !replaceable {
            break;
        }
        rest = below;
    }
    if rest != pos {
        // Land before clearing the origin: clearing first would let a
        // stacked column above cascade into the still-empty landing cell.
        level.set_block(rest, cell.id, cell.meta);
        level.set_block(pos, AIR, 0);
    }
}

pub struct GravityBehavior;

impl BlockBehavior for GravityBehavior {
    fn on_neighbour_change(&self, level: &mut Level, pos: BlockPos, cell: Cell) {
        try_fall(level, pos, cell);
    }

    fn on_place(&self, level: &mut Level, id: BlockId, pos: BlockPos, _face: Face) -> bool {
        if !level.set_block(pos, id, 0) {
            return false;
        }
        if let Some(cell) = level.get_block(pos) {
            if cell.id == id {
                try_fall(level, pos, cell);
            }
        }
        true
    }
}
