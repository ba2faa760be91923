//! Redstone wire and torches.
//!
//! Wire power is a local, single-step relaxation: each world tick a wire
//! cell recomputes its own 0-15 level from its immediate surroundings and
//! writes only on change. A power change therefore travels at most one
//! cell per tick; network-wide convergence emerges from repeated passes,
//! and a converged network produces no further writes.

use cobble_engine::block::{BlockBehavior, BlockId, Neighbours};
use cobble_engine::geom::{Aabb, Face};
use cobble_engine::level::Level;
use cobble_engine::world::cell::Cell;
use cobble_engine::world::position::BlockPos;

use super::{PLATE, REDSTONE_TORCH_OFF, REDSTONE_TORCH_ON, WIRE};

/// Is this cell a binary strong source right now? Definition-driven for
/// torches; pressure plates count only while pressed.
pub fn is_strong_source(level: &Level, cell: Cell) -> bool {
    if level.registry().def(cell.id).power_source {
        return true;
    }
    cell.id == PLATE && cell.meta != 0
}

/// Probe the 6 axis neighbours plus the 4 diagonal-up cells for a strong
/// source. Binary: 15 or nothing, no falloff.
pub fn strong_power(level: &Level, pos: BlockPos) -> bool {
    for npos in pos.neighbours() {
        if let Some(cell) = level.get_block(npos) {
            if is_strong_source(level, cell) {
                return true;
            }
        }
    }
    for npos in pos.horizontal_neighbours() {
        if let Some(cell) = level.get_block(npos.above()) {
            if is_strong_source(level, cell) {
                return true;
            }
        }
    }
    false
}

/// Is any face-adjacent cell delivering power? Used by reactive blocks
/// (doors, TNT) rather than by wire itself.
pub fn powered_near(level: &Level, pos: BlockPos) -> bool {
    for npos in pos.neighbours() {
        if let Some(cell) = level.get_block(npos) {
            if is_strong_source(level, cell) {
                return true;
            }
            if cell.id == WIRE && cell.meta > 0 {
                return true;
            }
        }
    }
    false
}

fn solid_below(level: &Level, pos: BlockPos) -> bool {
    level
        .get_block(pos.below())
        .is_some_and(|c| level.registry().def(c.id).material.is_solid())
}

pub struct WireBehavior;

impl BlockBehavior for WireBehavior {
    fn bounding_boxes(&self, _cell: Cell, _pos: BlockPos, _for_entity: bool, _out: &mut Vec<Aabb>) {
        // Flat overlay, nothing to collide with.
    }

    fn on_world_tick(
        &self,
        level: &mut Level,
        pos: BlockPos,
        cell: Cell,
        neighbours: Option<&Neighbours>,
    ) {
        let desired = if strong_power(level, pos) {
            15
        } else {
            let mut best = 0u8;
            for npos in pos.horizontal_neighbours() {
                if let Some(n) = level.get_block(npos) {
                    if n.id == WIRE {
                        best = best.max(n.meta);
                    }
                }
            }
            best.saturating_sub(1)
        };

        // The gathered context doubles as a support check.
        let supported = neighbours
            .and_then(|n| n.get(Face::Bottom))
            .is_some_and(|c| level.registry().def(c.id).material.is_solid());
        if !supported {
            level.break_block(pos);
            return;
        }

        if desired != cell.meta {
            level.set_block(pos, WIRE, desired);
        }
    }

    fn on_place(&self, level: &mut Level, id: BlockId, pos: BlockPos, _face: Face) -> bool {
        if !solid_below(level, pos) {
            return false;
        }
        level.set_block(pos, id, 0)
    }
}

/// A redstone torch in one of its two states. The torch inverts the power
/// fed into its supporting block: a lit wire running into that block
/// extinguishes the torch, and its removal relights it. State flips swap
/// the block id, which swaps the registered behavior as well.
///
/// The feeding wire is two cells away (diagonal), outside the neighbour
/// cascade's reach, so the torch re-evaluates by polling on the world tick
/// like wire does.
pub struct RedstoneTorchBehavior {
    pub lit: bool,
}

impl RedstoneTorchBehavior {
    fn desired_lit(&self, level: &Level, pos: BlockPos) -> bool {
        let powered = pos
            .below()
            .horizontal_neighbours()
            .into_iter()
            .any(|npos| {
                level
                    .get_block(npos)
                    .is_some_and(|c| c.id == WIRE && c.meta > 0)
            });
        !powered
    }

    fn update(&self, level: &mut Level, pos: BlockPos) {
        if !solid_below(level, pos) {
            level.break_block(pos);
            return;
        }
        let desired = self.desired_lit(level, pos);
        if desired != self.lit {
            let id = if desired { REDSTONE_TORCH_ON } else { REDSTONE_TORCH_OFF };
            level.set_block(pos, id, 0);
        }
    }
}

impl BlockBehavior for RedstoneTorchBehavior {
    fn bounding_boxes(&self, _cell: Cell, _pos: BlockPos, _for_entity: bool, _out: &mut Vec<Aabb>) {}

    fn on_world_tick(
        &self,
        level: &mut Level,
        pos: BlockPos,
        _cell: Cell,
        _neighbours: Option<&Neighbours>,
    ) {
        self.update(level, pos);
    }

    fn on_neighbour_change(&self, level: &mut Level, pos: BlockPos, _cell: Cell) {
        self.update(level, pos);
    }

    fn on_place(&self, level: &mut Level, id: BlockId, pos: BlockPos, _face: Face) -> bool {
        if !solid_below(level, pos) {
            return false;
        }
        level.set_block(pos, id, 0)
    }
}
