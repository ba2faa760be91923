//! Rail shape inference.
//!
//! A rail's metadata encodes its shape: 0/1 straight (north-south /
//! east-west), 2-5 ascending (east, west, north, south), 6-9 curves
//! (south-east, south-west, north-west, north-east). The shape is derived
//! entirely from neighbouring rails, recomputed on placement and on every
//! neighbour change. Rule order matters: curves win over slopes, slopes
//! over straights, first match wins.

use cobble_engine::block::{BlockBehavior, BlockId};
use cobble_engine::geom::{Aabb, Face};
use cobble_engine::level::Level;
use cobble_engine::world::cell::Cell;
use cobble_engine::world::position::BlockPos;

use super::RAIL;

pub const SHAPE_NS: u8 = 0;
pub const SHAPE_EW: u8 = 1;
pub const SHAPE_ASCEND_EAST: u8 = 2;
pub const SHAPE_ASCEND_WEST: u8 = 3;
pub const SHAPE_ASCEND_NORTH: u8 = 4;
pub const SHAPE_ASCEND_SOUTH: u8 = 5;
pub const SHAPE_CURVE_SE: u8 = 6;
pub const SHAPE_CURVE_SW: u8 = 7;
pub const SHAPE_CURVE_NW: u8 = 8;
pub const SHAPE_CURVE_NE: u8 = 9;

fn rail_at(level: &Level, pos: BlockPos) -> bool {
    level.get_block(pos).is_some_and(|c| c.id == RAIL)
}

/// Is there rail track reachable through this face: same height, one up
/// (they ascend toward us), or one down (we would ascend toward them)?
fn connects(level: &Level, pos: BlockPos, face: Face) -> bool {
    let npos = pos.offset(face);
    rail_at(level, npos) || rail_at(level, npos.above()) || rail_at(level, npos.below())
}

fn ascend_meta(toward: Face) -> u8 {
    match toward {
        Face::East => SHAPE_ASCEND_EAST,
        Face::West => SHAPE_ASCEND_WEST,
        Face::North => SHAPE_ASCEND_NORTH,
        _ => SHAPE_ASCEND_SOUTH,
    }
}

/// Classify this rail cell's shape from its surroundings.
pub fn calc_shape(level: &Level, pos: BlockPos) -> u8 {
    let north = connects(level, pos, Face::North);
    let south = connects(level, pos, Face::South);
    let east = connects(level, pos, Face::East);
    let west = connects(level, pos, Face::West);

    // Corners first.
    if east && south {
        return SHAPE_CURVE_SE;
    }
    if south && west {
        return SHAPE_CURVE_SW;
    }
    if west && north {
        return SHAPE_CURVE_NW;
    }
    if north && east {
        return SHAPE_CURVE_NE;
    }

    // Then slopes: a rail one block up means this one climbs toward it.
    for face in [Face::East, Face::West, Face::North, Face::South] {
        if rail_at(level, pos.offset(face).above()) {
            return ascend_meta(face);
        }
    }

    if east || west {
        return SHAPE_EW;
    }
    SHAPE_NS
}

/// Recompute this rail's shape and, for any neighbouring rail one block
/// down, convert that rail into a slope climbing toward us.
fn recalc(level: &mut Level, pos: BlockPos) {
    let Some(cell) = level.get_block(pos) else {
        return;
    };
    if cell.id != RAIL {
        return;
    }

    let shape = calc_shape(level, pos);
    if shape != cell.meta {
        level.set_block(pos, RAIL, shape);
    }

    for face in [Face::East, Face::West, Face::North, Face::South] {
        let lower = pos.offset(face).below();
        if let Some(c) = level.get_block(lower) {
            if c.id == RAIL {
                let slope = ascend_meta(face.opposite());
                if c.meta != slope {
                    level.set_block(lower, RAIL, slope);
                }
            }
        }
    }
}

pub struct RailBehavior;

impl BlockBehavior for RailBehavior {
    fn bounding_boxes(&self, _cell: Cell, _pos: BlockPos, _for_entity: bool, _out: &mut Vec<Aabb>) {}

    fn on_neighbour_change(&self, level: &mut Level, pos: BlockPos, _cell: Cell) {
        let grounded = level
            .get_block(pos.below())
            .is_some_and(|c| level.registry().def(c.id).material.is_solid());
        if !grounded {
            level.break_block(pos);
            return;
        }
        recalc(level, pos);
    }

    fn on_place(&self, level: &mut Level, id: BlockId, pos: BlockPos, _face: Face) -> bool {
        let grounded = level
            .get_block(pos.below())
            .is_some_and(|c| level.registry().def(c.id).material.is_solid());
        if !grounded {
            return false;
        }
        if !level.set_block(pos, id, SHAPE_NS) {
            return false;
        }
        recalc(level, pos);
        true
    }
}
