//! Random-tick driven growth and spread: crops, fire, mushrooms, grass.

use cobble_engine::block::BlockBehavior;
use cobble_engine::geom::Aabb;
use cobble_engine::level::Level;
use cobble_engine::world::cell::Cell;
use cobble_engine::world::position::BlockPos;
use rand::Rng;

use super::{AIR, CROPS, DIRT, FIRE, GRASS, MUSHROOM};

/// Crop growth stage lives in the metadata nibble, 0 through 7.
pub const CROP_MATURE: u8 = 7;

/// Minimum light level for crops to advance a stage.
const CROP_LIGHT_MIN: u8 = 9;

/// Mushrooms only spread in darkness below this level.
const MUSHROOM_LIGHT_MAX: u8 = 13;

/// Mushrooms stop spreading once this many already sit in the 9-cell
/// square around the sampled one.
const MUSHROOM_DENSITY_CAP: usize = 2;

pub struct CropsBehavior;

impl BlockBehavior for CropsBehavior {
    fn bounding_boxes(&self, _cell: Cell, _pos: BlockPos, _for_entity: bool, _out: &mut Vec<Aabb>) {}

    fn on_random_tick(&self, level: &mut Level, pos: BlockPos, cell: Cell) {
        if cell.meta < CROP_MATURE && cell.light() >= CROP_LIGHT_MIN {
            level.set_block(pos, CROPS, cell.meta + 1);
        }
    }

    fn on_neighbour_change(&self, level: &mut Level, pos: BlockPos, _cell: Cell) {
        // Crops need tilled soil; dirt stands in for it here.
        let supported = level
            .get_block(pos.below())
            .is_some_and(|c| c.id == DIRT || c.id == GRASS);
        if !supported {
            level.break_block(pos);
        }
    }
}

pub struct FireBehavior;

impl BlockBehavior for FireBehavior {
    fn bounding_boxes(&self, _cell: Cell, _pos: BlockPos, _for_entity: bool, _out: &mut Vec<Aabb>) {}

    fn dropped_items(
        &self,
        _level: &mut Level,
        _pos: BlockPos,
        _cell: Cell,
    ) -> Vec<cobble_engine::block::ItemStack> {
        Vec::new()
    }

    fn on_random_tick(&self, level: &mut Level, pos: BlockPos, _cell: Cell) {
        if level.rng().gen_bool(0.1) {
            level.set_block(pos, AIR, 0);
            return;
        }
        for npos in pos.neighbours() {
            let Some(cell) = level.get_block(npos) else {
                continue;
            };
            if level.registry().def(cell.id).flammable && level.rng().gen_bool(1.0 / 3.0) {
                level.set_block(npos, FIRE, 0);
            }
        }
    }
}

pub struct MushroomBehavior;

impl BlockBehavior for MushroomBehavior {
    fn bounding_boxes(&self, _cell: Cell, _pos: BlockPos, _for_entity: bool, _out: &mut Vec<Aabb>) {}

    fn on_random_tick(&self, level: &mut Level, pos: BlockPos, cell: Cell) {
        if cell.light() >= MUSHROOM_LIGHT_MAX {
            return;
        }

        let mut crowd = 0;
        for dx in -1..=1 {
            for dz in -1..=1 {
                let p = BlockPos::new(pos.x + dx, pos.y, pos.z + dz);
                if level.get_block(p).is_some_and(|c| c.id == MUSHROOM) {
                    crowd += 1;
                }
            }
        }
        if crowd > MUSHROOM_DENSITY_CAP {
            return;
        }

        let targets = pos.horizontal_neighbours();
        let pick = targets[level.rng().gen_range(0..targets.len())];
        let free = level.get_block(pick).is_some_and(|c| c.id == AIR);
        let grounded = level
            .get_block(pick.below())
            .is_some_and(|c| level.registry().def(c.id).material.is_solid());
        if free && grounded {
            level.set_block(pick, MUSHROOM, 0);
        }
    }
}

pub struct GrassBehavior;

impl BlockBehavior for GrassBehavior {
    fn on_random_tick(&self, level: &mut Level, pos: BlockPos, _cell: Cell) {
        // Smothered grass reverts to dirt.
        let covered = level
            .get_block(pos.above())
            .is_some_and(|c| level.registry().def(c.id).opacity >= 15);
        if covered {
            level.set_block(pos, DIRT, 0);
            return;
        }

        // Otherwise creep onto one nearby exposed dirt block.
        let targets = pos.horizontal_neighbours();
        let pick = targets[level.rng().gen_range(0..targets.len())];
        let is_dirt = level.get_block(pick).is_some_and(|c| c.id == DIRT);
        let exposed = level
            .get_block(pick.above())
            .is_some_and(|c| level.registry().def(c.id).opacity == 0);
        if is_dirt && exposed {
            level.set_block(pick, GRASS, 0);
        }
    }
}
