//! TNT: fuse state machine in the metadata nibble.
//!
//! Meta 0 is inert. Ignition (right click, or any adjacent power) arms the
//! fuse; each world tick counts it down, and the tick that hits zero
//! removes the block and queues an explosion for the simulation loop to
//! run after the tick pass.

use cobble_engine::block::{BlockBehavior, ItemStack, Neighbours};
use cobble_engine::geom::Face;
use cobble_engine::level::{Level, LevelEvent};
use cobble_engine::world::cell::Cell;
use cobble_engine::world::position::BlockPos;
use glam::DVec3;

use super::{redstone, AIR, TNT};

/// World ticks between ignition and detonation.
pub const FUSE_TICKS: u8 = 8;

/// Explosion strength handed to the ray caster.
pub const TNT_POWER: f32 = 4.0;

pub fn ignite(level: &mut Level, pos: BlockPos) {
    if level.get_block(pos).is_some_and(|c| c.id == TNT && c.meta == 0) {
        level.set_block(pos, TNT, FUSE_TICKS);
        tracing::debug!("tnt at ({}, {}, {}) ignited", pos.x, pos.y, pos.z);
    }
}

pub struct TntBehavior;

impl BlockBehavior for TntBehavior {
    fn dropped_items(&self, _level: &mut Level, _pos: BlockPos, cell: Cell) -> Vec<ItemStack> {
        // A lit block is already forfeit.
        if cell.meta == 0 {
            vec![ItemStack::of_block(TNT, 1)]
        } else {
            Vec::new()
        }
    }

    fn on_world_tick(
        &self,
        level: &mut Level,
        pos: BlockPos,
        cell: Cell,
        _neighbours: Option<&Neighbours>,
    ) {
        if cell.meta == 0 {
            return;
        }
        if cell.meta > 1 {
            level.set_block(pos, TNT, cell.meta - 1);
            return;
        }
        level.set_block(pos, AIR, 0);
        level.push_event(LevelEvent::Explosion {
            center: DVec3::new(
                pos.x as f64 + 0.5,
                pos.y as f64 + 0.5,
                pos.z as f64 + 0.5,
            ),
            power: TNT_POWER,
        });
    }

    fn on_neighbour_change(&self, level: &mut Level, pos: BlockPos, cell: Cell) {
        if cell.meta == 0 && redstone::powered_near(level, pos) {
            ignite(level, pos);
        }
    }

    fn on_right_click(&self, level: &mut Level, pos: BlockPos, _cell: Cell, _face: Face) -> bool {
        ignite(level, pos);
        true
    }
}
