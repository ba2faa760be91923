//! Player-facing mechanisms: doors, pressure plates, stairs.

use cobble_engine::block::{BlockBehavior, BlockId, FaceMask, ItemStack};
use cobble_engine::geom::{Aabb, Face};
use glam::DVec3;
use cobble_engine::level::Level;
use cobble_engine::world::cell::Cell;
use cobble_engine::world::position::BlockPos;

use super::{redstone, DOOR, PLATE};

// Door metadata bits.
const DOOR_OPEN: u8 = 0x1;
const DOOR_POWERED: u8 = 0x2;
const DOOR_UPPER: u8 = 0x8;

/// A two-cell door. The open and powered flags live in the lower half's
/// metadata and are mirrored into the upper half on every transition.
pub struct DoorBehavior;

impl DoorBehavior {
    fn lower(pos: BlockPos, cell: Cell) -> BlockPos {
        if cell.meta & DOOR_UPPER != 0 {
            pos.below()
        } else {
            pos
        }
    }

    fn write_both(level: &mut Level, lower: BlockPos, meta: u8) {
        level.set_block(lower, DOOR, meta & !DOOR_UPPER);
        level.set_block(lower.above(), DOOR, meta | DOOR_UPPER);
    }
}

impl BlockBehavior for DoorBehavior {
    fn bounding_boxes(&self, cell: Cell, pos: BlockPos, _for_entity: bool, out: &mut Vec<Aabb>) {
        if cell.meta & DOOR_OPEN == 0 {
            out.push(Aabb::block(pos.x, pos.y, pos.z));
        }
    }

    fn dropped_items(&self, level: &mut Level, pos: BlockPos, cell: Cell) -> Vec<ItemStack> {
        // Breaking either half removes the other; only the lower one drops.
        let other = if cell.meta & DOOR_UPPER != 0 {
            pos.below()
        } else {
            pos.above()
        };
        if level.get_block(other).is_some_and(|c| c.id == DOOR) {
            level.set_block(other, BlockId::AIR, 0);
        }
        if cell.meta & DOOR_UPPER == 0 {
            vec![ItemStack::of_block(DOOR, 1)]
        } else {
            Vec::new()
        }
    }

    fn on_neighbour_change(&self, level: &mut Level, pos: BlockPos, cell: Cell) {
        let lower = Self::lower(pos, cell);
        let Some(lower_cell) = level.get_block(lower) else {
            return;
        };
        if lower_cell.id != DOOR {
            return;
        }

        // React to power transitions only, so a hand-toggled door is not
        // snapped back by the resulting neighbour writes.
        let powered = redstone::powered_near(level, lower)
            || redstone::powered_near(level, lower.above());
        let was_powered = lower_cell.meta & DOOR_POWERED != 0;
        if powered != was_powered {
            let mut meta = lower_cell.meta & !(DOOR_POWERED | DOOR_OPEN);
            if powered {
                meta |= DOOR_POWERED | DOOR_OPEN;
            }
            Self::write_both(level, lower, meta);
        }
    }

    fn on_right_click(&self, level: &mut Level, pos: BlockPos, cell: Cell, _face: Face) -> bool {
        let lower = Self::lower(pos, cell);
        if let Some(lower_cell) = level.get_block(lower) {
            if lower_cell.id == DOOR {
                Self::write_both(level, lower, lower_cell.meta ^ DOOR_OPEN);
                return true;
            }
        }
        false
    }

    fn on_place(&self, level: &mut Level, _id: BlockId, pos: BlockPos, _face: Face) -> bool {
        let both_free = [pos, pos.above()].into_iter().all(|p| {
            level
                .get_block(p)
                .is_some_and(|c| level.registry().def(c.id).place_ignore)
        });
        let grounded = level
            .get_block(pos.below())
            .is_some_and(|c| level.registry().def(c.id).material.is_solid());
        if !both_free || !grounded {
            return false;
        }
        Self::write_both(level, pos, 0);
        true
    }
}

/// Pressure plate: polls the entity box snapshot every world tick and
/// mirrors presence into its metadata. The write itself is what notifies
/// adjacent reactive blocks; wires read the pressed state on their own
/// tick.
pub struct PlateBehavior;

impl PlateBehavior {
    fn detection_box(pos: BlockPos) -> Aabb {
        let (x, y, z) = (pos.x as f64, pos.y as f64, pos.z as f64);
        Aabb::new(
            DVec3::new(x + 0.0625, y, z + 0.0625),
            DVec3::new(x + 0.9375, y + 0.25, z + 0.9375),
        )
    }
}

impl BlockBehavior for PlateBehavior {
    fn bounding_boxes(&self, _cell: Cell, _pos: BlockPos, _for_entity: bool, _out: &mut Vec<Aabb>) {}

    fn occlusion_mask(&self, _cell: Cell, _face: Face, _neighbour: Cell) -> FaceMask {
        // Too thin to cover anything.
        FaceMask::EMPTY
    }

    fn on_world_tick(
        &self,
        level: &mut Level,
        pos: BlockPos,
        cell: Cell,
        _neighbours: Option<&cobble_engine::block::Neighbours>,
    ) {
        let detect = Self::detection_box(pos);
        let pressed = level.actor_boxes().iter().any(|b| b.intersects(&detect));
        let was_pressed = cell.meta != 0;
        if pressed != was_pressed {
            level.set_block(pos, PLATE, pressed as u8);
        }
    }

    fn on_neighbour_change(&self, level: &mut Level, pos: BlockPos, _cell: Cell) {
        let grounded = level
            .get_block(pos.below())
            .is_some_and(|c| level.registry().def(c.id).material.is_solid());
        if !grounded {
            level.break_block(pos);
        }
    }

    fn on_place(&self, level: &mut Level, id: BlockId, pos: BlockPos, _face: Face) -> bool {
        let grounded = level
            .get_block(pos.below())
            .is_some_and(|c| level.registry().def(c.id).material.is_solid());
        if !grounded {
            return false;
        }
        level.set_block(pos, id, 0)
    }
}

/// Stairs: a full cube for placement queries, two half-height boxes for
/// entity collision. Metadata 0-3 picks which side carries the upper step
/// (east, west, south, north).
pub struct StairsBehavior;

impl BlockBehavior for StairsBehavior {
    fn bounding_boxes(&self, cell: Cell, pos: BlockPos, for_entity: bool, out: &mut Vec<Aabb>) {
        let base = Aabb::block(pos.x, pos.y, pos.z);
        if !for_entity {
            out.push(base);
            return;
        }

        let (x, y, z) = (pos.x as f64, pos.y as f64, pos.z as f64);
        out.push(Aabb::new(
            DVec3::new(x, y, z),
            DVec3::new(x + 1.0, y + 0.5, z + 1.0),
        ));
        out.push(match cell.meta & 0x3 {
            0 => Aabb::new(
                DVec3::new(x + 0.5, y + 0.5, z),
                DVec3::new(x + 1.0, y + 1.0, z + 1.0),
            ),
            1 => Aabb::new(
                DVec3::new(x, y + 0.5, z),
                DVec3::new(x + 0.5, y + 1.0, z + 1.0),
            ),
            2 => Aabb::new(
                DVec3::new(x, y + 0.5, z + 0.5),
                DVec3::new(x + 1.0, y + 1.0, z + 1.0),
            ),
            _ => Aabb::new(
                DVec3::new(x, y + 0.5, z),
                DVec3::new(x + 1.0, y + 1.0, z + 0.5),
            ),
        });
    }

    fn occlusion_mask(&self, cell: Cell, face: Face, _neighbour: Cell) -> FaceMask {
        let raised = match cell.meta & 0x3 {
            0 => Face::East,
            1 => Face::West,
            2 => Face::South,
            _ => Face::North,
        };
        match face {
            Face::Bottom => FaceMask::FULL,
            Face::Top => FaceMask::EMPTY,
            f if f == raised => FaceMask::FULL,
            // The base slab covers the lower half of the other sides.
            _ => FaceMask::lower_rows(8),
        }
    }

    fn on_place(&self, level: &mut Level, id: BlockId, pos: BlockPos, face: Face) -> bool {
        let meta = match face {
            Face::East => 0,
            Face::West => 1,
            Face::South => 2,
            Face::North => 3,
            _ => 0,
        };
        level.set_block(pos, id, meta)
    }
}
