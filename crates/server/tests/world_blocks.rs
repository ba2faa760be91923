//! Concrete block behaviors driven end to end through the tick passes:
//! rails, TNT, fluids, gravity blocks, doors, plates, chests.

use std::sync::{Arc, Mutex};

use cobble_engine::geom::{Aabb, Face};
use cobble_engine::level::{Level, LevelEvent};
use cobble_engine::tick;
use cobble_engine::world::position::{BlockPos, ChunkPos};
use glam::DVec3;
use cobble_server::blocks::{
    self, rail, storage::SideTables, CHEST, DOOR, PLATE, RAIL, REDSTONE_TORCH_ON, SAND, STONE,
    TNT, WATER,
};
use cobble_server::explosion;
use cobble_server::simulation::{interact, place_block};
use cobble_server::worldgen;

fn test_level() -> Level {
    let tables = Arc::new(Mutex::new(SideTables::default()));
    let registry = Arc::new(blocks::standard(tables));
    let mut level = Level::with_seed(registry, 11);
    level.insert_chunk(ChunkPos::new(0, 0), worldgen::flat_chunk());
    level
}

const SURFACE: i32 = worldgen::SURFACE_Y; // first air layer

// ── Rails ────────────────────────────────────────────────────────────────

#[test]
fn lone_rail_is_straight_north_south() {
    let mut level = test_level();
    assert!(place_block(&mut level, RAIL, BlockPos::new(5, SURFACE, 5), Face::Top));
    let cell = level.get_block(BlockPos::new(5, SURFACE, 5)).expect("loaded");
    assert_eq!(cell.meta, rail::SHAPE_NS);
}

#[test]
fn east_west_pair_aligns() {
    let mut level = test_level();
    place_block(&mut level, RAIL, BlockPos::new(5, SURFACE, 5), Face::Top);
    place_block(&mut level, RAIL, BlockPos::new(6, SURFACE, 5), Face::Top);
    for x in [5, 6] {
        let cell = level.get_block(BlockPos::new(x, SURFACE, 5)).expect("loaded");
        assert_eq!(cell.meta, rail::SHAPE_EW, "rail at x = {x}");
    }
}

#[test]
fn corner_becomes_a_curve() {
    let mut level = test_level();
    place_block(&mut level, RAIL, BlockPos::new(6, SURFACE, 5), Face::Top);
    place_block(&mut level, RAIL, BlockPos::new(5, SURFACE, 6), Face::Top);
    place_block(&mut level, RAIL, BlockPos::new(5, SURFACE, 5), Face::Top);
    let cell = level.get_block(BlockPos::new(5, SURFACE, 5)).expect("loaded");
    // Rail to the east, rail to the south: a south-east curve.
    assert_eq!(cell.meta, rail::SHAPE_CURVE_SE);
}

#[test]
fn lower_rail_converts_to_slope() {
    let mut level = test_level();
    place_block(&mut level, RAIL, BlockPos::new(5, SURFACE, 5), Face::Top);
    level.set_block(BlockPos::new(6, SURFACE, 5), STONE, 0);
    place_block(&mut level, RAIL, BlockPos::new(6, SURFACE + 1, 5), Face::Top);

    let lower = level.get_block(BlockPos::new(5, SURFACE, 5)).expect("loaded");
    assert_eq!(lower.meta, rail::SHAPE_ASCEND_EAST);
}

#[test]
fn floating_rail_placement_is_refused() {
    let mut level = test_level();
    assert!(!place_block(&mut level, RAIL, BlockPos::new(5, 80, 5), Face::Top));
    assert!(level.get_block(BlockPos::new(5, 80, 5)).expect("loaded").is_air());
}

// ── TNT ──────────────────────────────────────────────────────────────────

#[test]
fn fuse_counts_down_and_detonates() {
    let mut level = test_level();
    let pos = BlockPos::new(8, 80, 8);
    level.set_block(pos, TNT, 3);
    level.take_events();

    tick::world_tick(&mut level);
    tick::world_tick(&mut level);
    assert_eq!(level.get_block(pos).expect("loaded").meta, 1);

    tick::world_tick(&mut level);
    assert!(level.get_block(pos).expect("loaded").is_air());
    let exploded = level
        .take_events()
        .into_iter()
        .any(|e| matches!(e, LevelEvent::Explosion { .. }));
    assert!(exploded, "detonation did not queue an explosion");
}

#[test]
fn adjacent_power_ignites() {
    let mut level = test_level();
    let pos = BlockPos::new(8, 80, 8);
    level.set_block(pos, TNT, 0);
    level.set_block(BlockPos::new(9, 80, 8), REDSTONE_TORCH_ON, 0);
    let cell = level.get_block(pos).expect("loaded");
    assert_eq!(cell.id, TNT);
    assert!(cell.meta > 0, "fuse not armed");
}

#[test]
fn explosion_in_open_air_is_a_no_op() {
    let mut level = test_level();
    let destroyed = explosion::explode(&mut level, DVec3::new(8.5, 100.5, 8.5), 4.0);
    assert_eq!(destroyed, 0);
    let drops = level
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, LevelEvent::Drop { .. }))
        .count();
    assert_eq!(drops, 0);
}

#[test]
fn explosion_in_sand_destroys_a_bounded_pocket() {
    let mut level = test_level();
    for x in 4..=12 {
        for y in 76..=84 {
            for z in 4..=12 {
                level.set_block(BlockPos::new(x, y, z), SAND, 0);
            }
        }
    }
    // One bedrock cell right next to the center must survive.
    level.set_block(BlockPos::new(9, 80, 8), blocks::BEDROCK, 0);
    level.take_events();

    let destroyed = explosion::explode(&mut level, DVec3::new(8.5, 80.5, 8.5), 4.0);
    assert!(destroyed > 10, "destroyed only {destroyed}");
    assert!(destroyed < 9 * 9 * 9, "destroyed {destroyed}, more than the pocket");
    assert_eq!(
        level.get_block(BlockPos::new(9, 80, 8)).expect("loaded").id,
        blocks::BEDROCK
    );
}

// ── Fluids ───────────────────────────────────────────────────────────────

#[test]
fn water_spreads_and_drains() {
    let mut level = test_level();
    // Platform well above the terrain so spread stays contained.
    for x in 0..16 {
        for z in 0..16 {
            level.set_block(BlockPos::new(x, 79, z), STONE, 0);
        }
    }
    let source = BlockPos::new(8, 80, 8);
    level.set_block(source, WATER, 0);

    for _ in 0..8 {
        tick::world_tick(&mut level);
    }
    for npos in source.horizontal_neighbours() {
        let cell = level.get_block(npos).expect("loaded");
        assert_eq!(cell.id, WATER, "no water at {npos:?}");
        assert_eq!(cell.meta, 1);
    }
    // Two steps out carries level 2.
    assert_eq!(level.get_block(BlockPos::new(10, 80, 8)).expect("loaded").meta, 2);

    // Remove the source; everything flowing must drain.
    level.set_block(source, blocks::AIR, 0);
    for _ in 0..20 {
        tick::world_tick(&mut level);
    }
    for x in 0..16 {
        for z in 0..16 {
            let cell = level.get_block(BlockPos::new(x, 80, z)).expect("loaded");
            assert_ne!(cell.id, WATER, "stale water at ({x}, 80, {z})");
        }
    }
}

#[test]
fn water_falls_before_it_spreads() {
    let mut level = test_level();
    let source = BlockPos::new(8, 82, 8);
    level.set_block(source, WATER, 0);

    tick::world_tick(&mut level);
    // The cell below got fluid; the sides did not.
    assert_eq!(level.get_block(source.below()).expect("loaded").id, WATER);
    for npos in source.horizontal_neighbours() {
        assert!(level.get_block(npos).expect("loaded").is_air());
    }
}

// ── Gravity ──────────────────────────────────────────────────────────────

#[test]
fn sand_falls_to_the_surface() {
    let mut level = test_level();
    let top = BlockPos::new(5, 90, 5);
    assert!(place_block(&mut level, SAND, top, Face::Top));
    assert!(level.get_block(top).expect("loaded").is_air());
    assert_eq!(
        level.get_block(BlockPos::new(5, SURFACE, 5)).expect("loaded").id,
        SAND
    );
}

#[test]
fn sand_pillar_collapses_in_order() {
    let mut level = test_level();
    level.set_block(BlockPos::new(5, SURFACE, 5), SAND, 0);
    level.set_block(BlockPos::new(5, SURFACE + 1, 5), SAND, 0);
    // Dig out the bottom one: the upper block must follow it down.
    level.break_block(BlockPos::new(5, SURFACE, 5));
    assert_eq!(
        level.get_block(BlockPos::new(5, SURFACE, 5)).expect("loaded").id,
        SAND
    );
    assert!(level
        .get_block(BlockPos::new(5, SURFACE + 1, 5))
        .expect("loaded")
        .is_air());
}

// ── Doors and plates ─────────────────────────────────────────────────────

#[test]
fn door_occupies_two_cells_and_toggles() {
    let mut level = test_level();
    let lower = BlockPos::new(6, SURFACE, 6);
    assert!(place_block(&mut level, DOOR, lower, Face::Top));
    assert_eq!(level.get_block(lower).expect("loaded").id, DOOR);
    assert_eq!(level.get_block(lower.above()).expect("loaded").id, DOOR);

    // Closed door blocks; open door does not.
    assert!(interact(&mut level, lower, Face::North));
    assert_ne!(level.get_block(lower).expect("loaded").meta & 0x1, 0);
    assert_ne!(level.get_block(lower.above()).expect("loaded").meta & 0x1, 0);

    // Clicking the upper half toggles it back.
    assert!(interact(&mut level, lower.above(), Face::North));
    assert_eq!(level.get_block(lower).expect("loaded").meta & 0x1, 0);
}

#[test]
fn powered_door_opens() {
    let mut level = test_level();
    let lower = BlockPos::new(6, SURFACE, 6);
    place_block(&mut level, DOOR, lower, Face::Top);
    level.set_block(BlockPos::new(7, SURFACE, 6), REDSTONE_TORCH_ON, 0);
    assert_ne!(level.get_block(lower).expect("loaded").meta & 0x1, 0, "door stayed shut");
}

#[test]
fn plate_mirrors_entity_presence() {
    let mut level = test_level();
    let pos = BlockPos::new(4, SURFACE, 4);
    assert!(place_block(&mut level, PLATE, pos, Face::Top));

    let standing = Aabb::sized(0.6, 1.8, 0.6)
        .translated(DVec3::new(4.5, SURFACE as f64, 4.5));
    level.set_actor_boxes(vec![standing]);
    tick::world_tick(&mut level);
    assert_eq!(level.get_block(pos).expect("loaded").meta, 1);

    level.set_actor_boxes(Vec::new());
    tick::world_tick(&mut level);
    assert_eq!(level.get_block(pos).expect("loaded").meta, 0);
}

// ── Chests ───────────────────────────────────────────────────────────────

#[test]
fn broken_chest_drops_itself_and_contents() {
    let tables = Arc::new(Mutex::new(SideTables::default()));
    let registry = Arc::new(blocks::standard(Arc::clone(&tables)));
    let mut level = Level::with_seed(registry, 3);
    level.insert_chunk(ChunkPos::new(0, 0), worldgen::flat_chunk());

    let pos = BlockPos::new(9, SURFACE, 9);
    assert!(place_block(&mut level, CHEST, pos, Face::Top));
    {
        let mut t = tables.lock().unwrap();
        assert_eq!(t.chest_count(), 1);
        t.chest_slots_mut(pos).unwrap()[0] =
            cobble_engine::block::ItemStack::of_block(STONE, 5);
    }
    level.take_events();

    assert!(level.break_block(pos));
    assert_eq!(tables.lock().unwrap().chest_count(), 0);
    let drops: Vec<_> = level
        .take_events()
        .into_iter()
        .filter_map(|e| match e {
            LevelEvent::Drop { stack, .. } => Some(stack),
            _ => None,
        })
        .collect();
    // The chest block itself plus its one occupied slot.
    assert_eq!(drops.len(), 2);
}

#[test]
fn blast_destroyed_chest_frees_its_slot() {
    let tables = Arc::new(Mutex::new(SideTables::default()));
    let registry = Arc::new(blocks::standard(Arc::clone(&tables)));
    let mut level = Level::with_seed(registry, 5);
    level.insert_chunk(ChunkPos::new(0, 0), worldgen::flat_chunk());

    let pos = BlockPos::new(8, 80, 8);
    assert!(place_block(&mut level, CHEST, pos, Face::Top));
    assert_eq!(tables.lock().unwrap().chest_count(), 1);

    // Blast centered inside the chest cell: destruction is certain.
    explosion::explode(&mut level, DVec3::new(8.5, 80.5, 8.5), 4.0);

    assert!(level.get_block(pos).expect("loaded").is_air());
    assert_eq!(
        tables.lock().unwrap().chest_count(),
        0,
        "destroyed chest kept its side-table slot"
    );
}

#[test]
fn blast_removes_both_door_halves() {
    let mut level = test_level();
    let lower = BlockPos::new(6, SURFACE, 6);
    assert!(place_block(&mut level, DOOR, lower, Face::Top));

    explosion::explode(
        &mut level,
        DVec3::new(6.5, SURFACE as f64 + 0.5, 6.5),
        4.0,
    );

    // Whichever half the blast caught, the other must not survive as an
    // orphan.
    assert_ne!(level.get_block(lower).expect("loaded").id, DOOR);
    assert_ne!(level.get_block(lower.above()).expect("loaded").id, DOOR);
}
