//! Wire relaxation and torch behavior against a live level.

use std::sync::{Arc, Mutex};

use cobble_engine::level::{Level, LevelEvent};
use cobble_engine::tick;
use cobble_engine::world::position::{BlockPos, ChunkPos};
use cobble_server::blocks::{
    self, storage::SideTables, REDSTONE_TORCH_OFF, REDSTONE_TORCH_ON, STONE, WIRE,
};
use cobble_server::worldgen;

fn test_level() -> Level {
    let tables = Arc::new(Mutex::new(SideTables::default()));
    let registry = Arc::new(blocks::standard(tables));
    let mut level = Level::with_seed(registry, 7);
    level.insert_chunk(ChunkPos::new(0, 0), worldgen::flat_chunk());
    level
}

const Y: i32 = 64; // one above the grass surface
const Z: i32 = 4;

fn wire_meta(level: &Level, x: i32) -> u8 {
    let cell = level.get_block(BlockPos::new(x, Y, Z)).expect("loaded");
    assert_eq!(cell.id, WIRE, "expected wire at x = {x}");
    cell.meta
}

/// Torch at x = 12, wire run from x = 11 down to x = 2. The chunk scan
/// dispatches in ascending x, so power walking down-x advances exactly
/// one cell per pass.
fn wire_line(level: &mut Level) {
    level.set_block(BlockPos::new(12, Y, Z), REDSTONE_TORCH_ON, 0);
    for x in 2..=11 {
        level.set_block(BlockPos::new(x, Y, Z), WIRE, 0);
    }
    level.take_events();
}

#[test]
fn relaxation_advances_one_cell_per_pass() {
    let mut level = test_level();
    wire_line(&mut level);

    for _ in 0..3 {
        tick::world_tick(&mut level);
    }
    assert_eq!(wire_meta(&level, 11), 15);
    assert_eq!(wire_meta(&level, 10), 14);
    assert_eq!(wire_meta(&level, 9), 13);
    // The front has only advanced three cells.
    assert_eq!(wire_meta(&level, 8), 0);
    assert_eq!(wire_meta(&level, 2), 0);
}

#[test]
fn converged_network_is_a_fixed_point() {
    let mut level = test_level();
    wire_line(&mut level);

    for _ in 0..10 {
        tick::world_tick(&mut level);
    }
    for (i, x) in (2..=11).rev().enumerate() {
        assert_eq!(wire_meta(&level, x), 15 - i as u8, "wire at x = {x}");
    }

    // Idempotence: converged, a further pass writes nothing.
    level.take_events();
    tick::world_tick(&mut level);
    let changes: Vec<_> = level
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, LevelEvent::BlockChanged { .. }))
        .collect();
    assert!(changes.is_empty(), "unexpected writes: {changes:?}");
}

#[test]
fn removing_the_source_decays_the_line() {
    let mut level = test_level();
    wire_line(&mut level);
    for _ in 0..10 {
        tick::world_tick(&mut level);
    }

    level.break_block(BlockPos::new(12, Y, Z));
    for _ in 0..20 {
        tick::world_tick(&mut level);
    }
    for x in 2..=11 {
        assert_eq!(wire_meta(&level, x), 0, "wire at x = {x} still powered");
    }
}

#[test]
fn torch_extinguishes_when_wire_feeds_its_support() {
    let mut level = test_level();
    // Torch on a stone block; a powered wire run feeds that block.
    level.set_block(BlockPos::new(6, Y, 6), STONE, 0);
    level.set_block(BlockPos::new(6, Y + 1, 6), REDSTONE_TORCH_ON, 0);
    level.set_block(BlockPos::new(9, Y, 6), REDSTONE_TORCH_ON, 0);
    level.set_block(BlockPos::new(7, Y, 6), WIRE, 0);
    level.set_block(BlockPos::new(8, Y, 6), WIRE, 0);
    level.take_events();

    for _ in 0..5 {
        tick::world_tick(&mut level);
    }
    let wire = level.get_block(BlockPos::new(7, Y, 6)).expect("loaded");
    assert!(wire.meta > 0, "feed wire never powered");
    let torch = level.get_block(BlockPos::new(6, Y + 1, 6)).expect("loaded");
    assert_eq!(torch.id, REDSTONE_TORCH_OFF);
}

#[test]
fn unsupported_wire_breaks_on_tick() {
    let mut level = test_level();
    let pos = BlockPos::new(6, 70, 6); // floating, nothing below
    level.set_block(pos, WIRE, 0);

    tick::world_tick(&mut level);
    assert!(level.get_block(pos).expect("loaded").is_air());
}
