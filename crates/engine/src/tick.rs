//! Per-chunk block tick driving: the exhaustive world tick and the sparse
//! sampled random tick.
//!
//! Both passes collect candidate positions first and dispatch afterwards,
//! so callbacks are free to write blocks (and cascade) while the chunk
//! arrays are not borrowed. A candidate whose block changed between
//! collection and dispatch is skipped.

use rand::Rng;

use crate::block::Neighbours;
use crate::level::Level;
use crate::world::chunk::{CHUNK_HEIGHT, CHUNK_WIDTH};
use crate::world::position::{BlockPos, ChunkPos, LocalPos};

/// Cells sampled per loaded chunk per random-tick pass.
pub const RANDOM_TICK_SAMPLES: usize = 80;

/// Run one random-tick pass: for every loaded chunk, draw
/// [`RANDOM_TICK_SAMPLES`] uniform cells and invoke `on_random_tick` where
/// the sampled block registers one.
pub fn random_tick(level: &mut Level) {
    let registry = level.registry_arc();
    let chunks = level.loaded_chunks();

    let mut pending: Vec<BlockPos> = Vec::new();
    for cpos in chunks {
        for _ in 0..RANDOM_TICK_SAMPLES {
            let x = level.rng().gen_range(0..CHUNK_WIDTH as i32);
            let y = level.rng().gen_range(0..CHUNK_HEIGHT as i32);
            let z = level.rng().gen_range(0..CHUNK_WIDTH as i32);
            let origin = cpos.block_origin(0);
            let pos = BlockPos::new(origin.x + x, y, origin.z + z);

            let Some(cell) = level.get_block(pos) else {
                continue;
            };
            if registry.def(cell.id).random_tick {
                pending.push(pos);
            }
        }
    }

    for pos in pending {
        let Some(cell) = level.get_block(pos) else {
            continue;
        };
        if !registry.def(cell.id).random_tick {
            continue; // changed since sampling
        }
        if let Some(behavior) = registry.behavior(cell.id) {
            behavior.on_random_tick(level, pos, cell);
        }
    }
}

/// Run one world-tick pass: every occupied cell whose block registers
/// `on_world_tick` gets invoked, with the 6-neighbour context gathered
/// only for types on the `neighbour_context` allow-list.
pub fn world_tick(level: &mut Level) {
    let registry = level.registry_arc();
    let table = registry.world_tick_ids();

    let mut pending: Vec<BlockPos> = Vec::new();
    for cpos in level.loaded_chunks() {
        let Some(chunk) = level.chunk(cpos) else {
            continue;
        };
        let origin = cpos.block_origin(0);
        let ids = chunk.ids();
        for x in 0..CHUNK_WIDTH as u8 {
            for z in 0..CHUNK_WIDTH as u8 {
                for y in 0..CHUNK_HEIGHT as u8 {
                    let idx = LocalPos { x, y, z }.index();
                    if table[ids[idx] as usize] {
                        pending.push(BlockPos::new(
                            origin.x + x as i32,
                            y as i32,
                            origin.z + z as i32,
                        ));
                    }
                }
            }
        }
    }

    for pos in pending {
        let Some(cell) = level.get_block(pos) else {
            continue;
        };
        let def = registry.def(cell.id);
        if !def.world_tick {
            continue; // changed since the scan
        }
        let neighbours = def
            .neighbour_context
            .then(|| Neighbours::gather(level, pos));
        if let Some(behavior) = registry.behavior(cell.id) {
            behavior.on_world_tick(level, pos, cell, neighbours.as_ref());
        }
    }

    level.advance_time();
}

/// Pick the loaded chunk furthest from `center` that lies strictly outside
/// `radius` (in chunks), if any. The eviction half of the one-load,
/// one-unload-per-tick amortization policy.
pub fn eviction_candidate(level: &Level, center: ChunkPos, radius: i32) -> Option<ChunkPos> {
    let furthest = level.furthest_chunk(center)?;
    let r = radius as i64;
    (furthest.dist_sq(center) > r * r).then_some(furthest)
}

/// Pick the missing in-range chunk nearest to `center`, scanning the view
/// square. The load half of the amortization policy.
pub fn load_candidate(level: &Level, center: ChunkPos, radius: i32) -> Option<ChunkPos> {
    let mut best: Option<(ChunkPos, i64)> = None;
    for dx in -radius..=radius {
        for dz in -radius..=radius {
            let pos = ChunkPos::new(center.x + dx, center.z + dz);
            let d = pos.dist_sq(center);
            if d > (radius as i64) * (radius as i64) || level.is_loaded(pos) {
                continue;
            }
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((pos, d));
            }
        }
    }
    best.map(|(pos, _)| pos)
}
