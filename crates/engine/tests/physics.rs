//! Collision engine tests: axis-separated resolution, time-of-impact
//! clamping, and ground detection against a hand-built level.

use std::sync::Arc;

use glam::DVec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use cobble_engine::block::{BlockDef, BlockId, Material, Registry};
use cobble_engine::level::{Level, NoLighting};
use cobble_engine::physics::{self, Body};
use cobble_engine::world::chunk::Chunk;
use cobble_engine::world::position::{BlockPos, ChunkPos};

const STONE: BlockId = BlockId(1);

fn stone_registry() -> Registry {
    let mut registry = Registry::new();
    let mut def = BlockDef::new("stone", Material::Rock);
    def.hardness = 1.5;
    def.resistance = 10.0;
    registry.register(STONE, def, None);
    registry
}

/// Level with a solid stone floor at y = 4 across one chunk.
fn floored_level() -> Level {
    let mut level = Level::new(
        Arc::new(stone_registry()),
        Box::new(NoLighting),
        StdRng::seed_from_u64(42),
    );
    level.insert_chunk(ChunkPos::new(0, 0), Chunk::new());
    for x in 0..16 {
        for z in 0..16 {
            level.set_block(BlockPos::new(x, 4, z), STONE, 0);
        }
    }
    level
}

#[test]
fn falling_body_lands_on_floor() {
    let level = floored_level();
    let mut body = Body::new(DVec3::new(8.0, 8.0, 8.0), 0.6, 1.8);
    body.vel.y = -10.0;

    physics::try_move(&level, &mut body);

    assert!(body.on_ground);
    assert_eq!(body.vel.y, 0.0);
    // Clamped to (just above) the floor surface at y = 5, not the full step.
    assert!(body.pos.y >= 5.0 && body.pos.y < 5.02, "y = {}", body.pos.y);
}

#[test]
fn blocked_corner_slides_along_free_axis() {
    let mut level = floored_level();
    // Wall along +x at x = 9, nothing along +z: a diagonal push into the
    // corner must slide on z and only lose the x component.
    for z in 0..16 {
        for y in 5..8 {
            level.set_block(BlockPos::new(9, y, z), STONE, 0);
        }
    }

    let mut body = Body::new(DVec3::new(8.0, 5.0, 8.0), 0.6, 1.8);
    body.vel = DVec3::new(2.0, 0.0, 2.0);

    physics::try_move(&level, &mut body);

    // x stopped at the wall face (9 - half width), z moved the full step.
    assert_eq!(body.vel.x, 0.0);
    assert!(body.pos.x < 8.71, "x = {}", body.pos.x);
    assert!((body.pos.z - 10.0).abs() < 1e-9, "z = {}", body.pos.z);
    assert_eq!(body.vel.z, 2.0);
}

#[test]
fn free_path_moves_exactly() {
    let level = floored_level();
    let mut body = Body::new(DVec3::new(4.0, 5.0, 4.0), 0.6, 1.8);
    body.vel = DVec3::new(1.5, 0.0, -0.5);

    physics::try_move(&level, &mut body);

    assert_eq!(body.pos, DVec3::new(5.5, 5.0, 3.5));
    assert!(!body.on_ground, "no downward motion, no ground flag");
}

#[test]
fn threshold_clamps_to_surface() {
    let level = floored_level();
    let body = Body::new(DVec3::new(8.0, 8.0, 8.0), 0.6, 1.8);

    let t = physics::intersection_threshold(&level, &body.aabb(), DVec3::new(0.0, -10.0, 0.0));
    // The surface sits 3 units below; t must stop within the 0.01 window.
    let landed = 8.0 - 10.0 * t;
    assert!(landed >= 5.0 && landed < 5.02, "landed = {landed}");
}

#[test]
fn fast_motion_does_not_tunnel_through_walls() {
    let mut level = floored_level();
    for z in 0..16 {
        for y in 5..8 {
            level.set_block(BlockPos::new(9, y, z), STONE, 0);
        }
    }

    // Endpoint lies well past the one-block wall: the sweep must still
    // stop at the near face instead of teleporting across.
    let mut body = Body::new(DVec3::new(8.0, 5.0, 8.0), 0.6, 1.8);
    body.vel = DVec3::new(4.0, 0.0, 0.0);

    physics::try_move(&level, &mut body);

    assert_eq!(body.vel.x, 0.0);
    assert!(body.pos.x < 8.71, "tunneled: x = {}", body.pos.x);
}

#[test]
fn step_assist_climbs_single_block() {
    let mut level = floored_level();
    // One-block ledge in front of the body.
    for z in 0..16 {
        level.set_block(BlockPos::new(9, 5, z), STONE, 0);
    }

    let mut body = Body::new(DVec3::new(8.0, 5.0, 8.0), 0.6, 1.8);
    body.on_ground = true;
    body.vel = DVec3::new(0.8, 0.0, 0.0);

    physics::try_move_stepping(&level, &mut body, 1.0);

    assert!(body.pos.x > 8.7, "stepped forward, x = {}", body.pos.x);
    assert!(body.pos.y > 5.98, "stepped up, y = {}", body.pos.y);
}

#[test]
fn unloaded_chunks_do_not_collide() {
    let level = floored_level();
    // Outside the single loaded chunk: mover passes freely (absence is not
    // treated as solid, nor as air with a floor).
    let mut body = Body::new(DVec3::new(40.0, 5.0, 40.0), 0.6, 1.8);
    body.vel = DVec3::new(0.0, -2.0, 0.0);
    physics::try_move(&level, &mut body);
    assert_eq!(body.pos.y, 3.0);
    assert!(!body.on_ground);
}
