//! Stochastic ray-cast explosions.
//!
//! Destruction happens in two phases: a sampling pass walks a few hundred
//! random rays outward, spending a power budget on step costs and block
//! resistance and probabilistically marking cells, then a batch pass
//! destroys every marked cell exactly once. TNT caught in the blast chains
//! into a fresh queued explosion instead of dropping.

use std::collections::HashSet;

use cobble_engine::level::{Level, LevelEvent};
use cobble_engine::world::position::BlockPos;
use glam::DVec3;
use rand::Rng;

use crate::blocks::{AIR, TNT};

/// Rays sampled per explosion.
const RAY_COUNT: usize = 320;

/// Ray step length in blocks.
const STEP: f64 = 0.3;

/// Budget spent per step regardless of what the ray passes through.
const STEP_COST: f32 = 0.225;

/// Budget multiplier applied to a block's explosion resistance.
const RESISTANCE_SCALE: f32 = 0.12;

/// Run one explosion at `center` with the given power. Returns the number
/// of blocks destroyed.
pub fn explode(level: &mut Level, center: DVec3, power: f32) -> usize {
    let registry = level.registry_arc();
    let mut marked: HashSet<BlockPos> = HashSet::new();

    for _ in 0..RAY_COUNT {
        let dir = random_direction(level);
        // Per-ray jitter so the blast edge is ragged, not spherical.
        let initial = power * (0.7 + level.rng().gen_range(0.0f32..1.0) * 0.6);
        let mut remaining = initial;
        let mut point = center;

        while remaining > 0.0 {
            let pos = BlockPos::new(
                point.x.floor() as i32,
                point.y.floor() as i32,
                point.z.floor() as i32,
            );
            remaining -= STEP_COST;

            if let Some(cell) = level.get_block(pos) {
                if !cell.is_air() {
                    let def = registry.def(cell.id);
                    if def.hardness >= 0.0 {
                        remaining -= def.resistance * RESISTANCE_SCALE;
                        if remaining > 0.0
                            && level.rng().gen_range(0.0f32..1.0) < remaining / initial
                        {
                            marked.insert(pos);
                        }
                    }
                    // Indestructible blocks only eat the step cost.
                }
            }
            point += dir * STEP;
        }
    }

    let destroyed = marked.len();
    for pos in marked {
        let Some(cell) = level.get_block(pos) else {
            continue;
        };
        if cell.is_air() {
            // Already cleared by an earlier cell's cleanup (door halves).
            continue;
        }
        if cell.id == TNT {
            // Chain: no drop, queue a follow-up blast.
            level.set_block(pos, AIR, 0);
            level.push_event(LevelEvent::Explosion {
                center: DVec3::new(
                    pos.x as f64 + 0.5,
                    pos.y as f64 + 0.5,
                    pos.z as f64 + 0.5,
                ),
                power,
            });
            continue;
        }

        // The behavior drop path must run even when the drop roll fails:
        // containers release their side-table slot there, and doors remove
        // their other half. Only the drop spawn itself is gated.
        let drops = match registry.behavior(cell.id) {
            Some(behavior) => behavior.dropped_items(level, pos, cell),
            None => registry.def(cell.id).drop.into_iter().collect(),
        };
        level.set_block(pos, AIR, 0);
        if level.rng().gen_bool(0.33) {
            for stack in drops {
                level.push_event(LevelEvent::Drop { pos, stack });
            }
        }
    }

    if destroyed > 0 {
        tracing::debug!(
            "explosion at ({:.1}, {:.1}, {:.1}) power {} destroyed {} blocks",
            center.x,
            center.y,
            center.z,
            power,
            destroyed
        );
    }
    destroyed
}

/// Uniform random unit vector by rejection sampling the unit ball.
fn random_direction(level: &mut Level) -> DVec3 {
    loop {
        let v = DVec3::new(
            level.rng().gen_range(-1.0..=1.0),
            level.rng().gen_range(-1.0..=1.0),
            level.rng().gen_range(-1.0..=1.0),
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-4 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}
