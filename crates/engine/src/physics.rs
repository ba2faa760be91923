//! Entity-vs-world collision: cell sweeps, time-of-impact search, and
//! axis-separated movement resolution.
//!
//! Shared by every movable entity and the camera controller; the only
//! collision primitive is the AABB.

use glam::DVec3;

use crate::geom::Aabb;
use crate::level::Level;
use crate::world::cell::Cell;
use crate::world::position::BlockPos;

/// A movable body: feet-anchored position, velocity, and footprint.
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub pos: DVec3,
    pub vel: DVec3,
    pub width: f64,
    pub height: f64,
    pub on_ground: bool,
}

impl Body {
    pub fn new(pos: DVec3, width: f64, height: f64) -> Self {
        Self {
            pos,
            vel: DVec3::ZERO,
            width,
            height,
            on_ground: false,
        }
    }

    /// World-space box: centered on x/z, anchored at the feet.
    pub fn aabb(&self) -> Aabb {
        Aabb::sized(self.width, self.height, self.width).translated(self.pos)
    }
}

/// Visit every integer cell overlapping the box, over-scanning one cell
/// downward so thin blocks (fences, plates) are not tunnelled through.
/// Unloaded cells are skipped, not treated as air.
pub fn for_each_overlapping_cell(
    level: &Level,
    aabb: &Aabb,
    mut visit: impl FnMut(BlockPos, Cell),
) {
    let x0 = aabb.min.x.floor() as i32;
    let x1 = aabb.max.x.floor() as i32;
    let y0 = aabb.min.y.floor() as i32 - 1;
    let y1 = aabb.max.y.floor() as i32;
    let z0 = aabb.min.z.floor() as i32;
    let z1 = aabb.max.z.floor() as i32;

    for x in x0..=x1 {
        for y in y0..=y1 {
            for z in z0..=z1 {
                let pos = BlockPos::new(x, y, z);
                if let Some(cell) = level.get_block(pos) {
                    visit(pos, cell);
                }
            }
        }
    }
}

/// Collision boxes of all blocks overlapping the query box, through the
/// behavior table. Blocks without a behavior contribute a full cube when
/// their material is solid.
pub fn collect_block_boxes(level: &Level, aabb: &Aabb, for_entity: bool, out: &mut Vec<Aabb>) {
    for_each_overlapping_cell(level, aabb, |pos, cell| {
        if cell.is_air() {
            return;
        }
        match level.registry().behavior(cell.id) {
            Some(behavior) => behavior.bounding_boxes(cell, pos, for_entity, out),
            None => {
                if level.registry().def(cell.id).material.is_solid() {
                    out.push(Aabb::block(pos.x, pos.y, pos.z));
                }
            }
        }
    });
}

/// Does the box overlap any block collision volume?
pub fn collides(level: &Level, aabb: &Aabb) -> bool {
    let mut boxes = Vec::new();
    collect_block_boxes(level, aabb, true, &mut boxes);
    boxes.iter().any(|b| b.intersects(aabb))
}

/// Find the interpolation fraction along `delta` at which `start` first
/// collides, clamping movement exactly to the surface. Returns 1.0 for a
/// free path and 0.0 when already colliding.
///
/// The path is swept in half-block samples before any bisection: testing
/// only the endpoint would let a fast mover whose destination lies beyond
/// an obstacle pass straight through it. The blocked sample interval is
/// then bisected until the unresolved positional span drops below 0.01.
pub fn intersection_threshold(level: &Level, start: &Aabb, delta: DVec3) -> f64 {
    let len = delta.length();
    if len == 0.0 {
        return 1.0;
    }
    if collides(level, start) {
        return 0.0;
    }

    // Half a block per sample: no obstacle is thinner, so a blocked path
    // always produces at least one colliding sample.
    let steps = (len / 0.5).ceil().max(1.0) as usize;
    let mut lo = 0.0;
    let mut hi = 1.0;
    let mut blocked = false;
    for i in 1..=steps {
        let t = i as f64 / steps as f64;
        if collides(level, &start.translated(delta * t)) {
            hi = t;
            blocked = true;
            break;
        }
        lo = t;
    }
    if !blocked {
        return 1.0;
    }

    while (hi - lo) * len > 0.01 {
        let mid = 0.5 * (lo + hi);
        if collides(level, &start.translated(delta * mid)) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    lo
}

/// Move the body by its velocity, resolving each axis independently
/// (x, then y, then z). A blocked axis zeroes that velocity component;
/// the others keep sliding. `on_ground` is set when the downward y step
/// is the one that collides.
pub fn try_move(level: &Level, body: &mut Body) {
    body.on_ground = false;

    let axes = [
        DVec3::new(body.vel.x, 0.0, 0.0),
        DVec3::new(0.0, body.vel.y, 0.0),
        DVec3::new(0.0, 0.0, body.vel.z),
    ];

    for (axis, delta) in axes.into_iter().enumerate() {
        if delta == DVec3::ZERO {
            continue;
        }
        let t = intersection_threshold(level, &body.aabb(), delta);
        body.pos += delta * t;
        if t < 1.0 {
            if axis == 1 && delta.y < 0.0 {
                body.on_ground = true;
            }
            match axis {
                0 => body.vel.x = 0.0,
                1 => body.vel.y = 0.0,
                _ => body.vel.z = 0.0,
            }
        }
    }
}

/// Movement with step assist: when a horizontal axis is blocked while the
/// body stands on the ground, retry the blocked motion from `step_height`
/// up and settle back down. Used for the auto-jump walk helper.
pub fn try_move_stepping(level: &Level, body: &mut Body, step_height: f64) {
    let wanted = DVec3::new(body.vel.x, 0.0, body.vel.z);
    let was_on_ground = body.on_ground;
    let before = body.pos;

    try_move(level, body);

    if !was_on_ground || wanted == DVec3::ZERO {
        return;
    }
    let moved = body.pos - before;
    let horizontally_blocked =
        (moved.x - wanted.x).abs() > 1e-7 || (moved.z - wanted.z).abs() > 1e-7;
    if !horizontally_blocked {
        return;
    }

    // Retry from the original position, lifted by the step height.
    let mut stepped = *body;
    stepped.pos = before;
    stepped.vel = DVec3::new(wanted.x, 0.0, wanted.z);
    let up = intersection_threshold(level, &stepped.aabb(), DVec3::new(0.0, step_height, 0.0));
    stepped.pos.y += step_height * up;
    try_move(level, &mut stepped);
    let down = intersection_threshold(
        level,
        &stepped.aabb(),
        DVec3::new(0.0, -(step_height * up), 0.0),
    );
    stepped.pos.y -= step_height * up * down;
    stepped.on_ground = down < 1.0;

    let flat = |p: DVec3| DVec3::new(p.x, 0.0, p.z);
    if flat(stepped.pos - before).length_squared() > flat(body.pos - before).length_squared() {
        *body = stepped;
    }
}

/// Standard per-tick gravity + drag integration.
pub fn apply_gravity(body: &mut Body, gravity: f64, drag: f64) {
    body.vel.y -= gravity;
    body.vel *= drag;
}

/// Is any cell overlapping the box of the given material predicate? Used
/// for water/lava immersion checks.
pub fn overlaps_matching(level: &Level, aabb: &Aabb, pred: impl Fn(Cell) -> bool) -> bool {
    let mut found = false;
    for_each_overlapping_cell(level, aabb, |pos, cell| {
        if !found && pred(cell) && Aabb::block(pos.x, pos.y, pos.z).intersects(aabb) {
            found = true;
        }
    });
    found
}
