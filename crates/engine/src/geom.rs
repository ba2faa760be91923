//! Axis-aligned bounding boxes and ray-box intersection.
//!
//! These are pure value transforms; nothing here touches world state. The
//! box convention follows the usual voxel-game one: entity boxes are
//! centered on x/z and anchored at the feet on y.

use glam::DVec3;

/// One of the six cardinal faces of a box or block.
///
/// `North` is -z, `South` is +z, `West` is -x, `East` is +x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    West,
    East,
    Bottom,
    Top,
    North,
    South,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::West,
        Face::East,
        Face::Bottom,
        Face::Top,
        Face::North,
        Face::South,
    ];

    /// Unit offset toward the neighbouring cell on this face.
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Face::West => (-1, 0, 0),
            Face::East => (1, 0, 0),
            Face::Bottom => (0, -1, 0),
            Face::Top => (0, 1, 0),
            Face::North => (0, 0, -1),
            Face::South => (0, 0, 1),
        }
    }

    pub const fn opposite(self) -> Face {
        match self {
            Face::West => Face::East,
            Face::East => Face::West,
            Face::Bottom => Face::Top,
            Face::Top => Face::Bottom,
            Face::North => Face::South,
            Face::South => Face::North,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Face::West => 0,
            Face::East => 1,
            Face::Bottom => 2,
            Face::Top => 3,
            Face::North => 4,
            Face::South => 5,
        }
    }
}

/// Result of a successful [`Aabb::ray_intersect`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// The face of the box the ray entered through.
    pub face: Face,
    /// Ray parameter at entry (`origin + dir * t`).
    pub t: f64,
}

/// Axis-aligned bounding box, the sole collision primitive.
///
/// Invariant: `min <= max` on every axis, maintained by the constructors.
/// Callers must not feed degenerate (zero-extent) boxes into
/// [`Aabb::ray_intersect`]; the slab division produces infinities there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Unit cube spanning the block cell at integer coordinates.
    pub fn block(x: i32, y: i32, z: i32) -> Self {
        let min = DVec3::new(x as f64, y as f64, z as f64);
        Self {
            min,
            max: min + DVec3::ONE,
        }
    }

    /// Box of the given size, centered on x/z and anchored at y = 0.
    /// This is the convention used for entity bodies.
    pub fn sized(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            min: DVec3::new(-sx / 2.0, 0.0, -sz / 2.0),
            max: DVec3::new(sx / 2.0, sy, sz / 2.0),
        }
    }

    /// Box of the given size, fully centered on the origin.
    pub fn sized_centered(sx: f64, sy: f64, sz: f64) -> Self {
        let half = DVec3::new(sx / 2.0, sy / 2.0, sz / 2.0);
        Self {
            min: -half,
            max: half,
        }
    }

    /// Fully centered box shifted by an explicit offset before any world
    /// translation is applied.
    pub fn sized_centered_offset(sx: f64, sy: f64, sz: f64, offset: DVec3) -> Self {
        let half = DVec3::new(sx / 2.0, sy / 2.0, sz / 2.0);
        Self {
            min: offset - half,
            max: offset + half,
        }
    }

    pub fn translated(&self, delta: DVec3) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Grow the box by the given amount on every side.
    pub fn inflated(&self, amount: f64) -> Self {
        Self {
            min: self.min - DVec3::splat(amount),
            max: self.max + DVec3::splat(amount),
        }
    }

    /// Strict overlap test; touching faces do not count as intersecting.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
            && self.min.z < other.max.z
            && other.min.z < self.max.z
    }

    /// Half-open containment: min side inclusive, max side exclusive.
    pub fn contains_point(&self, p: DVec3) -> bool {
        p.x >= self.min.x
            && p.x < self.max.x
            && p.y >= self.min.y
            && p.y < self.max.y
            && p.z >= self.min.z
            && p.z < self.max.z
    }

    /// Slab-method ray intersection.
    ///
    /// Returns the entry parameter and the face struck. The face is resolved
    /// by comparing the winning slab time against the per-axis candidates;
    /// exact ties go to whichever axis is checked first (x, then y, then z).
    pub fn ray_intersect(&self, origin: DVec3, dir: DVec3) -> Option<RayHit> {
        let inv = DVec3::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);

        let tx1 = (self.min.x - origin.x) * inv.x;
        let tx2 = (self.max.x - origin.x) * inv.x;
        let ty1 = (self.min.y - origin.y) * inv.y;
        let ty2 = (self.max.y - origin.y) * inv.y;
        let tz1 = (self.min.z - origin.z) * inv.z;
        let tz2 = (self.max.z - origin.z) * inv.z;

        let t_min = tx1.min(tx2).max(ty1.min(ty2)).max(tz1.min(tz2));
        let t_max = tx1.max(tx2).min(ty1.max(ty2)).min(tz1.max(tz2));

        if t_max < t_min || t_max < 0.0 {
            return None;
        }

        let face = if t_min == tx1 {
            Face::West
        } else if t_min == tx2 {
            Face::East
        } else if t_min == ty1 {
            Face::Bottom
        } else if t_min == ty2 {
            Face::Top
        } else if t_min == tz1 {
            Face::North
        } else {
            Face::South
        };

        Some(RayHit { face, t: t_min })
    }
}
