use crate::geom::Face;
use crate::world::chunk::{CHUNK_HEIGHT, CHUNK_WIDTH};

/// Absolute block position in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The chunk column this block belongs to.
    pub const fn chunk(&self) -> ChunkPos {
        ChunkPos {
            x: self.x >> 4,
            z: self.z >> 4,
        }
    }

    /// Position within the chunk. Valid only when `0 <= y < CHUNK_HEIGHT`.
    pub const fn local(&self) -> LocalPos {
        LocalPos {
            x: (self.x & 0xF) as u8,
            y: self.y as u8,
            z: (self.z & 0xF) as u8,
        }
    }

    pub const fn in_height_range(&self) -> bool {
        self.y >= 0 && self.y < CHUNK_HEIGHT as i32
    }

    pub const fn offset(&self, face: Face) -> BlockPos {
        let (dx, dy, dz) = face.offset();
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The six face-adjacent neighbours, in [`Face::ALL`] order.
    pub const fn neighbours(&self) -> [BlockPos; 6] {
        [
            Self::new(self.x - 1, self.y, self.z),
            Self::new(self.x + 1, self.y, self.z),
            Self::new(self.x, self.y - 1, self.z),
            Self::new(self.x, self.y + 1, self.z),
            Self::new(self.x, self.y, self.z - 1),
            Self::new(self.x, self.y, self.z + 1),
        ]
    }

    /// The four horizontal neighbours (±x, ±z).
    pub const fn horizontal_neighbours(&self) -> [BlockPos; 4] {
        [
            Self::new(self.x + 1, self.y, self.z),
            Self::new(self.x - 1, self.y, self.z),
            Self::new(self.x, self.y, self.z + 1),
            Self::new(self.x, self.y, self.z - 1),
        ]
    }

    pub const fn above(&self) -> BlockPos {
        Self::new(self.x, self.y + 1, self.z)
    }

    pub const fn below(&self) -> BlockPos {
        Self::new(self.x, self.y - 1, self.z)
    }
}

/// Chunk column position (each chunk is 16x16 blocks horizontally).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Bijective packed key used by the chunk map and persistence.
    pub const fn key(&self) -> i64 {
        ((self.x as i64) << 32) | (self.z as u32 as i64)
    }

    pub const fn from_key(key: i64) -> Self {
        Self {
            x: (key >> 32) as i32,
            z: key as i32,
        }
    }

    /// Squared Euclidean distance in chunk units.
    pub const fn dist_sq(&self, other: ChunkPos) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dz * dz
    }

    pub const fn block_origin(&self, y: i32) -> BlockPos {
        BlockPos::new(self.x << 4, y, self.z << 4)
    }

    pub const fn region(&self) -> (i32, i32) {
        (self.x >> 5, self.z >> 5)
    }
}

/// Block position local to a chunk (x, z in 0..16, y in 0..CHUNK_HEIGHT).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalPos {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl LocalPos {
    /// Flat array index in x-z-y order (y varies fastest, for cache-friendly
    /// vertical scans).
    pub const fn index(&self) -> usize {
        ((self.x as usize) * CHUNK_WIDTH + self.z as usize) * CHUNK_HEIGHT + self.y as usize
    }

    pub const fn column(&self) -> usize {
        (self.x as usize) * CHUNK_WIDTH + self.z as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_key_is_bijective() {
        for pos in [
            ChunkPos::new(0, 0),
            ChunkPos::new(-1, -1),
            ChunkPos::new(1875060, -1875060),
            ChunkPos::new(i32::MIN >> 4, i32::MAX >> 4),
        ] {
            assert_eq!(ChunkPos::from_key(pos.key()), pos);
        }
    }

    #[test]
    fn negative_coordinates_map_into_chunk() {
        let pos = BlockPos::new(-1, 5, -16);
        assert_eq!(pos.chunk(), ChunkPos::new(-1, -1));
        assert_eq!(pos.local().x, 15);
        assert_eq!(pos.local().z, 0);
    }

    #[test]
    fn neighbours_match_face_order() {
        let pos = BlockPos::new(3, 64, -7);
        for (face, n) in Face::ALL.iter().zip(pos.neighbours()) {
            assert_eq!(pos.offset(*face), n);
        }
    }
}
