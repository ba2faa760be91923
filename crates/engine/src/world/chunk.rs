use crate::block::BlockId;
use crate::world::cell::Cell;
use crate::world::position::LocalPos;

/// Blocks along each horizontal axis of a chunk.
pub const CHUNK_WIDTH: usize = 16;
/// Full world height; every chunk is one vertical column.
pub const CHUNK_HEIGHT: usize = 128;
/// Total cell count of a chunk.
pub const CHUNK_VOLUME: usize = CHUNK_WIDTH * CHUNK_WIDTH * CHUNK_HEIGHT;

/// Half-byte array backing metadata and the two light channels.
///
/// Cell `2i` lives in the low nibble of byte `i`, cell `2i + 1` in the high
/// nibble.
#[derive(Clone)]
pub struct NibbleArray {
    data: Box<[u8; CHUNK_VOLUME / 2]>,
}

impl NibbleArray {
    pub fn new() -> Self {
        Self {
            data: Box::new([0; CHUNK_VOLUME / 2]),
        }
    }

    pub fn filled(value: u8) -> Self {
        let v = (value & 0xF) | ((value & 0xF) << 4);
        Self {
            data: Box::new([v; CHUNK_VOLUME / 2]),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let data: Box<[u8; CHUNK_VOLUME / 2]> = bytes.to_vec().into_boxed_slice().try_into().ok()?;
        Some(Self { data })
    }

    #[inline]
    pub fn get(&self, index: usize) -> u8 {
        let byte = self.data[index / 2];
        if index % 2 == 0 {
            byte & 0xF
        } else {
            byte >> 4
        }
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: u8) {
        let byte = &mut self.data[index / 2];
        if index % 2 == 0 {
            *byte = (*byte & 0xF0) | (value & 0xF);
        } else {
            *byte = (*byte & 0x0F) | ((value & 0xF) << 4);
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data[..]
    }
}

impl Default for NibbleArray {
    fn default() -> Self {
        Self::new()
    }
}

/// A 16x16 column of cells spanning the full world height.
///
/// Dense storage: a byte array of block ids plus nibble arrays for metadata
/// and the two light channels, and a per-column heightmap caching the
/// highest opaque block (the sky-light fast path). The `modified` flag
/// marks the chunk dirty for persistence.
pub struct Chunk {
    ids: Box<[u8; CHUNK_VOLUME]>,
    meta: NibbleArray,
    sky_light: NibbleArray,
    block_light: NibbleArray,
    heightmap: [u8; CHUNK_WIDTH * CHUNK_WIDTH],
    modified: bool,
}

impl Chunk {
    pub fn new() -> Self {
        Self {
            ids: Box::new([0; CHUNK_VOLUME]),
            // Empty chunks start fully sky-lit; generation overwrites.
            sky_light: NibbleArray::filled(15),
            meta: NibbleArray::new(),
            block_light: NibbleArray::new(),
            heightmap: [0; CHUNK_WIDTH * CHUNK_WIDTH],
            modified: false,
        }
    }

    /// Reassemble a chunk from persisted parts. Returns `None` when any
    /// array has the wrong length (corrupt payload).
    pub fn from_parts(
        ids: &[u8],
        meta: &[u8],
        sky_light: &[u8],
        block_light: &[u8],
        heightmap: &[u8],
    ) -> Option<Self> {
        let ids: Box<[u8; CHUNK_VOLUME]> = ids.to_vec().into_boxed_slice().try_into().ok()?;
        Some(Self {
            ids,
            meta: NibbleArray::from_bytes(meta)?,
            sky_light: NibbleArray::from_bytes(sky_light)?,
            block_light: NibbleArray::from_bytes(block_light)?,
            heightmap: heightmap.try_into().ok()?,
            modified: false,
        })
    }

    #[inline]
    pub fn get(&self, pos: LocalPos) -> Cell {
        let i = pos.index();
        Cell {
            id: BlockId(self.ids[i]),
            meta: self.meta.get(i),
            sky_light: self.sky_light.get(i),
            block_light: self.block_light.get(i),
        }
    }

    /// Write id + metadata, preserving the light channels, and mark the
    /// chunk modified. Light is owned by the lighting collaborator.
    #[inline]
    pub fn set(&mut self, pos: LocalPos, id: BlockId, meta: u8) {
        let i = pos.index();
        self.ids[i] = id.0;
        self.meta.set(i, meta);
        self.modified = true;
    }

    #[inline]
    pub fn set_meta(&mut self, pos: LocalPos, meta: u8) {
        self.meta.set(pos.index(), meta);
        self.modified = true;
    }

    #[inline]
    pub fn set_sky_light(&mut self, pos: LocalPos, value: u8) {
        self.sky_light.set(pos.index(), value);
    }

    #[inline]
    pub fn set_block_light(&mut self, pos: LocalPos, value: u8) {
        self.block_light.set(pos.index(), value);
    }

    pub fn height(&self, x: u8, z: u8) -> u8 {
        self.heightmap[(x as usize) * CHUNK_WIDTH + z as usize]
    }

    pub fn set_height(&mut self, x: u8, z: u8, height: u8) {
        self.heightmap[(x as usize) * CHUNK_WIDTH + z as usize] = height;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn clear_modified(&mut self) {
        self.modified = false;
    }

    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    // Raw views for persistence and exhaustive tick scans.

    pub fn ids(&self) -> &[u8; CHUNK_VOLUME] {
        &self.ids
    }

    pub fn meta_bytes(&self) -> &[u8] {
        self.meta.bytes()
    }

    pub fn sky_light_bytes(&self) -> &[u8] {
        self.sky_light.bytes()
    }

    pub fn block_light_bytes(&self) -> &[u8] {
        self.block_light.bytes()
    }

    pub fn heightmap_bytes(&self) -> &[u8] {
        &self.heightmap
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nibble_array_packs_pairs() {
        let mut nibbles = NibbleArray::new();
        nibbles.set(0, 0xA);
        nibbles.set(1, 0x5);
        assert_eq!(nibbles.get(0), 0xA);
        assert_eq!(nibbles.get(1), 0x5);
        assert_eq!(nibbles.bytes()[0], 0x5A);

        // Overwriting one half leaves the other intact.
        nibbles.set(0, 0x3);
        assert_eq!(nibbles.get(0), 0x3);
        assert_eq!(nibbles.get(1), 0x5);
    }

    #[test]
    fn nibble_values_are_masked_to_four_bits() {
        let mut nibbles = NibbleArray::new();
        nibbles.set(4, 0xFF);
        assert_eq!(nibbles.get(4), 0xF);
    }

    #[test]
    fn set_preserves_light_channels() {
        let mut chunk = Chunk::new();
        let pos = LocalPos { x: 3, y: 70, z: 9 };
        chunk.set_block_light(pos, 13);
        chunk.set(pos, BlockId(55), 7);

        let cell = chunk.get(pos);
        assert_eq!(cell.id, BlockId(55));
        assert_eq!(cell.meta, 7);
        assert_eq!(cell.block_light, 13);
        assert!(chunk.is_modified());
    }

    #[test]
    fn from_parts_rejects_wrong_lengths() {
        assert!(Chunk::from_parts(&[0; 10], &[], &[], &[], &[]).is_none());
    }
}
