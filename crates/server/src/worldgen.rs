//! Flat world generation: the baseline terrain chunks the server starts
//! from when no saved chunk exists for a position.

use cobble_engine::world::chunk::{Chunk, CHUNK_WIDTH};
use cobble_engine::world::position::LocalPos;

use crate::blocks;

/// Surface height of the flat world; players spawn one block above.
pub const SURFACE_Y: i32 = 64;

/// One flat chunk: bedrock floor, stone body, dirt cap, grass surface.
pub fn flat_chunk() -> Chunk {
    let mut chunk = Chunk::new();
    for x in 0..CHUNK_WIDTH as u8 {
        for z in 0..CHUNK_WIDTH as u8 {
            chunk.set(LocalPos { x, y: 0, z }, blocks::BEDROCK, 0);
            for y in 1..=58u8 {
                chunk.set(LocalPos { x, y, z }, blocks::STONE, 0);
            }
            for y in 59..=62u8 {
                chunk.set(LocalPos { x, y, z }, blocks::DIRT, 0);
            }
            chunk.set(LocalPos { x, y: 63, z }, blocks::GRASS, 0);
        }
    }
    // Generated chunks are clean until someone edits them.
    chunk.clear_modified();
    chunk
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobble_engine::block::BlockId;

    #[test]
    fn flat_chunk_layers_are_in_order() {
        let chunk = flat_chunk();
        let col = |y| chunk.get(LocalPos { x: 5, y, z: 11 }).id;
        assert_eq!(col(0), blocks::BEDROCK);
        assert_eq!(col(30), blocks::STONE);
        assert_eq!(col(60), blocks::DIRT);
        assert_eq!(col(63), blocks::GRASS);
        assert_eq!(col(64), BlockId::AIR);
        assert!(!chunk.is_modified());
    }
}
