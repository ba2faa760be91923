//! Chunked block storage.
//!
//! The store is plain data: a map from packed chunk keys to dense chunks.
//! All gameplay-visible writes go through [`crate::level::Level`], which
//! layers lighting, events, and the neighbour-notification cascade on top.

pub mod cell;
pub mod chunk;
pub mod position;

use std::collections::HashMap;

use crate::block::BlockId;
use cell::Cell;
use chunk::Chunk;
use position::{BlockPos, ChunkPos};

/// Mapping from chunk position to chunk, keyed by the bijective packed key.
///
/// A chunk is present iff it is loaded; absence means "ungenerated or
/// unavailable", never air. Every query that can land outside a loaded
/// chunk therefore returns an `Option`.
pub struct ChunkStore {
    chunks: HashMap<i64, Chunk>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self {
            chunks: HashMap::new(),
        }
    }

    pub fn get(&self, pos: BlockPos) -> Option<Cell> {
        if !pos.in_height_range() {
            return None;
        }
        self.chunks
            .get(&pos.chunk().key())
            .map(|chunk| chunk.get(pos.local()))
    }

    /// Raw cell write: id + metadata only, no cascade. Returns false when
    /// the position is out of range or its chunk is not loaded.
    pub fn set(&mut self, pos: BlockPos, id: BlockId, meta: u8) -> bool {
        if !pos.in_height_range() {
            return false;
        }
        match self.chunks.get_mut(&pos.chunk().key()) {
            Some(chunk) => {
                chunk.set(pos.local(), id, meta);
                true
            }
            None => false,
        }
    }

    pub fn is_loaded(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos.key())
    }

    pub fn insert_chunk(&mut self, pos: ChunkPos, chunk: Chunk) {
        self.chunks.insert(pos.key(), chunk);
    }

    pub fn remove_chunk(&mut self, pos: ChunkPos) -> Option<Chunk> {
        self.chunks.remove(&pos.key())
    }

    pub fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos.key())
    }

    pub fn chunk_mut(&mut self, pos: ChunkPos) -> Option<&mut Chunk> {
        self.chunks.get_mut(&pos.key())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn positions(&self) -> Vec<ChunkPos> {
        self.chunks.keys().map(|&k| ChunkPos::from_key(k)).collect()
    }

    /// Positions of chunks marked dirty for persistence.
    pub fn modified_positions(&self) -> Vec<ChunkPos> {
        self.chunks
            .iter()
            .filter(|(_, chunk)| chunk.is_modified())
            .map(|(&k, _)| ChunkPos::from_key(k))
            .collect()
    }

    /// The loaded chunk geometrically furthest from `from` (squared
    /// Euclidean distance), used for view-distance eviction. Ties resolve
    /// to whichever chunk the map iterates first.
    pub fn furthest_chunk(&self, from: ChunkPos) -> Option<ChunkPos> {
        let mut best: Option<(ChunkPos, i64)> = None;
        for &key in self.chunks.keys() {
            let pos = ChunkPos::from_key(key);
            let d = pos.dist_sq(from);
            if best.map_or(true, |(_, bd)| d > bd) {
                best = Some((pos, d));
            }
        }
        best.map(|(pos, _)| pos)
    }
}

impl Default for ChunkStore {
    fn default() -> Self {
        Self::new()
    }
}
