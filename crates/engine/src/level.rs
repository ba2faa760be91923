//! The level: chunk store plus registry, lighting, RNG and the event queue,
//! exposing the gameplay-visible read/write path.
//!
//! Every write goes through [`Level::set_block`], which marks the chunk
//! dirty, refreshes the heightmap, hands the cell to the lighting
//! collaborator, records a [`LevelEvent`], and then synchronously notifies
//! all six face-adjacent cells. Neighbour callbacks may write again; the
//! cascade recurses, bounded by world connectivity.

use std::sync::Arc;

use glam::DVec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::block::{BlockId, ItemStack, Registry};
use crate::geom::Aabb;
use crate::world::cell::Cell;
use crate::world::chunk::{Chunk, CHUNK_HEIGHT};
use crate::world::position::{BlockPos, ChunkPos, LocalPos};
use crate::world::ChunkStore;

/// Side effects the simulation loop drains once per tick (the swap-events
/// pattern): client notification, item drops, explosion effects.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelEvent {
    BlockChanged { pos: BlockPos, cell: Cell },
    Drop { pos: BlockPos, stack: ItemStack },
    Explosion { center: DVec3, power: f32 },
}

/// Lighting collaborator, invoked by the level on every block write. The
/// propagation algorithm is out of scope here; implementations only get
/// the store and the registry.
pub trait Lighting: Send + Sync {
    fn block_changed(&mut self, registry: &Registry, store: &mut ChunkStore, pos: BlockPos);
}

/// No-op lighting, for tests and headless tools.
pub struct NoLighting;

impl Lighting for NoLighting {
    fn block_changed(&mut self, _registry: &Registry, _store: &mut ChunkStore, _pos: BlockPos) {}
}

/// Heightmap-driven column lighting: full sky light above the highest
/// opaque block, darkness below, block light from the cell's luminance.
pub struct HeightmapLighting;

impl Lighting for HeightmapLighting {
    fn block_changed(&mut self, registry: &Registry, store: &mut ChunkStore, pos: BlockPos) {
        let Some(chunk) = store.chunk_mut(pos.chunk()) else {
            return;
        };
        let local = pos.local();
        let height = chunk.height(local.x, local.z);
        for y in 0..CHUNK_HEIGHT as u8 {
            let p = LocalPos {
                x: local.x,
                y,
                z: local.z,
            };
            chunk.set_sky_light(p, if y >= height { 15 } else { 0 });
        }
        let luminance = registry.def(chunk.get(local).id).luminance;
        chunk.set_block_light(local, luminance);
    }
}

pub struct Level {
    store: ChunkStore,
    registry: Arc<Registry>,
    lighting: Box<dyn Lighting>,
    rng: StdRng,
    events: Vec<LevelEvent>,
    /// Bounding boxes of live entities, refreshed by the simulation loop
    /// before block ticks so pressure plates can poll presence.
    actor_boxes: Vec<Aabb>,
    time: u64,
}

impl Level {
    pub fn new(registry: Arc<Registry>, lighting: Box<dyn Lighting>, rng: StdRng) -> Self {
        Self {
            store: ChunkStore::new(),
            registry,
            lighting,
            rng,
            events: Vec::new(),
            actor_boxes: Vec::new(),
            time: 0,
        }
    }

    /// Level with heightmap lighting and a seeded generator; the usual
    /// server construction.
    pub fn with_seed(registry: Arc<Registry>, seed: u64) -> Self {
        Self::new(registry, Box::new(HeightmapLighting), StdRng::seed_from_u64(seed))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_arc(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn advance_time(&mut self) {
        self.time += 1;
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Read a cell. `None` when y is out of range or the chunk is not
    /// loaded -- callers branch on absence, never assume air.
    pub fn get_block(&self, pos: BlockPos) -> Option<Cell> {
        self.store.get(pos)
    }

    pub fn is_loaded(&self, pos: ChunkPos) -> bool {
        self.store.is_loaded(pos)
    }

    pub fn loaded_chunks(&self) -> Vec<ChunkPos> {
        self.store.positions()
    }

    pub fn furthest_chunk(&self, from: ChunkPos) -> Option<ChunkPos> {
        self.store.furthest_chunk(from)
    }

    // ── Write path ───────────────────────────────────────────────────────

    /// Write a cell and run the full write pipeline: dirty mark, heightmap,
    /// lighting, change event, then unconditional synchronous neighbour
    /// notification of the 6 face-adjacent cells. Returns false (writing
    /// nothing) when the target is out of range or unloaded.
    pub fn set_block(&mut self, pos: BlockPos, id: BlockId, meta: u8) -> bool {
        if !self.store.set(pos, id, meta) {
            return false;
        }
        self.update_heightmap(pos);

        let registry = Arc::clone(&self.registry);
        self.lighting
            .block_changed(&registry, &mut self.store, pos);

        if let Some(cell) = self.store.get(pos) {
            self.events.push(LevelEvent::BlockChanged { pos, cell });
        }

        for npos in pos.neighbours() {
            let Some(ncell) = self.store.get(npos) else {
                continue;
            };
            if let Some(behavior) = registry.behavior(ncell.id) {
                behavior.on_neighbour_change(self, npos, ncell);
            }
        }
        true
    }

    /// Break a block: compute drops through the behavior table, clear the
    /// cell, queue drop events. Returns false when there is nothing to
    /// break.
    pub fn break_block(&mut self, pos: BlockPos) -> bool {
        let Some(cell) = self.get_block(pos) else {
            return false;
        };
        if cell.is_air() {
            return false;
        }

        let registry = Arc::clone(&self.registry);
        let drops = match registry.behavior(cell.id) {
            Some(behavior) => behavior.dropped_items(self, pos, cell),
            None => registry.def(cell.id).drop.into_iter().collect(),
        };

        self.set_block(pos, BlockId::AIR, 0);
        for stack in drops {
            self.events.push(LevelEvent::Drop { pos, stack });
        }
        true
    }

    pub fn push_event(&mut self, event: LevelEvent) {
        self.events.push(event);
    }

    /// Drain accumulated side effects. The simulation loop calls this once
    /// per tick and fans the batch out to clients and entity spawning.
    pub fn take_events(&mut self) -> Vec<LevelEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Chunk lifecycle ──────────────────────────────────────────────────

    /// Insert a freshly generated or loaded chunk and rebuild its heightmap
    /// from block opacities.
    pub fn insert_chunk(&mut self, pos: ChunkPos, mut chunk: Chunk) {
        let registry = Arc::clone(&self.registry);
        for x in 0..16u8 {
            for z in 0..16u8 {
                let mut height = 0u8;
                for y in (0..CHUNK_HEIGHT as u8).rev() {
                    let cell = chunk.get(LocalPos { x, y, z });
                    if registry.def(cell.id).opacity > 0 {
                        height = y + 1;
                        break;
                    }
                }
                chunk.set_height(x, z, height);
            }
        }
        self.store.insert_chunk(pos, chunk);
        tracing::debug!("chunk ({}, {}) loaded", pos.x, pos.z);
    }

    /// Remove a chunk, returning it for persistence.
    pub fn remove_chunk(&mut self, pos: ChunkPos) -> Option<Chunk> {
        let chunk = self.store.remove_chunk(pos);
        if chunk.is_some() {
            tracing::debug!("chunk ({}, {}) unloaded", pos.x, pos.z);
        }
        chunk
    }

    pub fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.store.chunk(pos)
    }

    pub fn chunk_mut(&mut self, pos: ChunkPos) -> Option<&mut Chunk> {
        self.store.chunk_mut(pos)
    }

    // ── Actor snapshot ───────────────────────────────────────────────────

    pub fn set_actor_boxes(&mut self, boxes: Vec<Aabb>) {
        self.actor_boxes = boxes;
    }

    pub fn actor_boxes(&self) -> &[Aabb] {
        &self.actor_boxes
    }

    fn update_heightmap(&mut self, pos: BlockPos) {
        let registry = Arc::clone(&self.registry);
        let local = pos.local();
        let Some(chunk) = self.store.chunk_mut(pos.chunk()) else {
            return;
        };
        let mut height = 0u8;
        for y in (0..CHUNK_HEIGHT as u8).rev() {
            let cell = chunk.get(LocalPos {
                x: local.x,
                y,
                z: local.z,
            });
            if registry.def(cell.id).opacity > 0 {
                height = y + 1;
                break;
            }
        }
        chunk.set_height(local.x, local.z, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockBehavior, BlockDef, Material};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const STONE: BlockId = BlockId(1);
    const WATCHER: BlockId = BlockId(2);

    static NOTIFIED: AtomicUsize = AtomicUsize::new(0);

    struct Watcher;

    impl BlockBehavior for Watcher {
        fn on_neighbour_change(&self, _level: &mut Level, _pos: BlockPos, _cell: Cell) {
            NOTIFIED.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn test_level() -> Level {
        let mut registry = Registry::new();
        let mut stone = BlockDef::new("stone", Material::Rock);
        stone.hardness = 1.5;
        registry.register(STONE, stone, None);
        registry.register(
            WATCHER,
            BlockDef::new("watcher", Material::Rock),
            Some(Box::new(Watcher)),
        );

        let mut level = Level::new(
            Arc::new(registry),
            Box::new(NoLighting),
            StdRng::seed_from_u64(1),
        );
        level.insert_chunk(ChunkPos::new(0, 0), Chunk::new());
        level
    }

    #[test]
    fn set_block_round_trips() {
        let mut level = test_level();
        let pos = BlockPos::new(4, 60, 4);
        assert!(level.set_block(pos, STONE, 3));
        let cell = level.get_block(pos).expect("loaded");
        assert_eq!(cell.id, STONE);
        assert_eq!(cell.meta, 3);
    }

    #[test]
    fn set_block_outside_loaded_chunks_is_refused() {
        let mut level = test_level();
        assert!(!level.set_block(BlockPos::new(100, 60, 100), STONE, 0));
        assert!(level.get_block(BlockPos::new(100, 60, 100)).is_none());
    }

    #[test]
    fn write_notifies_face_adjacent_behaviors() {
        let mut level = test_level();
        level.set_block(BlockPos::new(5, 60, 5), WATCHER, 0);
        NOTIFIED.store(0, Ordering::SeqCst);

        // Writing next to the watcher fires its callback exactly once.
        level.set_block(BlockPos::new(6, 60, 5), STONE, 0);
        assert_eq!(NOTIFIED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn heightmap_follows_highest_opaque_block() {
        let mut level = test_level();
        level.set_block(BlockPos::new(2, 70, 2), STONE, 0);
        let chunk = level.chunk(ChunkPos::new(0, 0)).expect("loaded");
        assert_eq!(chunk.height(2, 2), 71);

        level.set_block(BlockPos::new(2, 70, 2), BlockId::AIR, 0);
        let chunk = level.chunk(ChunkPos::new(0, 0)).expect("loaded");
        assert_eq!(chunk.height(2, 2), 0);
    }

    #[test]
    fn break_block_emits_drop_event() {
        let mut level = test_level();
        let pos = BlockPos::new(3, 40, 3);
        level.set_block(pos, STONE, 0);
        level.take_events();

        // No drop configured for stone in this registry, so only the
        // change event shows up.
        assert!(level.break_block(pos));
        let events = level.take_events();
        assert!(matches!(
            events[0],
            LevelEvent::BlockChanged { cell, .. } if cell.is_air()
        ));
    }
}
