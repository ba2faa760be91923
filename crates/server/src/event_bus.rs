//! World-change event bus.
//!
//! The simulation loop drains the level's event queue once per tick and
//! publishes the block changes as one [`WorldChangeBatch`] on a
//! `tokio::sync::broadcast` channel. Each connection subscribes and
//! forwards batches to its client, skipping batches it originated itself.

use std::sync::Arc;

use cobble_engine::level::LevelEvent;
use cobble_engine::world::cell::Cell;
use cobble_engine::world::position::BlockPos;

/// Recommended capacity for the broadcast channel.
/// 256 batches in flight should handle bursty activity without lagging.
pub const BUS_CAPACITY: usize = 256;

/// Identifies where a batch of world changes originated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeSource {
    /// A specific player session.
    Player(u64),
    /// The ambient simulation tick.
    Simulation,
}

/// A batch of block changes from one tick.
///
/// Uses `Arc<[...]>` so cloning per broadcast subscriber is just a
/// refcount bump.
#[derive(Clone, Debug)]
pub struct WorldChangeBatch {
    pub source: ChangeSource,
    pub changes: Arc<[(BlockPos, Cell)]>,
}

/// Extract the block changes from a drained level event batch.
pub fn collect_block_changes(events: &[LevelEvent]) -> Vec<(BlockPos, Cell)> {
    events
        .iter()
        .filter_map(|e| match e {
            LevelEvent::BlockChanged { pos, cell } => Some((*pos, *cell)),
            _ => None,
        })
        .collect()
}
