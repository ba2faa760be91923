//! Server-side voxel simulation core.
//!
//! The engine crate is mechanism only: geometry primitives, the chunked
//! block store, the block registry + behavior dispatch framework, the level
//! write path with its cascading neighbour notification, per-tick dispatch
//! helpers, and the AABB collision engine. Game policy (concrete block
//! behaviors, entities, persistence, the tick loop) lives in the server
//! crate.

pub mod block;
pub mod geom;
pub mod level;
pub mod physics;
pub mod tick;
pub mod world;
