//! Server side of the cobble voxel world: the concrete block set, entity
//! state machines, explosions, persistence, and the 50ms simulation loop.
//!
//! The engine crate supplies the mechanism (storage, dispatch, physics);
//! this crate supplies the policy: which blocks exist and what they do.

pub mod blocks;
pub mod entity;
pub mod event_bus;
pub mod explosion;
pub mod persistence;
pub mod session;
pub mod simulation;
pub mod worldgen;
