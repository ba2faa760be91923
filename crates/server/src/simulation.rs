//! The 50ms simulation loop.
//!
//! One tokio task owns the level, the entity map, and the region cache.
//! Per tick: drain queued player actions, tick entities, run the random
//! and world tick passes, amortize chunk churn (one load and one unload),
//! then drain the level's side effects — spawning drops, running queued
//! explosions, and publishing block changes to the event bus.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use cobble_engine::block::BlockId;
use cobble_engine::geom::Face;
use cobble_engine::level::{Level, LevelEvent};
use cobble_engine::tick;
use cobble_engine::world::position::{BlockPos, ChunkPos};
use glam::DVec3;
use rand::Rng;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::blocks::storage::SideTables;
use crate::entity::{Entities, Entity, EntityKey, EntityKind};
use crate::event_bus::{self, ChangeSource, WorldChangeBatch};
use crate::explosion;
use crate::persistence::{self, RegionStore};
use crate::session::SessionRegistry;
use crate::worldgen;

/// Simulation cadence.
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Ticks between autosaves (30 seconds).
const AUTOSAVE_TICKS: u64 = 600;

/// Player-intent messages, consumed once per tick from a FIFO.
#[derive(Debug)]
pub enum PlayerAction {
    Join { session: u64, name: String },
    Leave { session: u64 },
    Move { session: u64, dx: f64, dz: f64, jump: bool },
    Dig { session: u64, pos: BlockPos },
    Place { session: u64, pos: BlockPos, face: Face, id: BlockId },
    Interact { session: u64, pos: BlockPos, face: Face },
}

pub struct SimulationHandle {
    pub actions: mpsc::Sender<PlayerAction>,
    shutdown: Option<(oneshot::Sender<()>, oneshot::Receiver<()>)>,
}

impl SimulationHandle {
    /// Ask the simulation to save and stop, waiting for the final save.
    pub async fn shutdown(mut self) {
        if let Some((tx, rx)) = self.shutdown.take() {
            let _ = tx.send(());
            let _ = rx.await;
        }
    }
}

pub struct Simulation {
    level: Level,
    entities: Entities,
    regions: RegionStore,
    tables: Arc<Mutex<SideTables>>,
    world_dir: PathBuf,
    sessions: Arc<SessionRegistry>,
    bus: broadcast::Sender<WorldChangeBatch>,
    view_radius: i32,
    players: HashMap<u64, EntityKey>,
}

impl Simulation {
    pub fn new(
        level: Level,
        regions: RegionStore,
        tables: Arc<Mutex<SideTables>>,
        world_dir: PathBuf,
        sessions: Arc<SessionRegistry>,
        bus: broadcast::Sender<WorldChangeBatch>,
        view_radius: i32,
    ) -> Self {
        Self {
            level,
            entities: Entities::new(),
            regions,
            tables,
            world_dir,
            sessions,
            bus,
            view_radius,
            players: HashMap::new(),
        }
    }

    /// Spawn the simulation task. Returns the action queue plus a
    /// shutdown handle that waits for the final save.
    pub fn start(mut self) -> SimulationHandle {
        let (actions_tx, mut actions_rx) = mpsc::channel::<PlayerAction>(256);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let (done_tx, done_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            // The first tick fires immediately; skip it so startup work
            // does not eat into the first simulation step.
            interval.tick().await;

            tracing::info!(
                "simulation started: {:?} tick, view radius {}",
                TICK_INTERVAL,
                self.view_radius
            );

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = &mut stop_rx => break,
                }

                while let Ok(action) = actions_rx.try_recv() {
                    self.handle_action(action);
                }
                self.step();
            }

            if let Err(e) = self.save_all() {
                tracing::error!("shutdown save failed: {:#}", e);
            }
            let _ = done_tx.send(());
        });

        SimulationHandle {
            actions: actions_tx,
            shutdown: Some((stop_tx, done_rx)),
        }
    }

    /// One full simulation step.
    pub fn step(&mut self) {
        self.level.set_actor_boxes(self.entities.actor_boxes());
        self.entities.tick(&mut self.level);

        tick::random_tick(&mut self.level);
        tick::world_tick(&mut self.level);

        self.amortize_chunks();
        self.drain_events();
        self.publish_positions();

        if self.level.time() % AUTOSAVE_TICKS == 0 {
            if let Err(e) = self.save_all() {
                tracing::error!("autosave failed: {:#}", e);
            }
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    pub fn entities(&self) -> &Entities {
        &self.entities
    }

    fn handle_action(&mut self, action: PlayerAction) {
        match action {
            PlayerAction::Join { session, name } => {
                let spawn = DVec3::new(0.5, worldgen::SURFACE_Y as f64 + 1.0, 0.5);
                let key = self.entities.spawn(Entity::player(spawn, session));
                self.players.insert(session, key);
                tracing::info!("player '{}' joined (session {})", name, session);
            }
            PlayerAction::Leave { session } => {
                if let Some(key) = self.players.remove(&session) {
                    self.entities.remove(key);
                }
                tracing::info!("session {} left", session);
            }
            PlayerAction::Move { session, dx, dz, jump } => {
                if let Some(&key) = self.players.get(&session) {
                    if let Some(entity) = self.entities.get_mut(key) {
                        entity.body.vel.x = dx.clamp(-0.3, 0.3);
                        entity.body.vel.z = dz.clamp(-0.3, 0.3);
                        if jump && entity.body.on_ground {
                            entity.body.vel.y = 0.42;
                        }
                    }
                }
            }
            PlayerAction::Dig { pos, .. } => {
                self.level.break_block(pos);
            }
            PlayerAction::Place { pos, face, id, .. } => {
                place_block(&mut self.level, id, pos, face);
            }
            PlayerAction::Interact { pos, face, .. } => {
                interact(&mut self.level, pos, face);
            }
        }
    }

    /// One load plus one unload per tick, keyed to the view center.
    fn amortize_chunks(&mut self) {
        let center = self.view_center();

        if let Some(pos) = tick::eviction_candidate(&self.level, center, self.view_radius) {
            if let Some(chunk) = self.level.remove_chunk(pos) {
                if chunk.is_modified() {
                    if let Err(e) = self.regions.save_chunk(pos, &chunk) {
                        tracing::error!("saving evicted chunk ({}, {}): {:#}", pos.x, pos.z, e);
                    }
                }
            }
        }

        if let Some(pos) = tick::load_candidate(&self.level, center, self.view_radius) {
            match self.regions.load_chunk(pos) {
                Ok(Some(chunk)) => self.level.insert_chunk(pos, chunk),
                Ok(None) => self.level.insert_chunk(pos, worldgen::flat_chunk()),
                // Corrupt data must not become a blank chunk; leave the
                // slot unloaded and keep the evidence on disk.
                Err(e) => tracing::error!("loading chunk ({}, {}): {:#}", pos.x, pos.z, e),
            }
        }
    }

    fn view_center(&self) -> ChunkPos {
        self.entities
            .iter()
            .find(|(_, e)| matches!(e.kind, EntityKind::Player(_)))
            .map(|(_, e)| {
                BlockPos::new(
                    e.body.pos.x.floor() as i32,
                    0,
                    e.body.pos.z.floor() as i32,
                )
                .chunk()
            })
            .unwrap_or(ChunkPos::new(0, 0))
    }

    /// Drain the level's side effects: spawn item drops, run queued
    /// explosions, publish the change batch.
    fn drain_events(&mut self) {
        let events = self.level.take_events();
        if events.is_empty() {
            return;
        }

        let changes = event_bus::collect_block_changes(&events);
        for event in events {
            match event {
                LevelEvent::BlockChanged { .. } => {}
                LevelEvent::Drop { pos, stack } => {
                    let center = DVec3::new(
                        pos.x as f64 + 0.5,
                        pos.y as f64 + 0.25,
                        pos.z as f64 + 0.5,
                    );
                    let mut entity = Entity::item(center, stack);
                    entity.body.vel = DVec3::new(
                        self.level.rng().gen_range(-0.05..0.05),
                        0.15,
                        self.level.rng().gen_range(-0.05..0.05),
                    );
                    self.entities.spawn(entity);
                }
                LevelEvent::Explosion { center, power } => {
                    // Writes land in the event queue and go out next tick.
                    explosion::explode(&mut self.level, center, power);
                }
            }
        }

        if !changes.is_empty() {
            let _ = self.bus.send(WorldChangeBatch {
                source: ChangeSource::Simulation,
                changes: changes.into(),
            });
        }
    }

    fn publish_positions(&self) {
        for (_, entity) in self.entities.iter() {
            if let EntityKind::Player(state) = &entity.kind {
                self.sessions.update_position(
                    state.session,
                    entity.body.pos.x,
                    entity.body.pos.y,
                    entity.body.pos.z,
                    0.0,
                    0.0,
                    entity.body.on_ground,
                );
            }
        }
    }

    fn save_all(&mut self) -> Result<usize> {
        let written = self.regions.save_modified(&mut self.level)?;
        let tables = self.tables.lock().expect("side tables poisoned");
        persistence::save_tables(&self.world_dir, &tables)?;
        Ok(written)
    }
}

/// Place a block: the target must be replaceable, solid placements must
/// not overlap a live entity, and the block's own placement check runs
/// last. A false return leaves the world untouched and the item unspent.
pub fn place_block(level: &mut Level, id: BlockId, pos: BlockPos, face: Face) -> bool {
    let Some(target) = level.get_block(pos) else {
        return false;
    };
    if !level.registry().def(target.id).place_ignore {
        return false;
    }

    if level.registry().def(id).material.is_solid() {
        let block_box = cobble_engine::geom::Aabb::block(pos.x, pos.y, pos.z);
        if level.actor_boxes().iter().any(|b| b.intersects(&block_box)) {
            return false;
        }
    }

    let registry = level.registry_arc();
    match registry.behavior(id) {
        Some(behavior) => behavior.on_place(level, id, pos, face),
        None => level.set_block(pos, id, 0),
    }
}

/// Right-click dispatch. Returns false when the clicked block did not
/// consume the interaction (the caller then falls through to placement).
pub fn interact(level: &mut Level, pos: BlockPos, face: Face) -> bool {
    let Some(cell) = level.get_block(pos) else {
        return false;
    };
    let registry = level.registry_arc();
    match registry.behavior(cell.id) {
        Some(behavior) => behavior.on_right_click(level, pos, cell, face),
        None => false,
    }
}
