//! Shared session registry.
//!
//! Tracks connected players outside the simulation thread and broadcasts
//! join/leave/move events so every connection can mirror the others.
//! Backed by a `DashMap`: every operation is brief, access is read-heavy,
//! and sessions come and go on arbitrary tasks.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::broadcast;

/// Information about a connected player, stored in the registry.
#[derive(Clone, Debug)]
pub struct SessionInfo {
    pub session: u64,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
}

/// Lifecycle events broadcast to all connections.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    Joined { session: u64, name: String },
    Left { session: u64 },
    /// A player moved or rotated. Sent at tick frequency per player.
    Moved {
        session: u64,
        x: f64,
        y: f64,
        z: f64,
        yaw: f32,
        pitch: f32,
        on_ground: bool,
    },
}

pub struct SessionRegistry {
    sessions: DashMap<u64, SessionInfo>,
    next_session: AtomicU64,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        // Must absorb per-tick movement events from every player; 512
        // gives ~25 ticks of buffer at 20 players.
        let (event_tx, _) = broadcast::channel(512);
        Self {
            sessions: DashMap::new(),
            next_session: AtomicU64::new(1),
            event_tx,
        }
    }

    pub fn allocate_session(&self) -> u64 {
        self.next_session.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a session and broadcast [`SessionEvent::Joined`].
    pub fn register(&self, info: SessionInfo) {
        let event = SessionEvent::Joined {
            session: info.session,
            name: info.name.clone(),
        };
        self.sessions.insert(info.session, info);
        // Best-effort: no subscribers yet is fine.
        let _ = self.event_tx.send(event);
    }

    pub fn update_position(
        &self,
        session: u64,
        x: f64,
        y: f64,
        z: f64,
        yaw: f32,
        pitch: f32,
        on_ground: bool,
    ) {
        let Some(mut info) = self.sessions.get_mut(&session) else {
            return;
        };
        info.x = x;
        info.y = y;
        info.z = z;
        info.yaw = yaw;
        info.pitch = pitch;
        info.on_ground = on_ground;
        drop(info);
        let _ = self.event_tx.send(SessionEvent::Moved {
            session,
            x,
            y,
            z,
            yaw,
            pitch,
            on_ground,
        });
    }

    pub fn deregister(&self, session: u64) {
        if self.sessions.remove(&session).is_some() {
            let _ = self.event_tx.send(SessionEvent::Left { session });
        }
    }

    pub fn snapshot(&self) -> Vec<SessionInfo> {
        self.sessions.iter().map(|e| e.value().clone()).collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
