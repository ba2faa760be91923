use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use cobble_engine::level::Level;
use cobble_engine::world::position::ChunkPos;
use cobble_server::blocks;
use cobble_server::blocks::storage::SideTables;
use cobble_server::event_bus::{self, WorldChangeBatch};
use cobble_server::persistence::{self, RegionStore};
use cobble_server::session::SessionRegistry;
use cobble_server::simulation::Simulation;
use cobble_server::worldgen;

#[tokio::main]
async fn main() {
    let world_dir: PathBuf = std::env::args()
        .skip_while(|a| a != "--world")
        .nth(1)
        .unwrap_or_else(|| "world".into())
        .into();
    let seed: u64 = std::env::args()
        .skip_while(|a| a != "--seed")
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let view_radius: i32 = std::env::args()
        .skip_while(|a| a != "--view-radius")
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(8);
    let start_radius: i32 = std::env::args()
        .skip_while(|a| a != "--start-radius")
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(4);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().expect("static filter")),
        )
        .init();

    tracing::info!("cobble -- classic voxel world server");

    // ── Side tables and registry ─────────────────────────────────────────
    let tables = match persistence::load_tables(&world_dir) {
        Ok(Some(t)) => {
            tracing::info!("loaded side tables: {} chests, {} signs", t.chest_count(), t.sign_count());
            t
        }
        Ok(None) => SideTables::default(),
        Err(e) => {
            tracing::error!("failed to load side tables: {:#}", e);
            return;
        }
    };
    let tables = Arc::new(Mutex::new(tables));
    let registry = Arc::new(blocks::standard(Arc::clone(&tables)));

    // ── World: saved chunks first, flat generation for the rest ──────────
    let mut level = Level::with_seed(Arc::clone(&registry), seed);
    let mut regions = RegionStore::new(&world_dir);
    let mut loaded = 0usize;
    let mut generated = 0usize;
    for cx in -start_radius..=start_radius {
        for cz in -start_radius..=start_radius {
            let pos = ChunkPos::new(cx, cz);
            match regions.load_chunk(pos) {
                Ok(Some(chunk)) => {
                    level.insert_chunk(pos, chunk);
                    loaded += 1;
                }
                Ok(None) => {
                    level.insert_chunk(pos, worldgen::flat_chunk());
                    generated += 1;
                }
                Err(e) => {
                    // Corrupt saved data: refuse to continue rather than
                    // regenerate over someone's work.
                    tracing::error!("chunk ({}, {}) unreadable: {:#}", cx, cz, e);
                    return;
                }
            }
        }
    }
    tracing::info!("world ready: {} chunks loaded, {} generated", loaded, generated);

    // ── Shared services ──────────────────────────────────────────────────
    let sessions = Arc::new(SessionRegistry::new());
    let (bus_tx, _) = broadcast::channel::<WorldChangeBatch>(event_bus::BUS_CAPACITY);

    let handle = Simulation::new(
        level,
        regions,
        tables,
        world_dir.clone(),
        Arc::clone(&sessions),
        bus_tx,
        view_radius,
    )
    .start();

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("ctrl-c received, shutting down"),
        Err(e) => tracing::error!("signal listener failed: {}", e),
    }

    tracing::info!("saving world before exit");
    handle.shutdown().await;
    tracing::info!("shutdown complete");
}
