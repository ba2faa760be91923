//! On-disk round trips: region files, incremental saves, the open-handle
//! bound, and the side-table record file.

use std::fs;
use std::sync::{Arc, Mutex};

use cobble_engine::block::ItemStack;
use cobble_engine::level::Level;
use cobble_engine::world::position::{BlockPos, ChunkPos};
use cobble_server::blocks::{self, storage::SideTables, DIRT, STONE};
use cobble_server::persistence::{self, RegionStore, MAX_REGIONS};
use cobble_server::worldgen;

fn test_level() -> Level {
    let tables = Arc::new(Mutex::new(SideTables::default()));
    let registry = Arc::new(blocks::standard(tables));
    Level::with_seed(registry, 1)
}

#[test]
fn chunk_survives_a_save_load_round_trip() {
    let mut level = test_level();
    level.insert_chunk(ChunkPos::new(0, 0), worldgen::flat_chunk());
    level.set_block(BlockPos::new(3, 70, 9), STONE, 0);
    level.set_block(BlockPos::new(4, 70, 9), DIRT, 0);

    let tmp = std::env::temp_dir().join("cobble_test_roundtrip");
    let _ = fs::remove_dir_all(&tmp);
    let mut regions = RegionStore::new(&tmp);

    let pos = ChunkPos::new(0, 0);
    regions
        .save_chunk(pos, level.chunk(pos).expect("chunk present"))
        .unwrap();
    assert!(tmp.join("region/r.0.0.mca").exists());

    let loaded = regions.load_chunk(pos).unwrap().expect("chunk saved");
    assert!(!loaded.is_modified(), "a loaded chunk must start clean");

    let original = level.chunk(pos).expect("chunk present");
    assert_eq!(loaded.ids().as_slice(), original.ids().as_slice());
    assert_eq!(loaded.meta_bytes(), original.meta_bytes());
    assert_eq!(loaded.heightmap_bytes(), original.heightmap_bytes());

    let _ = fs::remove_dir_all(&tmp);
}

#[test]
fn missing_chunk_loads_as_none() {
    let tmp = std::env::temp_dir().join("cobble_test_missing");
    let _ = fs::remove_dir_all(&tmp);
    let mut regions = RegionStore::new(&tmp);

    // No region file at all.
    assert!(regions.load_chunk(ChunkPos::new(5, 5)).unwrap().is_none());

    // Region exists but this slot was never written.
    let mut level = test_level();
    level.insert_chunk(ChunkPos::new(0, 0), worldgen::flat_chunk());
    regions
        .save_chunk(ChunkPos::new(0, 0), level.chunk(ChunkPos::new(0, 0)).unwrap())
        .unwrap();
    assert!(regions.load_chunk(ChunkPos::new(1, 0)).unwrap().is_none());

    let _ = fs::remove_dir_all(&tmp);
}

#[test]
fn save_modified_writes_only_dirty_chunks() {
    let mut level = test_level();
    level.insert_chunk(ChunkPos::new(0, 0), worldgen::flat_chunk());
    level.insert_chunk(ChunkPos::new(1, 0), worldgen::flat_chunk());

    let tmp = std::env::temp_dir().join("cobble_test_incremental");
    let _ = fs::remove_dir_all(&tmp);
    let mut regions = RegionStore::new(&tmp);

    // Both chunks dirty after an edit each.
    level.set_block(BlockPos::new(0, 70, 0), STONE, 0);
    level.set_block(BlockPos::new(16, 70, 0), DIRT, 0);
    assert_eq!(regions.save_modified(&mut level).unwrap(), 2);

    // Nothing dirty now.
    assert_eq!(regions.save_modified(&mut level).unwrap(), 0);

    // Touch one chunk; only it gets rewritten.
    level.set_block(BlockPos::new(1, 70, 0), DIRT, 0);
    assert_eq!(regions.save_modified(&mut level).unwrap(), 1);

    // The untouched chunk is still intact on disk.
    let loaded = regions.load_chunk(ChunkPos::new(1, 0)).unwrap().expect("saved");
    let local = BlockPos::new(16, 70, 0).local();
    assert_eq!(loaded.get(local).id, DIRT);

    let _ = fs::remove_dir_all(&tmp);
}

#[test]
fn open_region_handles_stay_bounded() {
    let mut level = test_level();
    level.insert_chunk(ChunkPos::new(0, 0), worldgen::flat_chunk());
    let chunk = level.chunk(ChunkPos::new(0, 0)).expect("chunk present");

    let tmp = std::env::temp_dir().join("cobble_test_lru");
    let _ = fs::remove_dir_all(&tmp);
    let mut regions = RegionStore::new(&tmp);

    // One chunk per region: 32-chunk stride lands each in its own file.
    for i in 0..(MAX_REGIONS as i32 + 4) {
        regions.save_chunk(ChunkPos::new(i * 32, 0), chunk).unwrap();
        assert!(regions.open_regions() <= MAX_REGIONS);
    }
    assert_eq!(regions.open_regions(), MAX_REGIONS);

    // Evicted regions reopen transparently.
    let reloaded = regions.load_chunk(ChunkPos::new(0, 0)).unwrap();
    assert!(reloaded.is_some());

    let _ = fs::remove_dir_all(&tmp);
}

#[test]
fn side_tables_round_trip_through_the_file() {
    let tmp = std::env::temp_dir().join("cobble_test_tables");
    let _ = fs::remove_dir_all(&tmp);

    assert!(persistence::load_tables(&tmp).unwrap().is_none());

    let mut tables = SideTables::default();
    let chest_pos = BlockPos::new(10, 64, -3);
    assert!(tables.allocate_chest(chest_pos));
    tables.chest_slots_mut(chest_pos).unwrap()[5] = ItemStack::of_block(STONE, 42);
    let sign_pos = BlockPos::new(-7, 65, 12);
    assert!(tables.allocate_sign(sign_pos));
    tables.sign_text_mut(sign_pos).unwrap()[..5].copy_from_slice(b"hello");

    persistence::save_tables(&tmp, &tables).unwrap();

    let mut loaded = persistence::load_tables(&tmp).unwrap().expect("file written");
    assert_eq!(loaded.chest_count(), 1);
    assert_eq!(loaded.sign_count(), 1);
    assert_eq!(
        loaded.chest_slots_mut(chest_pos).unwrap()[5],
        ItemStack::of_block(STONE, 42)
    );
    assert_eq!(&loaded.sign_text_mut(sign_pos).unwrap()[..5], b"hello");

    let _ = fs::remove_dir_all(&tmp);
}
