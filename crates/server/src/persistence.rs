//! World persistence: Anvil-style region files for chunks, one flat
//! gzip-compressed record file for the chest/sign side tables.
//!
//! Region file handles are cached in an LRU bounded to [`MAX_REGIONS`]
//! concurrently open files; touching a region moves it to the back, and
//! opening past the bound closes the least-recently-used handle. All
//! access happens from the simulation thread, so the cache needs no
//! locking.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use cobble_engine::level::Level;
use cobble_engine::world::chunk::Chunk;
use cobble_engine::world::position::ChunkPos;

use crate::blocks::storage::SideTables;

/// Maximum concurrently open region file handles.
pub const MAX_REGIONS: usize = 8;

/// Bumped when the chunk NBT layout changes. Newer versions load
/// best-effort with a warning.
const DATA_VERSION: i32 = 1;

const TABLES_FILE: &str = "tables.dat.gz";

// ── Chunk NBT layout ─────────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Debug)]
struct ChunkNbt {
    #[serde(rename = "DataVersion")]
    data_version: i32,
    #[serde(rename = "xPos")]
    x_pos: i32,
    #[serde(rename = "zPos")]
    z_pos: i32,
    blocks: fastnbt::ByteArray,
    metadata: fastnbt::ByteArray,
    sky_light: fastnbt::ByteArray,
    block_light: fastnbt::ByteArray,
    height_map: fastnbt::ByteArray,
}

fn to_i8(bytes: &[u8]) -> Vec<i8> {
    bytes.iter().map(|&b| b as i8).collect()
}

fn to_u8(bytes: &[i8]) -> Vec<u8> {
    bytes.iter().map(|&b| b as u8).collect()
}

fn chunk_to_nbt(pos: ChunkPos, chunk: &Chunk) -> ChunkNbt {
    ChunkNbt {
        data_version: DATA_VERSION,
        x_pos: pos.x,
        z_pos: pos.z,
        blocks: fastnbt::ByteArray::new(to_i8(chunk.ids().as_slice())),
        metadata: fastnbt::ByteArray::new(to_i8(chunk.meta_bytes())),
        sky_light: fastnbt::ByteArray::new(to_i8(chunk.sky_light_bytes())),
        block_light: fastnbt::ByteArray::new(to_i8(chunk.block_light_bytes())),
        height_map: fastnbt::ByteArray::new(to_i8(chunk.heightmap_bytes())),
    }
}

fn nbt_to_chunk(pos: ChunkPos, nbt: &ChunkNbt) -> Result<Chunk> {
    if nbt.data_version > DATA_VERSION {
        tracing::warn!(
            "chunk ({}, {}) has data version {} (supported {}), reading best-effort",
            pos.x,
            pos.z,
            nbt.data_version,
            DATA_VERSION
        );
    }
    // A wrong array length means a corrupt save: escalate instead of
    // handing back a blank chunk that would overwrite player work.
    Chunk::from_parts(
        &to_u8(&nbt.blocks),
        &to_u8(&nbt.metadata),
        &to_u8(&nbt.sky_light),
        &to_u8(&nbt.block_light),
        &to_u8(&nbt.height_map),
    )
    .ok_or_else(|| anyhow!("chunk ({}, {}) is corrupt: bad array lengths", pos.x, pos.z))
}

// ── Region store ─────────────────────────────────────────────────────────

pub struct RegionStore {
    dir: PathBuf,
    open: IndexMap<(i32, i32), fastanvil::Region<fs::File>>,
}

impl RegionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            open: IndexMap::new(),
        }
    }

    pub fn open_regions(&self) -> usize {
        self.open.len()
    }

    fn region_path(&self, rx: i32, rz: i32) -> PathBuf {
        self.dir.join("region").join(format!("r.{rx}.{rz}.mca"))
    }

    /// Fetch an open region handle, opening (or creating, when `create`)
    /// as needed. Returns `None` for a missing region without `create`.
    fn region(
        &mut self,
        rx: i32,
        rz: i32,
        create: bool,
    ) -> Result<Option<&mut fastanvil::Region<fs::File>>> {
        let key = (rx, rz);

        // LRU touch: re-inserting moves the entry to the back.
        if let Some(region) = self.open.shift_remove(&key) {
            self.open.insert(key, region);
            return Ok(self.open.get_mut(&key));
        }

        let path = self.region_path(rx, rz);
        let region = if path.exists() {
            let file = fs::OpenOptions::new()
                .read(true)
                .write(true)
                .open(&path)
                .with_context(|| format!("opening region r.{rx}.{rz}"))?;
            fastanvil::Region::from_stream(file)
                .with_context(|| format!("parsing region r.{rx}.{rz}"))?
        } else {
            if !create {
                return Ok(None);
            }
            fs::create_dir_all(self.dir.join("region"))?;
            let file = fs::OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&path)
                .with_context(|| format!("creating region r.{rx}.{rz}"))?;
            fastanvil::Region::new(file)
                .with_context(|| format!("initializing region r.{rx}.{rz}"))?
        };

        if self.open.len() >= MAX_REGIONS {
            // Front is the least recently touched; dropping closes it.
            if let Some(((ex, ez), _)) = self.open.shift_remove_index(0) {
                tracing::debug!("closing region r.{ex}.{ez} (cache full)");
            }
        }
        self.open.insert(key, region);
        Ok(self.open.get_mut(&key))
    }

    pub fn save_chunk(&mut self, pos: ChunkPos, chunk: &Chunk) -> Result<()> {
        let nbt = chunk_to_nbt(pos, chunk);
        let bytes = fastnbt::to_bytes(&nbt)
            .with_context(|| format!("serializing chunk ({}, {})", pos.x, pos.z))?;

        let (rx, rz) = pos.region();
        let region = self
            .region(rx, rz, true)?
            .ok_or_else(|| anyhow!("region r.{rx}.{rz} unavailable"))?;
        region
            .write_chunk(
                pos.x.rem_euclid(32) as usize,
                pos.z.rem_euclid(32) as usize,
                &bytes,
            )
            .with_context(|| format!("writing chunk ({}, {})", pos.x, pos.z))?;
        Ok(())
    }

    /// Load a chunk from disk. `Ok(None)` means "not saved" (ungenerated);
    /// a present-but-unreadable chunk is an error.
    pub fn load_chunk(&mut self, pos: ChunkPos) -> Result<Option<Chunk>> {
        let (rx, rz) = pos.region();
        let Some(region) = self.region(rx, rz, false)? else {
            return Ok(None);
        };
        let Some(bytes) = region
            .read_chunk(
                pos.x.rem_euclid(32) as usize,
                pos.z.rem_euclid(32) as usize,
            )
            .with_context(|| format!("reading chunk ({}, {})", pos.x, pos.z))?
        else {
            return Ok(None);
        };

        let nbt: ChunkNbt = fastnbt::from_bytes(&bytes)
            .with_context(|| format!("deserializing chunk ({}, {})", pos.x, pos.z))?;
        Ok(Some(nbt_to_chunk(pos, &nbt)?))
    }

    /// Save every dirty chunk in the level and clear its modified flag.
    /// Returns the number of chunks written.
    pub fn save_modified(&mut self, level: &mut Level) -> Result<usize> {
        let dirty = level.store().modified_positions();
        for &pos in &dirty {
            let Some(chunk) = level.chunk(pos) else {
                continue;
            };
            self.save_chunk(pos, chunk)?;
            if let Some(chunk) = level.chunk_mut(pos) {
                chunk.clear_modified();
            }
        }
        if !dirty.is_empty() {
            tracing::info!("saved {} dirty chunks", dirty.len());
        }
        Ok(dirty.len())
    }
}

// ── Side tables ──────────────────────────────────────────────────────────

pub fn save_tables(dir: &Path, tables: &SideTables) -> Result<()> {
    use std::io::Write;

    fs::create_dir_all(dir)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tables.encode())?;
    let bytes = encoder.finish()?;
    fs::write(dir.join(TABLES_FILE), bytes).context("writing side tables")?;
    Ok(())
}

pub fn load_tables(dir: &Path) -> Result<Option<SideTables>> {
    use std::io::Read;

    let path = dir.join(TABLES_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let file = fs::File::open(&path).context("opening side tables")?;
    let mut bytes = Vec::new();
    GzDecoder::new(file)
        .read_to_end(&mut bytes)
        .context("decompressing side tables")?;
    Ok(Some(SideTables::decode(&bytes)?))
}
