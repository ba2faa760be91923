//! Chests and signs, backed by shared side tables.
//!
//! The world only stores the block id; slot contents and sign text live in
//! fixed-capacity tables keyed by position, persisted as flat big-endian
//! records with a leading format-version byte. Hitting the capacity limit
//! refuses placement with a warning, never an error.

use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use cobble_engine::block::{BlockBehavior, BlockId, ItemStack};
use cobble_engine::geom::Face;
use cobble_engine::level::Level;
use cobble_engine::world::cell::Cell;
use cobble_engine::world::position::BlockPos;

use super::{CHEST, SIGN};

pub const MAX_CHESTS: usize = 256;
pub const MAX_SIGNS: usize = 256;
pub const CHEST_SLOTS: usize = 27;
pub const SIGN_TEXT_LEN: usize = 64;

/// Bumped when the record layout changes. Readers warn and carry on when
/// they meet a newer version.
const TABLE_VERSION: u8 = 1;

/// Sentinel y for unused record slots (world y is always in [0, 128)).
const UNUSED_Y: i32 = -1;

#[derive(Debug, Clone, Copy)]
pub struct ChestEntry {
    pub pos: BlockPos,
    pub slots: [ItemStack; CHEST_SLOTS],
}

#[derive(Debug, Clone, Copy)]
pub struct SignEntry {
    pub pos: BlockPos,
    pub text: [u8; SIGN_TEXT_LEN],
}

/// Both side tables; one instance per world, shared between the block
/// behaviors and persistence.
#[derive(Debug, Default)]
pub struct SideTables {
    chests: Vec<ChestEntry>,
    signs: Vec<SignEntry>,
}

impl SideTables {
    pub fn allocate_chest(&mut self, pos: BlockPos) -> bool {
        if self.chests.len() >= MAX_CHESTS {
            tracing::warn!("chest table full ({MAX_CHESTS}), refusing placement");
            return false;
        }
        self.chests.push(ChestEntry {
            pos,
            slots: [ItemStack::default(); CHEST_SLOTS],
        });
        true
    }

    /// Release the entry for a broken chest, returning its contents.
    pub fn free_chest(&mut self, pos: BlockPos) -> Option<[ItemStack; CHEST_SLOTS]> {
        let idx = self.chests.iter().position(|e| e.pos == pos)?;
        Some(self.chests.swap_remove(idx).slots)
    }

    pub fn chest_slots_mut(&mut self, pos: BlockPos) -> Option<&mut [ItemStack; CHEST_SLOTS]> {
        self.chests
            .iter_mut()
            .find(|e| e.pos == pos)
            .map(|e| &mut e.slots)
    }

    pub fn chest_count(&self) -> usize {
        self.chests.len()
    }

    pub fn allocate_sign(&mut self, pos: BlockPos) -> bool {
        if self.signs.len() >= MAX_SIGNS {
            tracing::warn!("sign table full ({MAX_SIGNS}), refusing placement");
            return false;
        }
        self.signs.push(SignEntry {
            pos,
            text: [0; SIGN_TEXT_LEN],
        });
        true
    }

    pub fn free_sign(&mut self, pos: BlockPos) -> bool {
        let idx = self.signs.iter().position(|e| e.pos == pos);
        if let Some(idx) = idx {
            self.signs.swap_remove(idx);
            true
        } else {
            false
        }
    }

    pub fn sign_text_mut(&mut self, pos: BlockPos) -> Option<&mut [u8; SIGN_TEXT_LEN]> {
        self.signs
            .iter_mut()
            .find(|e| e.pos == pos)
            .map(|e| &mut e.text)
    }

    pub fn sign_count(&self) -> usize {
        self.signs.len()
    }

    // ── Flat record encoding ─────────────────────────────────────────────

    /// Serialize both tables: version byte, then `MAX_CHESTS` fixed chest
    /// records, then `MAX_SIGNS` fixed sign records. Unused records carry
    /// the sentinel position.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(TABLE_VERSION);

        for i in 0..MAX_CHESTS {
            match self.chests.get(i) {
                Some(e) => {
                    encode_pos(&mut out, e.pos);
                    for slot in &e.slots {
                        out.extend_from_slice(&slot.item.to_be_bytes());
                        out.push(slot.count);
                    }
                }
                None => {
                    encode_pos(&mut out, BlockPos::new(0, UNUSED_Y, 0));
                    out.extend_from_slice(&[0; CHEST_SLOTS * 3]);
                }
            }
        }

        for i in 0..MAX_SIGNS {
            match self.signs.get(i) {
                Some(e) => {
                    encode_pos(&mut out, e.pos);
                    out.extend_from_slice(&e.text);
                }
                None => {
                    encode_pos(&mut out, BlockPos::new(0, UNUSED_Y, 0));
                    out.extend_from_slice(&[0; SIGN_TEXT_LEN]);
                }
            }
        }

        out
    }

    pub fn decode(bytes: &[u8]) -> Result<SideTables> {
        let expected = 1 + MAX_CHESTS * (12 + CHEST_SLOTS * 3) + MAX_SIGNS * (12 + SIGN_TEXT_LEN);
        if bytes.len() < expected {
            bail!(
                "side table truncated: {} bytes, expected {}",
                bytes.len(),
                expected
            );
        }
        let version = bytes[0];
        if version > TABLE_VERSION {
            tracing::warn!(
                "side table version {} is newer than supported {}, reading best-effort",
                version,
                TABLE_VERSION
            );
        }

        let mut tables = SideTables::default();
        let mut at = 1usize;

        for _ in 0..MAX_CHESTS {
            let pos = decode_pos(&bytes[at..]);
            at += 12;
            let mut slots = [ItemStack::default(); CHEST_SLOTS];
            for slot in &mut slots {
                slot.item = u16::from_be_bytes([bytes[at], bytes[at + 1]]);
                slot.count = bytes[at + 2];
                at += 3;
            }
            if pos.y != UNUSED_Y {
                tables.chests.push(ChestEntry { pos, slots });
            }
        }

        for _ in 0..MAX_SIGNS {
            let pos = decode_pos(&bytes[at..]);
            at += 12;
            let mut text = [0u8; SIGN_TEXT_LEN];
            text.copy_from_slice(&bytes[at..at + SIGN_TEXT_LEN]);
            at += SIGN_TEXT_LEN;
            if pos.y != UNUSED_Y {
                tables.signs.push(SignEntry { pos, text });
            }
        }

        Ok(tables)
    }
}

fn encode_pos(out: &mut Vec<u8>, pos: BlockPos) {
    out.extend_from_slice(&pos.x.to_be_bytes());
    out.extend_from_slice(&pos.y.to_be_bytes());
    out.extend_from_slice(&pos.z.to_be_bytes());
}

fn decode_pos(bytes: &[u8]) -> BlockPos {
    let read = |o: usize| i32::from_be_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);
    BlockPos::new(read(0), read(4), read(8))
}

// ── Behaviors ────────────────────────────────────────────────────────────

pub struct ChestBehavior {
    tables: Arc<Mutex<SideTables>>,
}

impl ChestBehavior {
    pub fn new(tables: Arc<Mutex<SideTables>>) -> Self {
        Self { tables }
    }
}

impl BlockBehavior for ChestBehavior {
    fn dropped_items(&self, _level: &mut Level, pos: BlockPos, _cell: Cell) -> Vec<ItemStack> {
        let slots = self
            .tables
            .lock()
            .expect("side tables poisoned")
            .free_chest(pos);
        let mut drops = vec![ItemStack::of_block(CHEST, 1)];
        if let Some(slots) = slots {
            drops.extend(slots.into_iter().filter(|s| !s.is_empty()));
        }
        drops
    }

    fn on_right_click(&self, _level: &mut Level, pos: BlockPos, _cell: Cell, _face: Face) -> bool {
        // Container UI is the client's problem; the click is consumed
        // either way so the held item is not placed.
        tracing::debug!("chest opened at ({}, {}, {})", pos.x, pos.y, pos.z);
        true
    }

    fn on_place(&self, level: &mut Level, id: BlockId, pos: BlockPos, _face: Face) -> bool {
        if !self
            .tables
            .lock()
            .expect("side tables poisoned")
            .allocate_chest(pos)
        {
            return false;
        }
        if !level.set_block(pos, id, 0) {
            self.tables
                .lock()
                .expect("side tables poisoned")
                .free_chest(pos);
            return false;
        }
        true
    }
}

pub struct SignBehavior {
    tables: Arc<Mutex<SideTables>>,
}

impl SignBehavior {
    pub fn new(tables: Arc<Mutex<SideTables>>) -> Self {
        Self { tables }
    }
}

impl BlockBehavior for SignBehavior {
    fn bounding_boxes(
        &self,
        _cell: Cell,
        _pos: BlockPos,
        _for_entity: bool,
        _out: &mut Vec<cobble_engine::geom::Aabb>,
    ) {
    }

    fn dropped_items(&self, _level: &mut Level, pos: BlockPos, _cell: Cell) -> Vec<ItemStack> {
        self.tables
            .lock()
            .expect("side tables poisoned")
            .free_sign(pos);
        vec![ItemStack::of_block(SIGN, 1)]
    }

    fn on_place(&self, level: &mut Level, id: BlockId, pos: BlockPos, _face: Face) -> bool {
        let grounded = level
            .get_block(pos.below())
            .is_some_and(|c| level.registry().def(c.id).material.is_solid());
        if !grounded {
            return false;
        }
        if !self
            .tables
            .lock()
            .expect("side tables poisoned")
            .allocate_sign(pos)
        {
            return false;
        }
        if !level.set_block(pos, id, 0) {
            self.tables
                .lock()
                .expect("side tables poisoned")
                .free_sign(pos);
            return false;
        }
        true
    }
}
