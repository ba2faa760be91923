//! The concrete block set: type ids, definitions, and the registry builder.
//!
//! Ids follow the classic-era numbering so saved worlds stay readable by
//! familiar tooling. Everything behavioral routes through the registry
//! table; code outside this module never branches on block ids apart from
//! the few cross-block probes the behaviors themselves perform (rail
//! shape, wire power).

pub mod fluid;
pub mod gravity;
pub mod growth;
pub mod mechanism;
pub mod rail;
pub mod redstone;
pub mod storage;
pub mod tnt;

use std::sync::{Arc, Mutex};

use cobble_engine::block::{BlockDef, BlockId, ItemStack, Material, Registry};

use self::storage::SideTables;

pub const AIR: BlockId = BlockId::AIR;
pub const STONE: BlockId = BlockId(1);
pub const GRASS: BlockId = BlockId(2);
pub const DIRT: BlockId = BlockId(3);
pub const COBBLESTONE: BlockId = BlockId(4);
pub const BEDROCK: BlockId = BlockId(7);
pub const WATER: BlockId = BlockId(8);
pub const LAVA: BlockId = BlockId(10);
pub const SAND: BlockId = BlockId(12);
pub const GRAVEL: BlockId = BlockId(13);
pub const LOG: BlockId = BlockId(17);
pub const LEAVES: BlockId = BlockId(18);
pub const GLASS: BlockId = BlockId(20);
pub const MUSHROOM: BlockId = BlockId(39);
pub const TNT: BlockId = BlockId(46);
pub const TORCH: BlockId = BlockId(50);
pub const FIRE: BlockId = BlockId(51);
pub const CHEST: BlockId = BlockId(54);
pub const WIRE: BlockId = BlockId(55);
pub const CROPS: BlockId = BlockId(59);
pub const SIGN: BlockId = BlockId(63);
pub const DOOR: BlockId = BlockId(64);
pub const RAIL: BlockId = BlockId(66);
pub const STAIRS: BlockId = BlockId(67);
pub const PLATE: BlockId = BlockId(70);
pub const REDSTONE_TORCH_OFF: BlockId = BlockId(75);
pub const REDSTONE_TORCH_ON: BlockId = BlockId(76);

/// Build the full block table. `tables` is shared with persistence so
/// chest/sign slots survive restarts.
pub fn standard(tables: Arc<Mutex<SideTables>>) -> Registry {
    let mut r = Registry::new();

    r.register(STONE, {
        let mut d = BlockDef::new("stone", Material::Rock);
        d.hardness = 1.5;
        d.resistance = 10.0;
        d.drop = Some(ItemStack::of_block(COBBLESTONE, 1));
        d
    }, None);

    r.register(GRASS, {
        let mut d = BlockDef::new("grass", Material::Soil);
        d.hardness = 0.6;
        d.resistance = 0.6;
        d.random_tick = true;
        d.drop = Some(ItemStack::of_block(DIRT, 1));
        d
    }, Some(Box::new(growth::GrassBehavior)));

    r.register(DIRT, {
        let mut d = BlockDef::new("dirt", Material::Soil);
        d.hardness = 0.5;
        d.resistance = 0.5;
        d.drop = Some(ItemStack::of_block(DIRT, 1));
        d
    }, None);

    r.register(COBBLESTONE, {
        let mut d = BlockDef::new("cobblestone", Material::Rock);
        d.hardness = 2.0;
        d.resistance = 10.0;
        d.drop = Some(ItemStack::of_block(COBBLESTONE, 1));
        d
    }, None);

    r.register(BEDROCK, {
        let mut d = BlockDef::new("bedrock", Material::Rock);
        d.hardness = -1.0;
        d.resistance = 6_000_000.0;
        d
    }, None);

    r.register(WATER, {
        let mut d = BlockDef::new("water", Material::Water);
        d.opacity = 3;
        d.transparent = true;
        d.place_ignore = true;
        d.world_tick = true;
        d.neighbour_context = true;
        d
    }, Some(Box::new(fluid::FluidBehavior::water())));

    r.register(LAVA, {
        let mut d = BlockDef::new("lava", Material::Lava);
        d.luminance = 15;
        d.transparent = true;
        d.place_ignore = true;
        d.world_tick = true;
        d.neighbour_context = true;
        d
    }, Some(Box::new(fluid::FluidBehavior::lava())));

    r.register(SAND, {
        let mut d = BlockDef::new("sand", Material::Sand);
        d.hardness = 0.5;
        d.resistance = 0.5;
        d.drop = Some(ItemStack::of_block(SAND, 1));
        d
    }, Some(Box::new(gravity::GravityBehavior)));

    r.register(GRAVEL, {
        let mut d = BlockDef::new("gravel", Material::Sand);
        d.hardness = 0.6;
        d.resistance = 0.6;
        d.drop = Some(ItemStack::of_block(GRAVEL, 1));
        d
    }, Some(Box::new(gravity::GravityBehavior)));

    r.register(LOG, {
        let mut d = BlockDef::new("log", Material::Wood);
        d.hardness = 2.0;
        d.resistance = 2.0;
        d.flammable = true;
        d.drop = Some(ItemStack::of_block(LOG, 1));
        d
    }, None);

    r.register(LEAVES, {
        let mut d = BlockDef::new("leaves", Material::Plant);
        d.hardness = 0.2;
        d.resistance = 0.2;
        d.opacity = 1;
        d.transparent = true;
        d.flammable = true;
        d.double_sided = true;
        d
    }, None);

    r.register(GLASS, {
        let mut d = BlockDef::new("glass", Material::Glass);
        d.hardness = 0.3;
        d.resistance = 0.3;
        d.opacity = 0;
        d.transparent = true;
        d
    }, None);

    r.register(MUSHROOM, {
        let mut d = BlockDef::new("mushroom", Material::Plant);
        d.opacity = 0;
        d.transparent = true;
        d.double_sided = true;
        d.random_tick = true;
        d.drop = Some(ItemStack::of_block(MUSHROOM, 1));
        d
    }, Some(Box::new(growth::MushroomBehavior)));

    r.register(TNT, {
        let mut d = BlockDef::new("tnt", Material::Wood);
        d.hardness = 0.0;
        d.resistance = 0.0;
        d.flammable = true;
        d.world_tick = true;
        d
    }, Some(Box::new(tnt::TntBehavior)));

    r.register(TORCH, {
        let mut d = BlockDef::new("torch", Material::Circuit);
        d.opacity = 0;
        d.transparent = true;
        d.luminance = 14;
        d.drop = Some(ItemStack::of_block(TORCH, 1));
        d
    }, None);

    r.register(FIRE, {
        let mut d = BlockDef::new("fire", Material::Air);
        d.opacity = 0;
        d.transparent = true;
        d.luminance = 15;
        d.place_ignore = true;
        d.random_tick = true;
        d
    }, Some(Box::new(growth::FireBehavior)));

    r.register(CHEST, {
        let mut d = BlockDef::new("chest", Material::Wood);
        d.hardness = 2.5;
        d.resistance = 2.5;
        d.flammable = true;
        d
    }, Some(Box::new(storage::ChestBehavior::new(Arc::clone(&tables)))));

    r.register(WIRE, {
        let mut d = BlockDef::new("redstone_wire", Material::Circuit);
        d.opacity = 0;
        d.transparent = true;
        d.world_tick = true;
        d.neighbour_context = true;
        d.drop = Some(ItemStack::of_block(WIRE, 1));
        d
    }, Some(Box::new(redstone::WireBehavior)));

    r.register(CROPS, {
        let mut d = BlockDef::new("crops", Material::Plant);
        d.opacity = 0;
        d.transparent = true;
        d.double_sided = true;
        d.random_tick = true;
        d
    }, Some(Box::new(growth::CropsBehavior)));

    r.register(SIGN, {
        let mut d = BlockDef::new("sign", Material::Wood);
        d.hardness = 1.0;
        d.resistance = 1.0;
        d.opacity = 0;
        d.transparent = true;
        d
    }, Some(Box::new(storage::SignBehavior::new(tables))));

    r.register(DOOR, {
        let mut d = BlockDef::new("door", Material::Wood);
        d.hardness = 3.0;
        d.resistance = 3.0;
        d.opacity = 0;
        d.transparent = true;
        d.flammable = true;
        d
    }, Some(Box::new(mechanism::DoorBehavior)));

    r.register(RAIL, {
        let mut d = BlockDef::new("rail", Material::Metal);
        d.hardness = 0.7;
        d.resistance = 0.7;
        d.opacity = 0;
        d.transparent = true;
        d.double_sided = true;
        d.drop = Some(ItemStack::of_block(RAIL, 1));
        d
    }, Some(Box::new(rail::RailBehavior)));

    r.register(STAIRS, {
        let mut d = BlockDef::new("stairs", Material::Rock);
        d.hardness = 2.0;
        d.resistance = 10.0;
        d.opacity = 0;
        d.drop = Some(ItemStack::of_block(STAIRS, 1));
        d
    }, Some(Box::new(mechanism::StairsBehavior)));

    r.register(PLATE, {
        let mut d = BlockDef::new("pressure_plate", Material::Rock);
        d.hardness = 0.5;
        d.resistance = 0.5;
        d.opacity = 0;
        d.transparent = true;
        d.world_tick = true;
        d.drop = Some(ItemStack::of_block(PLATE, 1));
        d
    }, Some(Box::new(mechanism::PlateBehavior)));

    r.register(REDSTONE_TORCH_OFF, {
        let mut d = BlockDef::new("redstone_torch_off", Material::Circuit);
        d.opacity = 0;
        d.transparent = true;
        d.world_tick = true;
        d.drop = Some(ItemStack::of_block(REDSTONE_TORCH_ON, 1));
        d
    }, Some(Box::new(redstone::RedstoneTorchBehavior { lit: false })));

    r.register(REDSTONE_TORCH_ON, {
        let mut d = BlockDef::new("redstone_torch_on", Material::Circuit);
        d.opacity = 0;
        d.transparent = true;
        d.world_tick = true;
        d.luminance = 7;
        d.power_source = true;
        d.drop = Some(ItemStack::of_block(REDSTONE_TORCH_ON, 1));
        d
    }, Some(Box::new(redstone::RedstoneTorchBehavior { lit: true })));

    r
}
