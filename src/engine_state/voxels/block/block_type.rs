//! # Block Type Module
//!
//! The catalog of materials and items that can occupy or drop from a block,
//! together with the per-type prototype table every block copies its
//! defaults from.

use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

use super::BlockTypeSize;

/// Enumerates every material a block can be, plus the items that only ever
/// appear as drops.
///
/// Discriminants are the stable ids written to persisted records, which is
/// why the drop-only items keep their catalog numbers.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive, Serialize, Deserialize)]
pub enum BlockType {
    /// Empty space.
    AIR = 0,
    /// Soft soil found under the grass layer.
    DIRT = 1,
    /// Surface layer.
    GRASS = 2,
    /// Unbreakable floor of the world.
    BEDROCK = 3,
    /// Bulk underground material; drops cobblestone.
    STONE = 4,
    /// Ore that drops coal.
    COAL_ORE = 5,
    /// Iron ore.
    IRON_ORE = 6,
    /// Gold ore.
    GOLD_ORE = 7,
    /// Diamond ore.
    DIAMOND_ORE = 8,
    /// Tree trunk.
    WOOD = 9,
    /// Tree canopy; see-through and drops nothing.
    LEAVES = 10,
    /// Wool.
    WOOL = 11,
    /// Cobblestone.
    COBBLESTONE = 12,
    /// Wooden planks.
    WOODEN_PLANKS = 13,
    /// Clickable crafting station.
    WORKBENCH = 14,
    /// Furnace.
    FURNACE = 15,
    /// Light emitting block.
    TORCH = 16,
    /// Drop-only item.
    STICK = 37,
    /// Drop-only item produced by coal ore.
    COAL = 38,
}

/// Coarse material category deciding which tool multiplier applies.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseClass {
    /// Cannot be damaged at all.
    AIR,
    /// Stone-like materials.
    ROCK,
    /// Soil-like materials.
    DIRT,
    /// Wooden materials.
    WOOD,
}

/// The runtime variant a block type needs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VariantKind {
    /// No behavior beyond the shared block contract.
    Plain,
    /// Emits a permanent light.
    Torch,
    /// Opens the crafting UI when interacted with.
    CraftingStation,
}

/// Canonical defaults of a block type.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlockPrototype {
    /// The item dropped when the block is destroyed
    pub drop_type: Option<BlockType>,
    /// Tool multiplier category
    pub base: BaseClass,
    /// Whether light and face visibility pass through the block
    pub transparent: bool,
    /// Health a fresh block starts with
    pub time_to_break: f32,
    /// Runtime variant of the block
    pub variant: VariantKind,
}

impl BlockPrototype {
    const fn solid(block_type: BlockType, base: BaseClass, time_to_break: f32) -> Self {
        BlockPrototype {
            drop_type: Some(block_type),
            base,
            transparent: false,
            time_to_break,
            variant: VariantKind::Plain,
        }
    }
}

impl BlockType {
    /// Converts a persisted id back into a `BlockType`.
    ///
    /// # Returns
    /// `None` if the id is not part of the catalog.
    pub fn from_id(id: BlockTypeSize) -> Option<Self> {
        num::FromPrimitive::from_u8(id)
    }

    /// The persisted id of this type.
    pub fn id(self) -> BlockTypeSize {
        self as BlockTypeSize
    }

    /// Looks up the prototype every block of this type starts from.
    pub const fn prototype(self) -> BlockPrototype {
        use BaseClass as B;
        match self {
            BlockType::AIR => BlockPrototype {
                drop_type: None,
                base: B::AIR,
                transparent: true,
                time_to_break: f32::INFINITY,
                variant: VariantKind::Plain,
            },
            BlockType::DIRT => BlockPrototype::solid(self, B::DIRT, 0.75),
            BlockType::GRASS => BlockPrototype::solid(self, B::DIRT, 0.75),
            BlockType::BEDROCK => BlockPrototype::solid(self, B::ROCK, f32::INFINITY),
            BlockType::STONE => BlockPrototype {
                drop_type: Some(BlockType::COBBLESTONE),
                ..BlockPrototype::solid(self, B::ROCK, 5.0)
            },
            BlockType::COAL_ORE => BlockPrototype {
                drop_type: Some(BlockType::COAL),
                ..BlockPrototype::solid(self, B::ROCK, 5.0)
            },
            BlockType::IRON_ORE => BlockPrototype::solid(self, B::ROCK, 7.5),
            BlockType::GOLD_ORE => BlockPrototype::solid(self, B::ROCK, 7.5),
            BlockType::DIAMOND_ORE => BlockPrototype::solid(self, B::ROCK, 8.5),
            BlockType::WOOD => BlockPrototype::solid(self, B::WOOD, 1.5),
            BlockType::LEAVES => BlockPrototype {
                drop_type: None,
                transparent: true,
                ..BlockPrototype::solid(self, B::DIRT, 0.5)
            },
            BlockType::WOOL => BlockPrototype::solid(self, B::DIRT, 0.5),
            BlockType::COBBLESTONE => BlockPrototype::solid(self, B::ROCK, 5.0),
            BlockType::WOODEN_PLANKS => BlockPrototype::solid(self, B::WOOD, 2.0),
            BlockType::WORKBENCH => BlockPrototype {
                variant: VariantKind::CraftingStation,
                ..BlockPrototype::solid(self, B::WOOD, 2.5)
            },
            BlockType::FURNACE => BlockPrototype::solid(self, B::ROCK, 8.5),
            BlockType::TORCH => BlockPrototype {
                transparent: true,
                variant: VariantKind::Torch,
                ..BlockPrototype::solid(self, B::WOOD, 0.2)
            },
            BlockType::STICK => BlockPrototype::solid(self, B::WOOD, 0.5),
            BlockType::COAL => BlockPrototype::solid(self, B::ROCK, 0.5),
        }
    }

    /// Whether this type may occupy a block slot.
    pub fn is_placeable(self) -> bool {
        !matches!(self, BlockType::STICK | BlockType::COAL)
    }

    /// The runtime variant blocks of this type need.
    pub fn variant_kind(self) -> VariantKind {
        self.prototype().variant
    }
}
