//! # Block Module
//!
//! The smallest addressable voxel. A block owns its type, health,
//! transparency and cached light level, and refers back to its owning chunk
//! by coordinate only. All state transitions that involve neighbors live on
//! [`World`](super::world::World) because they need cross-chunk lookups.

use block_type::{BaseClass, BlockType};
use cgmath::Point3;

use crate::{
    engine_state::{
        lighting::light::LightId,
        voxels::chunk::{record::BlockRecord, ChunkCoord},
    },
    error::{EngineError, EngineResult},
};

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in records.
pub type BlockTypeSize = u8;

/// Runtime behavior attached to a block on top of the shared contract.
///
/// Changing between variants replaces the whole block in its chunk slot.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockVariant {
    /// An ordinary block.
    Plain,
    /// A block registered as a permanent light source.
    Torch {
        /// Registry entry of the emitted light
        light: LightId,
    },
    /// A block that opens the crafting UI when clicked.
    CraftingStation,
}

/// Represents a single voxel block in the world.
#[derive(Clone, Debug)]
pub struct Block {
    pub(crate) block_type: BlockType,
    pub(crate) drop_type: Option<BlockType>,
    pub(crate) base: BaseClass,
    pub(crate) local: Point3<usize>,
    pub(crate) chunk: ChunkCoord,
    pub(crate) light_level: f32,
    pub(crate) actual_light_level: f32,
    pub(crate) health: f32,
    pub(crate) hidden: bool,
    pub(crate) transparent: bool,
    pub(crate) variant: BlockVariant,
}

impl Block {
    /// Creates a hidden, plain block of `block_type` at `local` inside `chunk`.
    ///
    /// Variants that need registration (torches) are bound later by the
    /// world, which owns the light registry.
    pub fn new(block_type: BlockType, chunk: ChunkCoord, local: Point3<usize>, ambient: f32) -> Self {
        let mut block = Block {
            block_type,
            drop_type: None,
            base: BaseClass::AIR,
            local,
            chunk,
            light_level: ambient,
            actual_light_level: ambient,
            health: 0.0,
            hidden: true,
            transparent: true,
            variant: BlockVariant::Plain,
        };
        block.apply_prototype(block_type);
        block
    }

    /// Copies the canonical template of `block_type` into this block.
    pub(crate) fn apply_prototype(&mut self, block_type: BlockType) {
        let prototype = block_type.prototype();
        self.block_type = block_type;
        self.drop_type = prototype.drop_type;
        self.base = prototype.base;
        self.transparent = prototype.transparent;
        self.health = prototype.time_to_break;
    }

    /// Rebuilds a block from its persisted record.
    ///
    /// # Errors
    /// Returns [`EngineError::UnknownBlockType`] if the record names a type id
    /// that is not in the catalog.
    pub fn from_record(record: &BlockRecord, chunk: ChunkCoord) -> EngineResult<Self> {
        let block_type = BlockType::from_id(record.block_type)
            .ok_or(EngineError::UnknownBlockType(record.block_type))?;
        let drop_type = match record.drop_type {
            Some(id) => Some(BlockType::from_id(id).ok_or(EngineError::UnknownBlockType(id))?),
            None => None,
        };
        Ok(Block {
            block_type,
            drop_type,
            base: record.base,
            local: Point3::new(record.x, record.y, record.z),
            chunk,
            light_level: record.light_level,
            actual_light_level: record.light_level,
            health: record.health.unwrap_or(f32::INFINITY),
            hidden: record.hidden,
            transparent: record.transparent,
            variant: BlockVariant::Plain,
        })
    }

    /// Produces the minimal persisted form of this block.
    pub fn to_record(&self) -> BlockRecord {
        BlockRecord {
            block_type: self.block_type.id(),
            drop_type: self.drop_type.map(BlockType::id),
            base: self.base,
            x: self.local.x,
            y: self.local.y,
            z: self.local.z,
            light_level: self.light_level,
            health: self.health.is_finite().then_some(self.health),
            hidden: self.hidden,
            transparent: self.transparent,
        }
    }

    /// The type of this block.
    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    /// The item this block yields when destroyed.
    pub fn drop_type(&self) -> Option<BlockType> {
        self.drop_type
    }

    /// Tool multiplier category.
    pub fn base(&self) -> BaseClass {
        self.base
    }

    /// Coordinates inside the owning chunk.
    pub fn local(&self) -> Point3<usize> {
        self.local
    }

    /// Coordinate of the owning chunk.
    pub fn chunk(&self) -> ChunkCoord {
        self.chunk
    }

    /// World coordinates of this block for chunks `width` blocks wide.
    pub fn world_position(&self, width: usize) -> Point3<i32> {
        let origin = self.chunk.block_origin(width);
        Point3::new(
            origin.x + self.local.x as i32,
            self.local.y as i32,
            origin.z + self.local.z as i32,
        )
    }

    /// Light level computed by the last lighting pass.
    pub fn light_level(&self) -> f32 {
        self.light_level
    }

    /// Light level last pushed to shading.
    pub fn actual_light_level(&self) -> f32 {
        self.actual_light_level
    }

    /// Remaining time-to-break.
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Whether the block is absent from the render and collision set.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Whether light and face visibility pass through the block.
    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    /// The runtime variant of this block.
    pub fn variant(&self) -> &BlockVariant {
        &self.variant
    }

    /// Whether this slot is empty.
    pub fn is_air(&self) -> bool {
        self.block_type == BlockType::AIR
    }

    /// Whether light propagation continues through this block.
    pub fn permits_light(&self) -> bool {
        self.is_air() || matches!(self.variant, BlockVariant::Torch { .. })
    }

    /// The permanent light this block emits, if any.
    pub fn emitted_light(&self) -> Option<LightId> {
        match self.variant {
            BlockVariant::Torch { light } => Some(light),
            _ => None,
        }
    }

    /// Sets the remaining time-to-break.
    pub fn set_health(&mut self, health: f32) {
        self.health = health;
    }

    /// Restores the base time-to-break of the block's type.
    pub fn reset_health(&mut self) {
        self.health = self.block_type.prototype().time_to_break;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_block_copies_prototype() {
        let block = Block::new(BlockType::STONE, ChunkCoord::new(0, 0), Point3::new(1, 2, 3), 1.0);
        assert_eq!(block.drop_type(), Some(BlockType::COBBLESTONE));
        assert_eq!(block.base(), BaseClass::ROCK);
        assert_eq!(block.health(), 5.0);
        assert!(block.is_hidden());
        assert!(!block.is_transparent());
        assert!(!block.permits_light());
    }

    #[test]
    fn test_world_position_accounts_for_negative_chunks() {
        let block = Block::new(BlockType::DIRT, ChunkCoord::new(-1, 2), Point3::new(3, 7, 0), 1.0);
        assert_eq!(block.world_position(16), Point3::new(-13, 7, 32));
    }

    #[test]
    fn test_health_reset_restores_time_to_break() {
        let mut block = Block::new(BlockType::WOOD, ChunkCoord::new(0, 0), Point3::new(0, 0, 0), 1.0);
        block.set_health(block.health() - 1.0);
        assert_eq!(block.health(), 0.5);
        block.reset_health();
        assert_eq!(block.health(), 1.5);
    }

    #[test]
    fn test_record_keeps_unbreakable_health() {
        let block = Block::new(BlockType::BEDROCK, ChunkCoord::new(0, 0), Point3::new(0, 0, 0), 1.0);
        let record = block.to_record();
        assert_eq!(record.health, None);
        let restored = Block::from_record(&record, ChunkCoord::new(0, 0)).unwrap();
        assert!(restored.health().is_infinite());
    }

    #[test]
    fn test_unknown_type_in_record_is_rejected() {
        let mut record =
            Block::new(BlockType::DIRT, ChunkCoord::new(0, 0), Point3::new(0, 0, 0), 1.0).to_record();
        record.block_type = 200;
        assert!(matches!(
            Block::from_record(&record, ChunkCoord::new(0, 0)),
            Err(EngineError::UnknownBlockType(200))
        ));
    }
}
