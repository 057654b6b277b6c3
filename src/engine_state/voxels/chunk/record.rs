//! # Persisted Records
//!
//! The minimal state that survives unloading. Scene nodes, physics bodies and
//! registered lights are never part of a record; they are reconstructed from
//! the block type when a chunk is restored.

use serde::{Deserialize, Serialize};

use crate::{
    engine_state::voxels::{block::block_type::BaseClass, chunk::ChunkCoord},
    error::EngineResult,
};

/// Persisted fields of a single block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Catalog id of the block type
    pub block_type: u8,
    /// Catalog id of the dropped item
    pub drop_type: Option<u8>,
    /// Tool multiplier category
    pub base: BaseClass,
    /// Local x
    pub x: usize,
    /// Local y
    pub y: usize,
    /// Local z
    pub z: usize,
    /// Last computed light level
    pub light_level: f32,
    /// Remaining time-to-break; `None` for unbreakable blocks
    pub health: Option<f32>,
    /// Absent from the render and collision set
    pub hidden: bool,
    /// Lets light and face visibility through
    pub transparent: bool,
}

/// Persisted form of a chunk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Chunk x coordinate
    pub x: i32,
    /// Chunk z coordinate
    pub z: i32,
    /// Whether the chunk was loaded when the record was taken
    pub loaded: bool,
    /// Every block of the chunk in storage order
    pub blocks: Vec<BlockRecord>,
}

/// Persisted form of a whole world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldRecord {
    /// Chunk width the records were taken with
    pub chunk_width: usize,
    /// Chunk height the records were taken with
    pub chunk_height: usize,
    /// Hour of day
    pub hour: u32,
    /// Chunk the player stood in
    pub current_chunk: ChunkCoord,
    /// Every chunk ever visited
    pub chunks: Vec<ChunkRecord>,
}

impl WorldRecord {
    /// Serializes the record as JSON.
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a record from JSON.
    pub fn from_json(text: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
