//! # Chunk Module
//!
//! A chunk is a `width × height × width` column of blocks, the unit of
//! loading, unloading and collision rebuilding.
//!
//! ## Storage
//!
//! A chunk is always in exactly one of two states:
//! - **loaded**: a dense vector of live [`Block`]s, each of which may be
//!   attached to the scene backend
//! - **compressed**: only the minimal [`BlockRecord`] of every block survives;
//!   no scene resources, registered lights or collision bodies remain
//!
//! Blocks are stored in row-major order (x, then y, then z), so the index of a
//! block is `x + width * y + width * height * z`.

use std::fmt;

use cgmath::Point3;
use serde::{Deserialize, Serialize};

use chunk_creation::ChunkCreationIterator;
use chunk_iteration::ChunkPositionIterator;
use record::{BlockRecord, ChunkRecord};

use crate::{
    engine_state::{
        lighting::sunlight::Sunlight,
        scene::{BodyId, CollisionShape},
        task_management::task::JobHandle,
        voxels::{block::Block, generation::ChunkBlueprint},
    },
    error::{EngineError, EngineResult},
};

pub mod chunk_creation;
pub mod chunk_iteration;
pub mod record;

/// Horizontal coordinate of a chunk, in chunk units.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// Chunk index along the world x axis
    pub x: i32,
    /// Chunk index along the world z axis
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a chunk coordinate.
    pub const fn new(x: i32, z: i32) -> Self {
        ChunkCoord { x, z }
    }

    /// The coordinate `dx` chunks along x and `dz` chunks along z from this one.
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        ChunkCoord::new(self.x + dx, self.z + dz)
    }

    /// World position of local block (0, 0, 0) of this chunk.
    pub fn block_origin(self, width: usize) -> Point3<i32> {
        let width = width as i32;
        Point3::new(self.x * width, 0, self.z * width)
    }

    /// The chunk containing the world block position `position`.
    pub fn containing(position: Point3<i32>, width: usize) -> Self {
        let width = width as i32;
        ChunkCoord::new(position.x.div_euclid(width), position.z.div_euclid(width))
    }

    /// Chebyshev distance in chunks.
    pub fn distance(self, other: ChunkCoord) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Size of every chunk in a world.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChunkDimensions {
    /// Blocks along x and along z
    pub width: usize,
    /// Blocks along y
    pub height: usize,
}

impl ChunkDimensions {
    /// Creates a dimension descriptor.
    pub const fn new(width: usize, height: usize) -> Self {
        ChunkDimensions { width, height }
    }

    /// Number of blocks in one chunk.
    pub fn volume(&self) -> usize {
        self.width * self.height * self.width
    }

    /// Index of local position `local` in a chunk's block vector.
    pub fn index(&self, local: Point3<usize>) -> usize {
        local.x + self.width * local.y + self.width * self.height * local.z
    }

    /// Inverse of [`ChunkDimensions::index`].
    pub fn position(&self, index: usize) -> Point3<usize> {
        let plane = self.width * self.height;
        Point3::new(
            index % self.width,
            (index % plane) / self.width,
            index / plane,
        )
    }

    /// Whether signed local coordinates lie inside a chunk.
    pub fn contains(&self, local: Point3<i32>) -> bool {
        (0..self.width as i32).contains(&local.x)
            && (0..self.height as i32).contains(&local.y)
            && (0..self.width as i32).contains(&local.z)
    }

    /// Splits a world position into its chunk and chunk-local position.
    ///
    /// # Returns
    /// `None` if the vertical coordinate is outside the chunk height.
    pub fn split(&self, position: Point3<i32>) -> Option<(ChunkCoord, Point3<usize>)> {
        if !(0..self.height as i32).contains(&position.y) {
            return None;
        }
        let width = self.width as i32;
        Some((
            ChunkCoord::containing(position, self.width),
            Point3::new(
                position.x.rem_euclid(width) as usize,
                position.y as usize,
                position.z.rem_euclid(width) as usize,
            ),
        ))
    }

    /// Iterates over all local positions in storage order.
    pub fn positions(&self) -> ChunkPositionIterator {
        ChunkPositionIterator::new(*self)
    }
}

pub(crate) enum ChunkStorage {
    Loaded(Vec<Block>),
    Compressed(Vec<BlockRecord>),
}

/// A column of blocks plus its sunlight state and collision bookkeeping.
pub struct Chunk {
    coord: ChunkCoord,
    dimensions: ChunkDimensions,
    storage: ChunkStorage,
    pub(crate) sunlight: Sunlight,
    /// In-flight collision rebuild, at most one per chunk.
    pub(crate) rebuild: Option<JobHandle<CollisionShape>>,
    pub(crate) body: Option<BodyId>,
}

impl Chunk {
    pub(crate) fn from_blocks(
        coord: ChunkCoord,
        dimensions: ChunkDimensions,
        blocks: Vec<Block>,
        sun_intensity: f32,
    ) -> Self {
        Chunk {
            coord,
            dimensions,
            storage: ChunkStorage::Loaded(blocks),
            sunlight: Sunlight::new(sun_intensity),
            rebuild: None,
            body: None,
        }
    }

    /// Builds a loaded chunk out of generated block types.
    ///
    /// Every block starts hidden and plain; the world reveals exposed blocks
    /// and binds runtime variants once the chunk is inserted.
    pub fn from_blueprint(
        blueprint: &ChunkBlueprint,
        dimensions: ChunkDimensions,
        ambient: f32,
        sun_intensity: f32,
    ) -> Self {
        let mut cci = ChunkCreationIterator::new(blueprint.coord, dimensions, ambient);
        for block_type in &blueprint.blocks {
            cci.push_block_type(*block_type);
        }
        cci.return_chunk(sun_intensity)
    }

    /// Rebuilds an unloaded chunk from its persisted record.
    ///
    /// The chunk is created compressed; the world restores it afterwards if
    /// the record was marked as loaded.
    pub fn from_record(
        record: ChunkRecord,
        dimensions: ChunkDimensions,
        sun_intensity: f32,
    ) -> EngineResult<Self> {
        let coord = ChunkCoord::new(record.x, record.z);
        if record.blocks.len() != dimensions.volume() {
            return Err(EngineError::RecordSize {
                coord,
                found: record.blocks.len(),
                expected: dimensions.volume(),
            });
        }
        let misplaced = record.blocks.iter().enumerate().find(|(index, block)| {
            dimensions.position(*index) != Point3::new(block.x, block.y, block.z)
        });
        if let Some((index, _)) = misplaced {
            return Err(EngineError::MisplacedBlock { coord, index });
        }
        Ok(Chunk {
            coord,
            dimensions,
            storage: ChunkStorage::Compressed(record.blocks),
            sunlight: Sunlight::new(sun_intensity),
            rebuild: None,
            body: None,
        })
    }

    /// Produces the persisted form of this chunk.
    pub fn to_record(&self) -> ChunkRecord {
        let (loaded, blocks) = match &self.storage {
            ChunkStorage::Loaded(blocks) => (true, blocks.iter().map(Block::to_record).collect()),
            ChunkStorage::Compressed(records) => (false, records.clone()),
        };
        ChunkRecord {
            x: self.coord.x,
            z: self.coord.z,
            loaded,
            blocks,
        }
    }

    /// The coordinate of this chunk.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// The size of this chunk.
    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    /// Whether the blocks of this chunk are live.
    pub fn is_loaded(&self) -> bool {
        matches!(self.storage, ChunkStorage::Loaded(_))
    }

    /// The chunk's sunlight state.
    pub fn sunlight(&self) -> &Sunlight {
        &self.sunlight
    }

    /// Whether a collision rebuild is outstanding.
    pub fn has_pending_rebuild(&self) -> bool {
        self.rebuild.is_some()
    }

    /// The physics body currently standing in for this chunk.
    pub fn body(&self) -> Option<BodyId> {
        self.body
    }

    /// Live blocks in storage order; empty while compressed.
    pub fn blocks(&self) -> &[Block] {
        match &self.storage {
            ChunkStorage::Loaded(blocks) => blocks,
            ChunkStorage::Compressed(_) => &[],
        }
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut [Block] {
        match &mut self.storage {
            ChunkStorage::Loaded(blocks) => blocks,
            ChunkStorage::Compressed(_) => &mut [],
        }
    }

    /// The block at `local`, or `None` if it is out of range or the chunk is
    /// compressed.
    pub fn block(&self, local: Point3<usize>) -> Option<&Block> {
        if local.x >= self.dimensions.width
            || local.y >= self.dimensions.height
            || local.z >= self.dimensions.width
        {
            return None;
        }
        self.blocks().get(self.dimensions.index(local))
    }

    pub(crate) fn block_mut(&mut self, local: Point3<usize>) -> Option<&mut Block> {
        if local.x >= self.dimensions.width
            || local.y >= self.dimensions.height
            || local.z >= self.dimensions.width
        {
            return None;
        }
        let index = self.dimensions.index(local);
        self.blocks_mut().get_mut(index)
    }

    /// Puts `block` into the slot at `local`, returning the block it replaced.
    pub(crate) fn replace_block(&mut self, local: Point3<usize>, block: Block) -> Option<Block> {
        let slot = self.block_mut(local)?;
        Some(std::mem::replace(slot, block))
    }

    /// Drops the live blocks, keeping only their records.
    ///
    /// # Returns
    /// The blocks that were live, so the caller can release the resources
    /// they held. `None` if the chunk was already compressed.
    pub(crate) fn compress(&mut self) -> Option<Vec<Block>> {
        let records = match &self.storage {
            ChunkStorage::Loaded(blocks) => blocks.iter().map(Block::to_record).collect(),
            ChunkStorage::Compressed(_) => return None,
        };
        match std::mem::replace(&mut self.storage, ChunkStorage::Compressed(records)) {
            ChunkStorage::Loaded(blocks) => Some(blocks),
            ChunkStorage::Compressed(_) => None,
        }
    }

    /// Rebuilds live blocks from the records kept while compressed.
    ///
    /// # Returns
    /// `Ok(false)` if the chunk was already loaded.
    pub(crate) fn decompress(&mut self) -> EngineResult<bool> {
        let ChunkStorage::Compressed(records) = &self.storage else {
            return Ok(false);
        };
        let blocks = records
            .iter()
            .map(|record| Block::from_record(record, self.coord))
            .collect::<EngineResult<Vec<_>>>()?;
        self.storage = ChunkStorage::Loaded(blocks);
        Ok(true)
    }
}
