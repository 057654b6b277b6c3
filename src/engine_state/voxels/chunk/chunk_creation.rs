//! # Chunk Creation Module
//!
//! Builds a loaded chunk one block type at a time, in storage order. Callers
//! push exactly `width × height × width` types; missing trailing positions are
//! filled with air when the chunk is returned.

use cgmath::Point3;

use crate::engine_state::voxels::block::{block_type::BlockType, Block};

use super::{chunk_iteration::ChunkPositionIterator, Chunk, ChunkCoord, ChunkDimensions};

/// A builder that turns a stream of block types into a [`Chunk`].
pub struct ChunkCreationIterator {
    /// The coordinate of the chunk being created
    coord: ChunkCoord,
    /// Size of the chunk being created
    dimensions: ChunkDimensions,
    /// Light level every new block starts with
    ambient: f32,
    /// Local position the next pushed type lands on
    positions: ChunkPositionIterator,
    /// Blocks created so far, in storage order
    blocks: Vec<Block>,
}

impl ChunkCreationIterator {
    /// Creates a builder for the chunk at `coord`.
    pub fn new(coord: ChunkCoord, dimensions: ChunkDimensions, ambient: f32) -> Self {
        ChunkCreationIterator {
            coord,
            dimensions,
            ambient,
            positions: dimensions.positions(),
            blocks: Vec::with_capacity(dimensions.volume()),
        }
    }

    /// Adds a block at the current position and advances the position.
    ///
    /// Types pushed past the end of the chunk are ignored.
    pub fn push_block_type(&mut self, block_type: BlockType) {
        let Some(local) = self.positions.next() else {
            log::warn!(
                "Chunk {} received more than {} blocks",
                self.coord,
                self.dimensions.volume()
            );
            return;
        };
        let block_type = if block_type.is_placeable() {
            block_type
        } else {
            BlockType::AIR
        };
        self.blocks
            .push(Block::new(block_type, self.coord, local, self.ambient));
    }

    /// Finalizes the chunk, padding any unfilled positions with air.
    pub fn return_chunk(mut self, sun_intensity: f32) -> Chunk {
        for local in self.positions.by_ref() {
            self.blocks
                .push(Block::new(BlockType::AIR, self.coord, local, self.ambient));
        }
        Chunk::from_blocks(self.coord, self.dimensions, self.blocks, sun_intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_input_is_padded_with_air() {
        let dimensions = ChunkDimensions::new(2, 2);
        let mut cci = ChunkCreationIterator::new(ChunkCoord::new(0, 0), dimensions, 1.0);
        cci.push_block_type(BlockType::DIRT);
        cci.push_block_type(BlockType::COAL);
        let chunk = cci.return_chunk(3.0);

        assert_eq!(chunk.blocks().len(), 8);
        assert_eq!(chunk.block(Point3::new(0, 0, 0)).unwrap().block_type(), BlockType::DIRT);
        assert_eq!(chunk.block(Point3::new(1, 0, 0)).unwrap().block_type(), BlockType::AIR);
        assert!(chunk.blocks()[2..].iter().all(Block::is_air));
    }
}
