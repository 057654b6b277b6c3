//! # Chunk Iteration Module
//!
//! Walks the local positions of a chunk in storage order (x fastest, then y,
//! then z), matching the layout of the block vector.

use cgmath::Point3;

use super::ChunkDimensions;

/// Iterator over every local position of a chunk.
pub struct ChunkPositionIterator {
    dimensions: ChunkDimensions,
    local_x: usize,
    local_y: usize,
    local_z: usize,
}

impl ChunkPositionIterator {
    /// Starts at local position (0, 0, 0).
    pub fn new(dimensions: ChunkDimensions) -> Self {
        ChunkPositionIterator {
            dimensions,
            local_x: 0,
            local_y: 0,
            local_z: 0,
        }
    }
}

impl Iterator for ChunkPositionIterator {
    type Item = Point3<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.dimensions.width == 0
            || self.dimensions.height == 0
            || self.local_z >= self.dimensions.width
        {
            return None;
        }

        let current = Point3::new(self.local_x, self.local_y, self.local_z);

        self.local_x += 1;
        // End of row
        if self.local_x == self.dimensions.width {
            self.local_x = 0;
            self.local_y += 1;
            // End of plane
            if self.local_y == self.dimensions.height {
                self.local_y = 0;
                self.local_z += 1;
            }
        }

        Some(current)
    }
}
