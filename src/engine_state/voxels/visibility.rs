//! # Visibility Culling
//!
//! A solid block is attached to the scene only while at least one of its six
//! neighbors lets faces show through. Every change that could flip that
//! condition re-evaluates the affected neighbors here, including neighbors
//! that live in another chunk; those chunks then get a collision rebuild.

use cgmath::{Point3, Vector3};

use crate::engine_state::{
    scene::{BlockNode, SceneCommand},
    voxels::{block::block_side::BlockSide, chunk::ChunkCoord, world::World},
};

impl World {
    /// Whether all six neighbors of `position` are non-transparent.
    ///
    /// A neighbor that cannot be resolved (above or below the world, or in a
    /// chunk that is not loaded) counts as covering.
    pub fn is_covered(&self, position: Point3<i32>) -> bool {
        BlockSide::all().into_iter().all(|side| {
            self.get_block(side.neighbor_of(position))
                .map_or(true, |neighbor| !neighbor.is_transparent())
        })
    }

    /// Hides every neighbor of `position` that became fully covered.
    ///
    /// Called after `position` turned non-transparent.
    pub(crate) fn optimize(&mut self, position: Point3<i32>) {
        let origin = ChunkCoord::containing(position, self.dimensions().width);
        for side in BlockSide::all() {
            let neighbor = side.neighbor_of(position);
            let exposed = self
                .get_block(neighbor)
                .is_some_and(|block| !block.is_air() && !block.is_hidden());
            if exposed && self.is_covered(neighbor) {
                self.hide(neighbor, origin);
            }
        }
    }

    /// Shows every hidden solid neighbor of `position`.
    ///
    /// Called after `position` turned transparent, which gives each neighbor
    /// an exposed face.
    pub(crate) fn deoptimize(&mut self, position: Point3<i32>) {
        let origin = ChunkCoord::containing(position, self.dimensions().width);
        for side in BlockSide::all() {
            let neighbor = side.neighbor_of(position);
            if self
                .get_block(neighbor)
                .is_some_and(|block| !block.is_air() && block.is_hidden())
            {
                self.show(neighbor, origin);
            }
        }
    }

    /// Attaches the block at `position`.
    ///
    /// # Arguments
    /// * `position` - world position of the block
    /// * `origin` - chunk whose change caused the attach; any other owning
    ///   chunk gets a collision rebuild
    ///
    /// # Returns
    /// `false` if there is no such block, it is air or already attached.
    pub(crate) fn show(&mut self, position: Point3<i32>, origin: ChunkCoord) -> bool {
        let Some(block) = self.get_block_mut(position) else {
            return false;
        };
        if !block.hidden || block.is_air() {
            return false;
        }
        block.hidden = false;
        let node = BlockNode {
            position,
            block_type: block.block_type,
            light: block.actual_light_level,
        };
        let owner = block.chunk;

        self.commands.push(SceneCommand::Attach(node));
        if owner != origin {
            self.rebuild_requests.insert(owner);
        }
        true
    }

    /// Detaches the block at `position`.
    ///
    /// # Returns
    /// `false` if there is no such block or it is already hidden.
    pub(crate) fn hide(&mut self, position: Point3<i32>, origin: ChunkCoord) -> bool {
        let Some(block) = self.get_block_mut(position) else {
            return false;
        };
        if block.hidden {
            return false;
        }
        block.hidden = true;
        let owner = block.chunk;

        self.commands.push(SceneCommand::Detach(position));
        if owner != origin {
            self.rebuild_requests.insert(owner);
        }
        true
    }

    /// Brings the attachment of a solid block in line with its neighbors.
    fn refresh_visibility(&mut self, position: Point3<i32>, origin: ChunkCoord) {
        let Some(block) = self.get_block(position) else {
            return;
        };
        if block.is_air() {
            return;
        }
        let hidden = block.is_hidden();
        let covered = self.is_covered(position);
        if hidden && !covered {
            self.show(position, origin);
        } else if !hidden && covered {
            self.hide(position, origin);
        }
    }

    /// Attaches every solid block of a freshly inserted chunk that is not
    /// covered.
    pub(crate) fn reveal_chunk(&mut self, coord: ChunkCoord) {
        let Some(chunk) = self.chunk(coord) else {
            return;
        };
        let width = self.dimensions().width;
        let exposed: Vec<Point3<i32>> = chunk
            .blocks()
            .iter()
            .filter(|block| !block.is_air())
            .map(|block| block.world_position(width))
            .filter(|position| !self.is_covered(*position))
            .collect();

        for position in exposed {
            self.show(position, coord);
        }
    }

    /// Re-evaluates the block layers on both sides of every seam between
    /// `coord` and a loaded horizontal neighbor.
    pub(crate) fn refresh_seams(&mut self, coord: ChunkCoord) {
        let dimensions = self.dimensions();
        let width = dimensions.width as i32;
        let origin = coord.block_origin(dimensions.width);

        for side in BlockSide::horizontal() {
            let normal = side.normal();
            if !self.is_chunk_loaded(coord.offset(normal.x, normal.z)) {
                continue;
            }
            for y in 0..dimensions.height as i32 {
                for t in 0..width {
                    let (x, z) = match (normal.x, normal.z) {
                        (1, _) => (width - 1, t),
                        (-1, _) => (0, t),
                        (_, 1) => (t, width - 1),
                        _ => (t, 0),
                    };
                    let edge = origin + Vector3::new(x, y, z);
                    self.refresh_visibility(edge, coord);
                    self.refresh_visibility(edge + normal, coord);
                }
            }
        }
    }
}
