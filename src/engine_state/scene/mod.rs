//! # Scene Module
//!
//! The boundary between the voxel world and the render/physics backend.
//!
//! ## Key Components
//!
//! * `SceneBackend` - Main-thread-only attach/detach, shading, bodies and ray casts
//! * `ShapeBuilder` - Thread-safe conversion of visible geometry into a collision shape
//! * `SceneCommand` - Deferred backend writes queued by the world
//! * `bridge` - Lets worker threads ask the main thread for scene data
//! * `headless` - In-memory backend used by the demo binary and the tests
//!
//! ## Exclusivity
//!
//! Only the main thread ever holds a `&mut dyn SceneBackend`. World mutations
//! never touch the backend directly; they queue [`SceneCommand`]s that the
//! engine flushes once per frame, in the order they were queued.

use std::fmt;

use cgmath::{Point3, Vector3};

use crate::{
    engine_state::voxels::{block::block_type::BlockType, chunk::ChunkCoord},
    error::EngineResult,
};

pub mod bridge;
pub mod headless;

/// Identifier of a physics body handed out by the backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u64);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// Everything the backend needs to attach one visible block.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlockNode {
    /// World position of the block
    pub position: Point3<i32>,
    /// Material of the block
    pub block_type: BlockType,
    /// Shading level at attach time
    pub light: f32,
}

/// Axis-aligned box in world block units, `min` inclusive and `max` exclusive.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    /// Lowest corner
    pub min: Point3<f32>,
    /// Highest corner
    pub max: Point3<f32>,
}

/// Snapshot of the blocks of one chunk that are currently attached.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometrySet {
    /// Chunk the geometry belongs to
    pub chunk: ChunkCoord,
    /// World positions of the visible unit cubes, in storage order
    pub cubes: Vec<Point3<i32>>,
}

/// A collision shape ready to become a physics body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionShape {
    /// Chunk the shape stands in for
    pub chunk: ChunkCoord,
    /// Boxes making up the shape
    pub boxes: Vec<Aabb>,
}

/// Nearest block hit by a ray.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayHit {
    /// World position of the hit block
    pub block: Point3<i32>,
    /// Outward normal of the face the ray entered through
    pub normal: Vector3<i32>,
    /// Distance from the ray origin to the hit
    pub distance: f32,
}

/// A deferred backend write.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneCommand {
    /// Add a block to the render and collision set
    Attach(BlockNode),
    /// Remove the block at a world position
    Detach(Point3<i32>),
    /// Push a new light level to an attached block
    Shade {
        /// World position of the block
        position: Point3<i32>,
        /// New shading level
        level: f32,
    },
    /// Remove a chunk's physics body
    RemoveBody(BodyId),
}

/// The render/physics backend, driven from the main thread only.
pub trait SceneBackend {
    /// Adds a block to the render and collision set.
    fn attach(&mut self, node: &BlockNode);

    /// Removes the block at `position` from the render and collision set.
    fn detach(&mut self, position: Point3<i32>);

    /// Pushes the final light level of an attached block.
    fn set_shading(&mut self, position: Point3<i32>, level: f32);

    /// Creates a physics body from a collision shape.
    fn add_body(&mut self, shape: CollisionShape) -> BodyId;

    /// Destroys a physics body.
    fn remove_body(&mut self, body: BodyId);

    /// Finds the nearest attached block along a ray.
    ///
    /// # Arguments
    /// * `origin` - Start of the ray in world units
    /// * `direction` - Direction of the ray; need not be normalized
    /// * `max_distance` - Length of the ray
    fn raycast(
        &self,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
    ) -> Option<RayHit>;

    /// Applies one queued command.
    fn apply(&mut self, command: SceneCommand) {
        match command {
            SceneCommand::Attach(node) => self.attach(&node),
            SceneCommand::Detach(position) => self.detach(position),
            SceneCommand::Shade { position, level } => self.set_shading(position, level),
            SceneCommand::RemoveBody(body) => self.remove_body(body),
        }
    }
}

/// Builds collision shapes from geometry snapshots on worker threads.
pub trait ShapeBuilder: Send + Sync {
    /// Converts visible geometry into a collision shape.
    ///
    /// # Errors
    /// Returns [`EngineError::ShapeBuild`](crate::error::EngineError::ShapeBuild)
    /// when the backend cannot produce a shape; the rebuild is retried on the
    /// next trigger.
    fn build_collision_shape(&self, geometry: &GeometrySet) -> EngineResult<CollisionShape>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use headless::{BoxShapeBuilder, HeadlessBackend};

    #[test]
    fn test_empty_geometry_builds_an_empty_shape() {
        let geometry = GeometrySet::default();
        assert_eq!(geometry.chunk, ChunkCoord::new(0, 0));

        let shape = BoxShapeBuilder::new().build_collision_shape(&geometry).unwrap();
        assert_eq!(shape, CollisionShape::default());

        let mut backend = HeadlessBackend::new();
        let body = backend.add_body(shape);
        assert_eq!(backend.bodies_for(ChunkCoord::default()), vec![body]);
        backend.apply(SceneCommand::RemoveBody(body));
        assert_eq!(backend.body_count(), 0);
    }
}
