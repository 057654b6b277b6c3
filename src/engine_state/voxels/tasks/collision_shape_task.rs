//! # Collision Shape Task
//!
//! Rebuilds the collision shape of one chunk. The task cannot read the world
//! itself: it asks the main thread for the chunk's attached geometry through
//! the bridge, blocks until the answer arrives, then converts it on the
//! worker.

use std::sync::Arc;

use crate::engine_state::{
    scene::{bridge::GeometryRequester, CollisionShape, ShapeBuilder},
    task_management::task::{job_channel, JobHandle, JobSender, Task},
    voxels::chunk::ChunkCoord,
};

/// A task that builds the collision shape of a chunk.
pub struct CollisionShapeTask {
    requester: GeometryRequester,
    builder: Arc<dyn ShapeBuilder>,
    chunk: ChunkCoord,
    sender: JobSender<CollisionShape>,
}

impl CollisionShapeTask {
    /// Creates a new collision shape task.
    ///
    /// # Arguments
    /// * `requester` - Worker end of the main-thread bridge
    /// * `builder` - Converts geometry into a shape
    /// * `chunk` - The chunk to rebuild
    pub fn new(
        requester: GeometryRequester,
        builder: Arc<dyn ShapeBuilder>,
        chunk: ChunkCoord,
    ) -> (Self, JobHandle<CollisionShape>) {
        let (sender, handle) = job_channel();
        (
            CollisionShapeTask {
                requester,
                builder,
                chunk,
                sender,
            },
            handle,
        )
    }
}

impl Task for CollisionShapeTask {
    fn name(&self) -> &'static str {
        "collision shape"
    }

    fn process(self: Box<Self>) {
        let result = self
            .requester
            .request(self.chunk)
            .and_then(|geometry| self.builder.build_collision_shape(&geometry));
        self.sender.complete(result);
    }
}
