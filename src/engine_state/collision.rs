//! # Collision Rebuilds
//!
//! Each loaded chunk has at most one collision rebuild in flight, stored in
//! the chunk itself. Asking for a rebuild while one is pending never starts a
//! second job; the running one picks up the geometry as it is when the main
//! thread answers its bridge request.
//!
//! A finished shape replaces the chunk's physics body in one step on the main
//! thread, so the old body stays in place until the new one exists.

use std::sync::Arc;

use log::{debug, error, warn};

use crate::engine_state::{
    scene::{bridge::GeometryRequester, SceneBackend, ShapeBuilder},
    task_management::{task::JobPoll, TaskManager},
    voxels::{chunk::Chunk, tasks::collision_shape_task::CollisionShapeTask},
};

/// Starts collision rebuilds and swaps finished shapes in.
pub struct CollisionScheduler {
    requester: GeometryRequester,
    builder: Arc<dyn ShapeBuilder>,
    jobs_submitted: u64,
    swaps: u64,
}

impl CollisionScheduler {
    /// Creates a scheduler that builds shapes with `builder`.
    ///
    /// # Arguments
    /// * `requester` - Worker end of the main-thread bridge, cloned into every job
    /// * `builder` - Converts attached geometry into a collision shape
    pub fn new(requester: GeometryRequester, builder: Arc<dyn ShapeBuilder>) -> Self {
        CollisionScheduler {
            requester,
            builder,
            jobs_submitted: 0,
            swaps: 0,
        }
    }

    /// Drives the collision rebuild of one chunk a step forward.
    ///
    /// With no rebuild pending a new job is published. A pending job that has
    /// finished has its shape swapped in for the chunk's current body; a
    /// failed one is logged and cleared so the next request can retry.
    ///
    /// # Returns
    /// `true` if the chunk's body was replaced.
    pub fn update_collision_shape(
        &mut self,
        chunk: &mut Chunk,
        task_manager: &mut TaskManager,
        backend: &mut dyn SceneBackend,
    ) -> bool {
        if !chunk.is_loaded() {
            chunk.rebuild = None;
            return false;
        }
        let Some(handle) = chunk.rebuild.take() else {
            let (task, handle) =
                CollisionShapeTask::new(self.requester.clone(), self.builder.clone(), chunk.coord());
            task_manager.publish_task(Box::new(task));
            chunk.rebuild = Some(handle);
            self.jobs_submitted += 1;
            return false;
        };

        match handle.poll() {
            JobPoll::Running => {
                chunk.rebuild = Some(handle);
                false
            }
            JobPoll::Finished(Ok(shape)) => {
                let body = backend.add_body(shape);
                if let Some(old) = chunk.body.replace(body) {
                    backend.remove_body(old);
                }
                self.swaps += 1;
                debug!("Chunk {} now collides with {}", chunk.coord(), body);
                true
            }
            JobPoll::Finished(Err(e)) => {
                warn!("Collision rebuild of chunk {} failed: {}", chunk.coord(), e);
                false
            }
            JobPoll::Cancelled => {
                error!("Collision rebuild of chunk {} was cancelled", chunk.coord());
                false
            }
        }
    }

    /// Number of rebuild jobs published.
    pub fn jobs_submitted(&self) -> u64 {
        self.jobs_submitted
    }

    /// Number of finished shapes swapped in.
    pub fn swaps(&self) -> u64 {
        self.swaps
    }
}
