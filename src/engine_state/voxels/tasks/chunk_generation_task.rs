//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which handles asynchronous
//! generation of chunk data. This task is scheduled by the streaming manager
//! when the player's window shifts onto chunks that were never visited.

use log::debug;

use crate::{
    engine_state::{
        task_management::task::{job_channel, JobHandle, JobSender, Task},
        voxels::{
            chunk::ChunkCoord,
            generation::{ChunkBlueprint, TerrainGenerator},
        },
    },
    error::EngineResult,
};

/// A task that generates the blueprints of a batch of chunks.
///
/// The blueprints are plain data; turning them into live chunks happens on
/// the main thread when the handle reports completion.
pub struct ChunkGenerationTask {
    /// Generator copy owned by the worker
    generator: TerrainGenerator,
    /// Chunks to generate, in the order they are returned
    coords: Vec<ChunkCoord>,
    sender: JobSender<Vec<ChunkBlueprint>>,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `generator` - The terrain generator of the world
    /// * `coords` - The chunk coordinates to generate
    ///
    /// # Returns
    /// The task and the handle its blueprints are delivered through
    pub fn new(generator: TerrainGenerator, coords: Vec<ChunkCoord>) -> (Self, JobHandle<Vec<ChunkBlueprint>>) {
        let (sender, handle) = job_channel();
        (
            ChunkGenerationTask {
                generator,
                coords,
                sender,
            },
            handle,
        )
    }
}

impl Task for ChunkGenerationTask {
    fn name(&self) -> &'static str {
        "chunk generation"
    }

    /// Generates every requested chunk; the first failure fails the batch.
    fn process(self: Box<Self>) {
        let this = *self;
        let result: EngineResult<Vec<ChunkBlueprint>> = this
            .coords
            .iter()
            .map(|coord| this.generator.generate(*coord))
            .collect();
        if let Ok(blueprints) = &result {
            debug!("Generated {} chunks", blueprints.len());
        }
        this.sender.complete(result);
    }
}
