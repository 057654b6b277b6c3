//! # Lighting Task
//!
//! Runs a full lighting pass over a snapshot taken on the main thread.

use log::debug;

use crate::engine_state::{
    lighting::propagation::{recalculate_all_lights, LightingOutcome, LightingSnapshot},
    task_management::task::{job_channel, JobHandle, JobSender, Task},
};

/// A task that recalculates every light level of the loaded chunks.
pub struct LightingTask {
    snapshot: LightingSnapshot,
    sender: JobSender<LightingOutcome>,
}

impl LightingTask {
    /// Creates a lighting task over `snapshot`.
    pub fn new(snapshot: LightingSnapshot) -> (Self, JobHandle<LightingOutcome>) {
        let (sender, handle) = job_channel();
        (LightingTask { snapshot, sender }, handle)
    }
}

impl Task for LightingTask {
    fn name(&self) -> &'static str {
        "lighting"
    }

    fn process(self: Box<Self>) {
        let outcome = recalculate_all_lights(&self.snapshot);
        debug!("Lighting pass covered {} chunks", outcome.levels.len());
        self.sender.complete(Ok(outcome));
    }
}
