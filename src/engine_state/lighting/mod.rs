//! # Lighting
//!
//! Light levels are recomputed from scratch by a background pass over a
//! snapshot of the loaded chunks. At most one pass is in flight: triggers
//! that arrive while one is running are dropped, and the engine marks the
//! world dirty again on the next change anyway.

use log::{debug, error, warn};

use crate::engine_state::{
    task_management::{
        task::{JobHandle, JobPoll},
        TaskManager,
    },
    voxels::{tasks::lighting_task::LightingTask, world::World},
};

use propagation::LightingOutcome;

pub mod light;
pub mod propagation;
pub mod sunlight;

/// Schedules lighting passes and applies their results.
#[derive(Default)]
pub struct LightingEngine {
    pending: Option<JobHandle<LightingOutcome>>,
    dropped_triggers: u64,
    completed_passes: u64,
}

impl LightingEngine {
    /// Creates an idle lighting engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a lighting pass over the current state of `world`.
    ///
    /// # Returns
    /// `false` if a pass is already running; the trigger is dropped.
    pub fn request(&mut self, world: &World, task_manager: &mut TaskManager) -> bool {
        if self.pending.is_some() {
            self.dropped_triggers += 1;
            debug!("Lighting pass already running, trigger dropped");
            return false;
        }
        let (task, handle) = LightingTask::new(world.lighting_snapshot());
        task_manager.publish_task(Box::new(task));
        self.pending = Some(handle);
        true
    }

    /// Applies the result of the running pass if it has finished.
    ///
    /// # Returns
    /// `true` if new light levels were written to the world.
    pub fn poll(&mut self, world: &mut World) -> bool {
        let Some(handle) = self.pending.take() else {
            return false;
        };
        match handle.poll() {
            JobPoll::Running => {
                self.pending = Some(handle);
                false
            }
            JobPoll::Finished(Ok(outcome)) => {
                world.apply_lighting(outcome);
                self.completed_passes += 1;
                true
            }
            JobPoll::Finished(Err(e)) => {
                warn!("Lighting pass failed: {}", e);
                false
            }
            JobPoll::Cancelled => {
                error!("Lighting pass was cancelled");
                false
            }
        }
    }

    /// Whether a pass is in flight.
    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of triggers dropped because a pass was running.
    pub fn dropped_triggers(&self) -> u64 {
        self.dropped_triggers
    }

    /// Number of passes whose results were applied.
    pub fn completed_passes(&self) -> u64 {
        self.completed_passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenerationMethod, WorldConfig};

    #[test]
    fn test_second_trigger_is_dropped_while_a_pass_runs() {
        let config = WorldConfig {
            chunk_width: 4,
            chunk_height: 4,
            generation: GenerationMethod::Empty,
            ..WorldConfig::default()
        };
        let mut world = World::new(&config);
        // No workers: the pass stays queued.
        let mut task_manager = TaskManager::new(0);
        let mut lighting = LightingEngine::new();

        assert!(lighting.request(&world, &mut task_manager));
        assert!(!lighting.request(&world, &mut task_manager));
        assert_eq!(lighting.dropped_triggers(), 1);
        assert!(!lighting.poll(&mut world));
        assert!(lighting.is_running());
    }

    #[test]
    fn test_finished_pass_is_applied() {
        let config = WorldConfig {
            chunk_width: 4,
            chunk_height: 4,
            generation: GenerationMethod::Empty,
            ..WorldConfig::default()
        };
        let mut world = World::new(&config);
        let mut task_manager = TaskManager::new(1);
        let mut lighting = LightingEngine::new();
        lighting.request(&world, &mut task_manager);

        let mut applied = false;
        for _ in 0..1000 {
            task_manager.process_queued_tasks();
            task_manager.process_completed_tasks();
            if lighting.poll(&mut world) {
                applied = true;
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        assert!(applied);
        assert!(!lighting.is_running());
        assert_eq!(lighting.completed_passes(), 1);
    }
}
