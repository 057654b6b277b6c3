//! # Chunk Streaming
//!
//! Keeps a square window of `2r + 1` chunks loaded around the chunk the
//! player stands in. The window moves one chunk at a time:
//!
//! 1. The player strays more than the margin past the current chunk's edge
//! 2. They stay out there for the dwell time; coming back resets the timer
//! 3. Chunks entering the window that were never visited are generated on a
//!    worker, chunks visited before are restored from their records
//! 4. The row or column leaving the window is compressed
//!
//! Only one shift is in flight at a time.

use cgmath::Point3;
use log::{debug, error, info, warn};
use web_time::{Duration, Instant};

use crate::{
    config::WorldConfig,
    engine_state::{
        events::WorldEvent,
        task_management::{
            task::{JobHandle, JobPoll},
            TaskManager,
        },
        voxels::{
            chunk::ChunkCoord,
            generation::{ChunkBlueprint, TerrainGenerator},
            tasks::chunk_generation_task::ChunkGenerationTask,
            world::World,
        },
    },
};

/// A one-chunk move of the streaming window.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ShiftStep {
    /// Chunks along x, `-1`, `0` or `1`
    pub dx: i32,
    /// Chunks along z, `-1`, `0` or `1`
    pub dz: i32,
}

impl ShiftStep {
    /// Steps in the order they are checked.
    const ALL: [ShiftStep; 4] = [
        ShiftStep { dx: -1, dz: 0 },
        ShiftStep { dx: 1, dz: 0 },
        ShiftStep { dx: 0, dz: -1 },
        ShiftStep { dx: 0, dz: 1 },
    ];
}

/// What the streaming manager did during one update.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StreamingStatus {
    /// The player is inside the margin.
    Idle,
    /// The player is outside the margin, waiting for the dwell time.
    Waiting,
    /// New chunks are being generated.
    Generating,
    /// The window moved by the given step.
    Committed(ShiftStep),
}

struct PendingShift {
    step: ShiftStep,
    job: JobHandle<Vec<ChunkBlueprint>>,
}

/// Moves the loaded window after the player.
pub struct StreamingManager {
    margin: f32,
    dwell: Duration,
    radius: i32,
    crossed_at: Option<Instant>,
    pending: Option<PendingShift>,
}

impl StreamingManager {
    /// Creates a streaming manager from the world configuration.
    pub fn new(config: &WorldConfig) -> Self {
        StreamingManager {
            margin: config.streaming_margin,
            dwell: config.streaming_dwell(),
            radius: config.view_radius,
            crossed_at: None,
            pending: None,
        }
    }

    /// Coordinates of the window around `center`, sorted.
    pub fn window(&self, center: ChunkCoord) -> Vec<ChunkCoord> {
        let mut coords = Vec::new();
        for x in -self.radius..=self.radius {
            for z in -self.radius..=self.radius {
                coords.push(center.offset(x, z));
            }
        }
        coords.sort();
        coords
    }

    /// Whether a shift is being generated.
    pub fn is_generating(&self) -> bool {
        self.pending.is_some()
    }

    /// Advances streaming for the player's position.
    ///
    /// # Arguments
    /// * `world` - The world whose window moves
    /// * `generator` - Cloned into generation jobs
    /// * `task_manager` - Runs generation jobs
    /// * `player` - Player position in world block units
    /// * `now` - Current time
    pub fn update(
        &mut self,
        world: &mut World,
        generator: &TerrainGenerator,
        task_manager: &mut TaskManager,
        player: Point3<f32>,
        now: Instant,
    ) -> StreamingStatus {
        if let Some(PendingShift { step, job }) = self.pending.take() {
            return match job.poll() {
                JobPoll::Running => {
                    self.pending = Some(PendingShift { step, job });
                    StreamingStatus::Generating
                }
                JobPoll::Finished(Ok(blueprints)) => {
                    self.commit(world, step, &blueprints);
                    StreamingStatus::Committed(step)
                }
                JobPoll::Finished(Err(e)) => {
                    warn!("Chunk generation for shift {:?} failed: {}", step, e);
                    StreamingStatus::Idle
                }
                JobPoll::Cancelled => {
                    error!("Chunk generation for shift {:?} was cancelled", step);
                    StreamingStatus::Idle
                }
            };
        }

        let Some(step) = self.crossed_step(world, player) else {
            self.crossed_at = None;
            return StreamingStatus::Idle;
        };
        let crossed_at = *self.crossed_at.get_or_insert(now);
        if now.duration_since(crossed_at) < self.dwell {
            return StreamingStatus::Waiting;
        }
        self.crossed_at = None;

        let unvisited: Vec<ChunkCoord> = self
            .leading(world.current_chunk(), step)
            .into_iter()
            .filter(|coord| !world.contains_chunk(*coord))
            .collect();
        if unvisited.is_empty() {
            self.commit(world, step, &[]);
            return StreamingStatus::Committed(step);
        }

        debug!("Generating {} chunks for shift {:?}", unvisited.len(), step);
        let (task, job) = ChunkGenerationTask::new(generator.clone(), unvisited);
        task_manager.publish_task(Box::new(task));
        self.pending = Some(PendingShift { step, job });
        StreamingStatus::Generating
    }

    /// The first step whose margin the player has crossed.
    fn crossed_step(&self, world: &World, player: Point3<f32>) -> Option<ShiftStep> {
        let width = world.dimensions().width as f32;
        let center = world.current_chunk();
        let min_x = center.x as f32 * width;
        let min_z = center.z as f32 * width;

        ShiftStep::ALL.into_iter().find(|step| match (step.dx, step.dz) {
            (-1, _) => player.x < min_x - self.margin,
            (1, _) => player.x > min_x + width + self.margin,
            (_, -1) => player.z < min_z - self.margin,
            _ => player.z > min_z + width + self.margin,
        })
    }

    /// Chunks at `offset` chunks along `step` from `center`, spanning the
    /// window across the step.
    fn line(&self, center: ChunkCoord, step: ShiftStep, offset: i32) -> Vec<ChunkCoord> {
        (-self.radius..=self.radius)
            .map(|t| {
                if step.dx != 0 {
                    center.offset(step.dx * offset, t)
                } else {
                    center.offset(t, step.dz * offset)
                }
            })
            .collect()
    }

    /// The line entering the window when moving from `center` by `step`.
    fn leading(&self, center: ChunkCoord, step: ShiftStep) -> Vec<ChunkCoord> {
        self.line(center, step, self.radius + 1)
    }

    /// The line leaving the window when moving from `center` by `step`.
    fn trailing(&self, center: ChunkCoord, step: ShiftStep) -> Vec<ChunkCoord> {
        self.line(center, step, -self.radius)
    }

    fn commit(&mut self, world: &mut World, step: ShiftStep, blueprints: &[ChunkBlueprint]) {
        let center = world.current_chunk();
        for blueprint in blueprints {
            world.insert_blueprint(blueprint);
        }
        for coord in self.leading(center, step) {
            match world.restore_chunk(coord) {
                Ok(_) => {}
                Err(e) => warn!("Chunk {} stays compressed: {}", coord, e),
            }
        }
        for coord in self.trailing(center, step) {
            world.destroy_chunk(coord);
        }

        let next = center.offset(step.dx, step.dz);
        world.set_current_chunk(next);
        world
            .events
            .push(WorldEvent::MobsDespawnRequested { center: next });
        info!("Streaming window moved from {} to {}", center, next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationMethod;

    fn setup() -> (World, TerrainGenerator, StreamingManager) {
        let config = WorldConfig {
            chunk_width: 4,
            chunk_height: 8,
            view_radius: 1,
            streaming_margin: 1.0,
            streaming_dwell_ms: 100,
            surface_height: Some(3),
            generation: GenerationMethod::Layered,
            ..WorldConfig::default()
        };
        let generator = TerrainGenerator::new(&config);
        let streaming = StreamingManager::new(&config);
        let mut world = World::new(&config);
        for coord in streaming.window(ChunkCoord::new(0, 0)) {
            world.insert_blueprint(&generator.generate(coord).unwrap());
        }
        (world, generator, streaming)
    }

    fn finish(
        streaming: &mut StreamingManager,
        world: &mut World,
        generator: &TerrainGenerator,
        task_manager: &mut TaskManager,
        player: Point3<f32>,
        now: Instant,
    ) -> StreamingStatus {
        for _ in 0..1000 {
            task_manager.process_queued_tasks();
            task_manager.process_completed_tasks();
            let status = streaming.update(world, generator, task_manager, player, now);
            if status != StreamingStatus::Generating {
                return status;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        StreamingStatus::Generating
    }

    #[test]
    fn test_leaving_briefly_does_not_shift() {
        let (mut world, generator, mut streaming) = setup();
        let mut task_manager = TaskManager::new(1);
        let start = Instant::now();
        let outside = Point3::new(6.0, 5.0, 2.0);
        let inside = Point3::new(2.0, 5.0, 2.0);

        let mut update = |player, at| {
            streaming.update(&mut world, &generator, &mut task_manager, player, at)
        };
        assert_eq!(update(outside, start), StreamingStatus::Waiting);
        assert_eq!(update(outside, start + Duration::from_millis(50)), StreamingStatus::Waiting);
        assert_eq!(update(inside, start + Duration::from_millis(80)), StreamingStatus::Idle);
        assert_eq!(update(outside, start + Duration::from_millis(120)), StreamingStatus::Waiting);
        // Just inside the margin counts as inside.
        assert_eq!(
            update(Point3::new(4.5, 5.0, 2.0), start + Duration::from_millis(500)),
            StreamingStatus::Idle
        );
        assert_eq!(world.current_chunk(), ChunkCoord::new(0, 0));
    }

    #[test]
    fn test_shift_generates_then_restores() {
        let (mut world, generator, mut streaming) = setup();
        let mut task_manager = TaskManager::new(1);
        let start = Instant::now();
        let east = Point3::new(6.0, 5.0, 2.0);

        assert_eq!(
            streaming.update(&mut world, &generator, &mut task_manager, east, start),
            StreamingStatus::Waiting
        );
        let later = start + Duration::from_millis(150);
        assert_eq!(
            streaming.update(&mut world, &generator, &mut task_manager, east, later),
            StreamingStatus::Generating
        );
        let step = ShiftStep { dx: 1, dz: 0 };
        assert_eq!(
            finish(&mut streaming, &mut world, &generator, &mut task_manager, east, later),
            StreamingStatus::Committed(step)
        );

        assert_eq!(world.current_chunk(), ChunkCoord::new(1, 0));
        for z in -1..=1 {
            assert!(world.is_chunk_loaded(ChunkCoord::new(2, z)));
            assert!(world.contains_chunk(ChunkCoord::new(-1, z)));
            assert!(!world.is_chunk_loaded(ChunkCoord::new(-1, z)));
        }
        assert!(world
            .drain_events()
            .contains(&WorldEvent::MobsDespawnRequested { center: ChunkCoord::new(1, 0) }));

        // Walking back only restores records, no generation needed.
        let west = Point3::new(2.0, 5.0, 2.0);
        let back = later + Duration::from_millis(10);
        assert_eq!(
            streaming.update(&mut world, &generator, &mut task_manager, west, back),
            StreamingStatus::Waiting
        );
        assert_eq!(
            streaming.update(
                &mut world,
                &generator,
                &mut task_manager,
                west,
                back + Duration::from_millis(150)
            ),
            StreamingStatus::Committed(ShiftStep { dx: -1, dz: 0 })
        );
        assert_eq!(world.current_chunk(), ChunkCoord::new(0, 0));
        assert_eq!(world.loaded_chunks(), streaming.window(ChunkCoord::new(0, 0)));
        assert_eq!(world.chunk_count(), 12);
    }
}
