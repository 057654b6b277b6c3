//! # Engine State Module
//!
//! The core engine module that owns the voxel world and drives every
//! subsystem around it once per frame.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container and the facade the game talks to
//! * `voxels` - Blocks, chunks, the world and terrain generation
//! * `lighting` - Sunlight and point-light propagation
//! * `scene` - The render/physics backend seam and the main-thread bridge
//! * `collision` - Per-chunk collision rebuild scheduling
//! * `streaming` - Moves the loaded window after the player
//! * `task_management` - Manages asynchronous tasks and worker threads
//!
//! ## Architecture
//!
//! `EngineState` owns the [`World`] outright. Background work never touches
//! it: tasks get owned snapshots, and the collision task asks for geometry
//! through the bridge, which the engine answers during its tick. Every
//! backend write is queued by the world and flushed here, on the main thread.
//!
//! ## Tick Order
//!
//! 1. Collect finished tasks and hand queued ones to free workers
//! 2. Answer geometry requests from workers
//! 3. Apply a finished lighting pass
//! 4. Swap in finished collision shapes
//! 5. Advance streaming
//! 6. Advance the clock
//! 7. Flush scene commands, rebuild requests and the lighting trigger

use std::sync::Arc;

use cgmath::{Point3, Vector3};
use log::{debug, info};
use web_time::Instant;

use clock::GameClock;
use collision::CollisionScheduler;
use events::WorldEvent;
use lighting::LightingEngine;
use scene::{bridge::MainThreadBridge, RayHit, SceneBackend, ShapeBuilder};
use streaming::{StreamingManager, StreamingStatus};
use task_management::TaskManager;
use voxels::{
    block::block_type::{BaseClass, BlockType},
    chunk::{record::WorldRecord, ChunkCoord},
    generation::TerrainGenerator,
    world::World,
};

use crate::{config::WorldConfig, error::EngineResult};

pub mod clock;
pub mod collision;
pub mod events;
pub mod lighting;
pub mod scene;
pub mod streaming;
pub mod task_management;
pub mod voxels;

/// How far `target_block` looks along the view ray, in blocks.
pub const TARGET_REACH: f32 = 8.0;

/// Damage multipliers of a tool per material class.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ToolProfile {
    /// Multiplier against rock
    pub rock: f32,
    /// Multiplier against wood
    pub wood: f32,
    /// Multiplier against dirt
    pub dirt: f32,
}

impl ToolProfile {
    /// The bare hand.
    pub const HAND: ToolProfile = ToolProfile {
        rock: 1.0,
        wood: 1.0,
        dirt: 1.0,
    };

    /// The multiplier this tool applies to blocks of `base`.
    pub fn multiplier(&self, base: BaseClass) -> f32 {
        match base {
            BaseClass::AIR => 0.0,
            BaseClass::ROCK => self.rock,
            BaseClass::WOOD => self.wood,
            BaseClass::DIRT => self.dirt,
        }
    }
}

/// The main state container for the voxel engine
///
/// This struct owns the world and every subsystem that works on it, and is
/// the single entry point for input, time and per-frame updates.
///
/// # Examples
///
/// ```ignore
/// let mut engine = EngineState::new(config, Box::new(backend), Arc::new(builder))?;
///
/// // Main game loop
/// loop {
///     engine.tick(player_position, Instant::now());
///     for event in engine.drain_events() {
///         // hand drops to the inventory, open the crafting UI, ...
///     }
/// }
/// ```
pub struct EngineState {
    world: World,
    generator: TerrainGenerator,
    task_manager: TaskManager,
    bridge: MainThreadBridge,
    backend: Box<dyn SceneBackend>,
    collision: CollisionScheduler,
    lighting: LightingEngine,
    streaming: StreamingManager,
    clock: GameClock,
    /// Block currently being dug, if any
    damage_target: Option<Point3<i32>>,
}

impl EngineState {
    /// Creates an engine with the initial window generated around chunk (0, 0).
    ///
    /// # Arguments
    /// * `config` - World and service configuration
    /// * `backend` - The render/physics backend, driven from this thread only
    /// * `shape_builder` - Turns attached geometry into collision shapes on workers
    ///
    /// # Errors
    /// Fails if the configuration is invalid or terrain cannot be generated.
    pub fn new(
        config: WorldConfig,
        backend: Box<dyn SceneBackend>,
        shape_builder: Arc<dyn ShapeBuilder>,
    ) -> EngineResult<Self> {
        config.validate()?;
        let generator = TerrainGenerator::new(&config);
        let streaming = StreamingManager::new(&config);
        let mut world = World::new(&config);

        let origin = ChunkCoord::new(0, 0);
        for coord in streaming.window(origin) {
            world.insert_blueprint(&generator.generate(coord)?);
        }
        world.set_current_chunk(origin);
        world.set_time(config.start_hour);
        info!(
            "Generated {} chunks around {}",
            world.loaded_chunks().len(),
            origin
        );

        Ok(Self::assemble(config, world, generator, streaming, backend, shape_builder))
    }

    /// Creates an engine from a persisted world.
    ///
    /// # Errors
    /// Fails if the configuration is invalid or the record does not match it.
    pub fn from_record(
        config: WorldConfig,
        record: WorldRecord,
        backend: Box<dyn SceneBackend>,
        shape_builder: Arc<dyn ShapeBuilder>,
    ) -> EngineResult<Self> {
        config.validate()?;
        let world = World::from_record(&config, record)?;
        let generator = TerrainGenerator::new(&config);
        let streaming = StreamingManager::new(&config);
        info!(
            "Restored world with {} chunks, {} loaded",
            world.chunk_count(),
            world.loaded_chunks().len()
        );

        Ok(Self::assemble(config, world, generator, streaming, backend, shape_builder))
    }

    fn assemble(
        config: WorldConfig,
        world: World,
        generator: TerrainGenerator,
        streaming: StreamingManager,
        backend: Box<dyn SceneBackend>,
        shape_builder: Arc<dyn ShapeBuilder>,
    ) -> Self {
        let bridge = MainThreadBridge::new();
        let collision = CollisionScheduler::new(bridge.requester(), shape_builder);
        let mut engine = EngineState {
            clock: GameClock::new(world.hour(), config.hour_duration()),
            world,
            generator,
            task_manager: TaskManager::new(config.worker_count),
            bridge,
            backend,
            collision,
            lighting: LightingEngine::new(),
            streaming,
            damage_target: None,
        };
        engine.flush();
        engine
    }

    /// Advances the engine by one frame.
    ///
    /// # Arguments
    /// * `player` - Player position in world block units
    /// * `now` - Current time
    pub fn tick(&mut self, player: Point3<f32>, now: Instant) {
        self.task_manager.process_completed_tasks();
        self.task_manager.process_queued_tasks();
        self.bridge.answer_pending(&self.world);
        self.lighting.poll(&mut self.world);
        self.poll_collision();

        let status = self.streaming.update(
            &mut self.world,
            &self.generator,
            &mut self.task_manager,
            player,
            now,
        );
        if let StreamingStatus::Committed(step) = status {
            debug!("Streaming committed {:?}", step);
            self.evaluate_spawns();
        }

        if let Some(hour) = self.clock.advance(now) {
            debug!("Hour {}", hour);
            self.world.set_time(hour);
            self.evaluate_spawns();
        }

        self.flush();
    }

    /// Polls every chunk that has a collision rebuild in flight.
    fn poll_collision(&mut self) {
        for coord in self.world.loaded_chunks() {
            let Some(chunk) = self.world.chunk_mut(coord) else {
                continue;
            };
            if chunk.has_pending_rebuild() {
                self.collision.update_collision_shape(
                    chunk,
                    &mut self.task_manager,
                    self.backend.as_mut(),
                );
            }
        }
    }

    /// Hands everything the world queued to the backend and the schedulers.
    fn flush(&mut self) {
        for command in self.world.drain_commands() {
            self.backend.apply(command);
        }
        for coord in self.world.take_rebuild_requests() {
            if let Some(chunk) = self.world.chunk_mut(coord) {
                self.collision.update_collision_shape(
                    chunk,
                    &mut self.task_manager,
                    self.backend.as_mut(),
                );
            }
        }
        if self.world.take_lighting_dirty() {
            self.lighting.request(&self.world, &mut self.task_manager);
        }
    }

    fn evaluate_spawns(&mut self) {
        let positions = self.world.mob_spawn_candidates();
        if !positions.is_empty() {
            self.world
                .events
                .push(WorldEvent::MobSpawnCandidates { positions });
        }
    }

    /// Places a block against a face of `target`.
    ///
    /// # Arguments
    /// * `block_type` - Type of the new block
    /// * `target` - The block the player aimed at
    /// * `face_normal` - Outward normal of the face that was hit
    ///
    /// # Returns
    /// `true` if the block was placed.
    pub fn place_block(&mut self, block_type: BlockType, target: Point3<i32>, face_normal: Vector3<i32>) -> bool {
        let placed = self.world.place_block(block_type, target, face_normal);
        self.flush();
        placed
    }

    /// Digs at the block at `position`.
    ///
    /// Switching to a different block restores the health of the previous
    /// target.
    ///
    /// # Returns
    /// `true` if the block broke.
    pub fn damage_block(&mut self, position: Point3<i32>, amount: f32, tool: ToolProfile) -> bool {
        if let Some(previous) = self.damage_target.filter(|previous| *previous != position) {
            self.world.reset_health(previous);
        }
        self.damage_target = Some(position);

        let Some(block) = self.world.get_block(position) else {
            return false;
        };
        let damage = amount * tool.multiplier(block.base());
        if damage <= 0.0 {
            return false;
        }
        let broke = self.world.damage_block(position, damage);
        if broke {
            self.damage_target = None;
        }
        self.flush();
        broke
    }

    /// Stops digging; the current target gets its health back.
    pub fn stop_damaging(&mut self) {
        if let Some(target) = self.damage_target.take() {
            self.world.reset_health(target);
        }
    }

    /// Clicks the block at `position`.
    ///
    /// # Returns
    /// `true` if the block reacted.
    pub fn interact(&mut self, position: Point3<i32>) -> bool {
        self.world.interact(position)
    }

    /// Sets the hour of day and schedules a lighting pass.
    pub fn set_time(&mut self, hour: u32) {
        self.clock.set_hour(hour);
        self.world.set_time(hour);
        self.evaluate_spawns();
        self.flush();
    }

    /// The nearest attached block along the view ray.
    pub fn target_block(&self, origin: Point3<f32>, direction: Vector3<f32>) -> Option<RayHit> {
        self.backend.raycast(origin, direction, TARGET_REACH)
    }

    /// Takes the events of the world since the last call.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        self.world.drain_events()
    }

    /// The world, for read access.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The block being dug, if any.
    pub fn damage_target(&self) -> Option<Point3<i32>> {
        self.damage_target
    }

    /// Number of chunks with a collision rebuild in flight.
    pub fn pending_rebuilds(&self) -> usize {
        self.world
            .loaded_chunks()
            .into_iter()
            .filter(|coord| {
                self.world
                    .chunk(*coord)
                    .is_some_and(|chunk| chunk.has_pending_rebuild())
            })
            .count()
    }

    /// Whether no lighting pass, collision rebuild or generation is running.
    pub fn is_idle(&self) -> bool {
        !self.lighting.is_running() && !self.streaming.is_generating() && self.pending_rebuilds() == 0
    }

    /// The collision scheduler, for its counters.
    pub fn collision(&self) -> &CollisionScheduler {
        &self.collision
    }

    /// The lighting engine, for its counters.
    pub fn lighting(&self) -> &LightingEngine {
        &self.lighting
    }

    /// The persisted form of the world.
    pub fn to_record(&self) -> WorldRecord {
        self.world.to_record()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_multipliers_follow_the_base_class() {
        let pickaxe = ToolProfile {
            rock: 4.0,
            wood: 1.0,
            dirt: 2.0,
        };
        assert_eq!(pickaxe.multiplier(BaseClass::ROCK), 4.0);
        assert_eq!(pickaxe.multiplier(BaseClass::DIRT), 2.0);
        assert_eq!(pickaxe.multiplier(BaseClass::AIR), 0.0);
        assert_eq!(ToolProfile::HAND.multiplier(BaseClass::WOOD), 1.0);
    }
}
