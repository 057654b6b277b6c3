//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use cgmath::Point3;
use voxel_world::{
    config::{GenerationMethod, WorldConfig},
    engine_state::{
        scene::headless::{BoxShapeBuilder, HeadlessBackend},
        EngineState,
    },
};
use web_time::Instant;

/// A small layered world that keeps lighting passes quick.
pub fn small_config() -> WorldConfig {
    WorldConfig {
        chunk_width: 8,
        chunk_height: 24,
        surface_height: Some(10),
        surface_variation: 2,
        seed: 7,
        worker_count: 2,
        streaming_margin: 2.0,
        streaming_dwell_ms: 200,
        generation: GenerationMethod::Layered,
        ..WorldConfig::default()
    }
}

/// An engine plus a handle on its backend's state.
pub fn engine(config: WorldConfig) -> (EngineState, HeadlessBackend, Arc<BoxShapeBuilder>) {
    let backend = HeadlessBackend::new();
    let builder = Arc::new(BoxShapeBuilder::new());
    let engine = EngineState::new(config, Box::new(backend.clone()), builder.clone()).unwrap();
    (engine, backend, builder)
}

/// Ticks at a fixed time until no background work is left.
pub fn settle(engine: &mut EngineState, player: Point3<f32>, now: Instant) {
    for _ in 0..5000 {
        engine.tick(player, now);
        if engine.is_idle() {
            return;
        }
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
    panic!("engine did not settle");
}

/// Asserts that exactly the uncovered solid blocks of every loaded chunk
/// are attached.
pub fn assert_attached_matches_covered(engine: &EngineState, backend: &HeadlessBackend) {
    let world = engine.world();
    let width = world.dimensions().width;
    let mut solid_visible = 0;
    for coord in world.loaded_chunks() {
        for block in world.chunk(coord).unwrap().blocks() {
            let position = block.world_position(width);
            if block.is_air() {
                assert!(!backend.is_attached(position), "air attached at {:?}", position);
                continue;
            }
            let covered = world.is_covered(position);
            assert_eq!(
                covered,
                !backend.is_attached(position),
                "{:?} at {:?}: covered {}",
                block.block_type(),
                position,
                covered
            );
            assert_eq!(block.is_hidden(), covered);
            if !covered {
                solid_visible += 1;
            }
        }
    }
    assert_eq!(backend.attached_count(), solid_visible);
}
