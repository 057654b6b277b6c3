#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! The simulation core of a block-building game: a chunked voxel world with
//! cross-chunk visibility culling, sunlight and torch lighting, background
//! collision rebuilds and a streaming window that follows the player.
//!
//! ## Key Modules
//!
//! * `config` - JSON configuration of the world and its services
//! * `core` - Shared resource wrappers used across threads
//! * `engine_state` - The engine facade, the world and every subsystem around it
//! * `error` - The crate-wide error type
//!
//! ## Architecture
//!
//! The engine follows a modular architecture with clear separation between:
//! * The world, owned and mutated by the main thread only
//! * Background work on a fixed worker pool, fed with owned snapshots
//! * The render/physics backend behind the `SceneBackend` trait
//!
//! ## Usage
//!
//! ```ignore
//! fn main() {
//!     voxel_world::run();
//! }
//! ```

use std::sync::Arc;

use cgmath::Point3;
use log::{debug, error, info};
use web_time::{Duration, Instant};

use config::WorldConfig;
use engine_state::{
    scene::headless::{BoxShapeBuilder, HeadlessBackend},
    EngineState,
};
use error::EngineResult;

pub mod config;
pub mod core;
pub mod engine_state;
pub mod error;

/// Simulated frame time of the headless walk.
const FRAME: Duration = Duration::from_millis(16);

/// Distance the headless walker covers per frame, in blocks.
const WALK_SPEED: f32 = 0.1;

/// Number of frames the headless walk lasts.
const WALK_FRAMES: u32 = 1200;

/// Initializes logging and runs a headless walk through a generated world.
///
/// The first command line argument, if present, is the path of a JSON
/// configuration file.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    if let Err(e) = walk(std::env::args().nth(1)) {
        error!("{}", e);
    }
}

fn walk(config_path: Option<String>) -> EngineResult<()> {
    let config = match config_path {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };
    let eye_height = (config.surface_height() + 2) as f32;
    let backend = HeadlessBackend::new();
    let mut engine = EngineState::new(
        config,
        Box::new(backend.clone()),
        Arc::new(BoxShapeBuilder::new()),
    )?;

    let mut now = Instant::now();
    let mut player = Point3::new(1.0, eye_height, 1.0);
    for _ in 0..WALK_FRAMES {
        now += FRAME;
        player.x += WALK_SPEED;
        engine.tick(player, now);
        for event in engine.drain_events() {
            debug!("{:?}", event);
        }
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
    while !engine.is_idle() {
        now += FRAME;
        engine.tick(player, now);
        std::thread::sleep(std::time::Duration::from_millis(1));
    }

    let world = engine.world();
    info!(
        "Walked to {:?}: chunk {}, {} chunks known, {} loaded, {} blocks attached, {} bodies, hour {}",
        player,
        world.current_chunk(),
        world.chunk_count(),
        world.loaded_chunks().len(),
        backend.attached_count(),
        backend.body_count(),
        world.hour()
    );
    Ok(())
}
