//! # Mob Spawn Evaluation
//!
//! At night every loaded column is checked for a dark surface with two
//! blocks of headroom. The engine publishes the resulting positions as an
//! event; picking and spawning the actual mobs is left to the consumer.

use cgmath::Point3;

use crate::engine_state::voxels::world::World;

/// Surfaces at least this bright never spawn mobs.
const SPAWN_LIGHT_LIMIT: f32 = 1.5;

/// Last hour of the night before dawn.
const NIGHT_ENDS: u32 = 4;

/// First hour of the night.
const NIGHT_STARTS: u32 = 20;

impl World {
    /// Whether mobs may spawn at the current hour.
    pub fn is_night(&self) -> bool {
        self.hour() <= NIGHT_ENDS || self.hour() >= NIGHT_STARTS
    }

    /// World positions of the blocks a mob could spawn on top of.
    ///
    /// Only the topmost solid block of each column qualifies, and only if its
    /// last pushed light level is below the spawn limit and the two blocks
    /// above it are air. Empty outside of the night.
    pub fn mob_spawn_candidates(&self) -> Vec<Point3<i32>> {
        if !self.is_night() {
            return Vec::new();
        }
        let dimensions = self.dimensions();
        let width = dimensions.width as i32;
        let height = dimensions.height as i32;
        let mut candidates = Vec::new();

        for coord in self.loaded_chunks() {
            let origin = coord.block_origin(dimensions.width);
            for x in origin.x..origin.x + width {
                for z in origin.z..origin.z + width {
                    let surface = (0..height)
                        .rev()
                        .map(|y| Point3::new(x, y, z))
                        .find(|position| self.get_block(*position).is_some_and(|block| !block.is_air()));
                    let Some(surface) = surface else {
                        continue;
                    };
                    if surface.y + 2 >= height {
                        continue;
                    }
                    let dark = self
                        .get_block(surface)
                        .is_some_and(|block| block.actual_light_level() < SPAWN_LIGHT_LIMIT);
                    if dark {
                        candidates.push(surface);
                    }
                }
            }
        }
        candidates
    }
}
