//! # World Events
//!
//! Notifications for the layers outside the core: inventory, crafting UI,
//! mob AI and anything that wants to follow chunk streaming. Events are
//! collected during a tick and handed out by `EngineState::drain_events`.

use cgmath::Point3;

use crate::engine_state::voxels::{block::block_type::BlockType, chunk::ChunkCoord};

/// Something that happened in the world during a tick.
#[derive(Clone, Debug, PartialEq)]
pub enum WorldEvent {
    /// A destroyed block left an item behind.
    ItemDropped {
        /// The dropped item
        item: BlockType,
        /// World position of the destroyed block
        position: Point3<i32>,
    },
    /// The player clicked a crafting station.
    OpenCraftingUi {
        /// World position of the station
        position: Point3<i32>,
    },
    /// Every mob should be removed before new candidates are evaluated.
    MobsDespawnRequested {
        /// The chunk the player now stands in
        center: ChunkCoord,
    },
    /// Blocks a mob could spawn on top of.
    MobSpawnCandidates {
        /// World positions of the spawn surfaces
        positions: Vec<Point3<i32>>,
    },
    /// A chunk was generated or restored.
    ChunkLoaded(ChunkCoord),
    /// A chunk was compressed.
    ChunkUnloaded(ChunkCoord),
}
