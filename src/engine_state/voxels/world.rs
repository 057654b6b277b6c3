//! # World Module
//!
//! This module provides the `World` struct which manages a collection of chunks in the voxel world.
//! It serves as the central coordinator for chunk loading, unloading, and access.
//!
//! ## Architecture
//!
//! The world uses a sparse storage approach: a map from chunk coordinate to
//! chunk, holding loaded chunks and the compressed records of every chunk
//! visited before. Blocks refer back to their chunk by coordinate only, and
//! every cross-chunk lookup goes through [`World::get_block`].
//!
//! ## Ownership
//!
//! The world is owned by the engine and only ever mutated on the main thread.
//! It never talks to the scene backend directly: attach, detach and shading
//! changes are queued as [`SceneCommand`]s, collision rebuilds as chunk
//! coordinates, and a lighting pass as a single dirty flag. The engine drains
//! all three once per tick.
//!
//! Block state transitions live in `transitions`, visibility culling in
//! `visibility` and mob spawn evaluation in `spawning`.

use std::collections::{HashMap, HashSet};

use cgmath::{Point3, Vector3};
use log::{info, warn};

use crate::{
    config::WorldConfig,
    engine_state::{
        events::WorldEvent,
        lighting::{
            light::{Light, LightRegistry},
            propagation::{recalculate_all_lights, ChunkCells, LightingOutcome, LightingSnapshot},
        },
        scene::{BlockNode, GeometrySet, SceneCommand},
        voxels::{
            block::{block_type::BlockType, block_type::VariantKind, Block, BlockVariant},
            chunk::{
                record::{ChunkRecord, WorldRecord},
                Chunk, ChunkCoord, ChunkDimensions,
            },
            generation::ChunkBlueprint,
        },
    },
    error::{EngineError, EngineResult},
};

/// Sunlight factor for an hour of the day: zero at midnight, one at noon.
pub fn light_factor(hour: u32) -> f32 {
    ((hour % 24) as f32 / 24.0 * std::f32::consts::PI).sin()
}

/// Represents a voxel world composed of multiple chunks.
pub struct World {
    pub(crate) config: WorldConfig,
    dimensions: ChunkDimensions,
    chunks: HashMap<ChunkCoord, Chunk>,
    current_chunk: ChunkCoord,
    pub(crate) lights: LightRegistry,
    hour: u32,
    light_factor: f32,
    pub(crate) commands: Vec<SceneCommand>,
    pub(crate) events: Vec<WorldEvent>,
    pub(crate) rebuild_requests: HashSet<ChunkCoord>,
    pub(crate) lighting_dirty: bool,
}

impl World {
    /// Creates a new, empty world at the configured start hour.
    pub fn new(config: &WorldConfig) -> Self {
        let hour = config.start_hour % 24;
        World {
            config: config.clone(),
            dimensions: config.dimensions(),
            chunks: HashMap::new(),
            current_chunk: ChunkCoord::new(0, 0),
            lights: LightRegistry::new(),
            hour,
            light_factor: light_factor(hour),
            commands: Vec::new(),
            events: Vec::new(),
            rebuild_requests: HashSet::new(),
            lighting_dirty: false,
        }
    }

    /// The configuration the world was created with.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The size of every chunk.
    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    /// The chunk the player stands in.
    pub fn current_chunk(&self) -> ChunkCoord {
        self.current_chunk
    }

    pub(crate) fn set_current_chunk(&mut self, coord: ChunkCoord) {
        self.current_chunk = coord;
    }

    /// Hour of the day, `0..24`.
    pub fn hour(&self) -> u32 {
        self.hour
    }

    /// The sunlight factor of the current hour.
    pub fn light_factor(&self) -> f32 {
        self.light_factor
    }

    /// The permanent lights of this world.
    pub fn lights(&self) -> &LightRegistry {
        &self.lights
    }

    /// The chunk at `coord`, loaded or not.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub(crate) fn chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    /// Whether a chunk record exists at `coord`.
    pub fn contains_chunk(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Whether the chunk at `coord` exists and is loaded.
    pub fn is_chunk_loaded(&self, coord: ChunkCoord) -> bool {
        self.chunks.get(&coord).is_some_and(Chunk::is_loaded)
    }

    /// Coordinates of every loaded chunk, sorted.
    pub fn loaded_chunks(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<ChunkCoord> = self
            .chunks
            .iter()
            .filter(|(_, chunk)| chunk.is_loaded())
            .map(|(coord, _)| *coord)
            .collect();
        coords.sort();
        coords
    }

    /// Number of chunks known to the world, loaded or not.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Returns the block at a world position.
    ///
    /// The chunk is found by floor division on the chunk width, so positions
    /// in any neighbor (diagonal ones included) resolve directly.
    ///
    /// # Returns
    /// `None` if the height is out of range or the owning chunk is missing or
    /// unloaded.
    pub fn get_block(&self, position: Point3<i32>) -> Option<&Block> {
        let (coord, local) = self.dimensions.split(position)?;
        self.chunks.get(&coord)?.block(local)
    }

    pub(crate) fn get_block_mut(&mut self, position: Point3<i32>) -> Option<&mut Block> {
        let (coord, local) = self.dimensions.split(position)?;
        self.chunks.get_mut(&coord)?.block_mut(local)
    }

    /// Returns the block at `local` relative to the origin of `chunk`.
    ///
    /// Coordinates outside `0..width` are forwarded to the neighbor chunk that
    /// holds them.
    pub fn get_block_from(&self, chunk: ChunkCoord, local: Point3<i32>) -> Option<&Block> {
        let origin = chunk.block_origin(self.dimensions.width);
        self.get_block(origin + Vector3::new(local.x, local.y, local.z))
    }

    /// Inserts a chunk.
    ///
    /// A loaded chunk has the current light factor applied, its torches and
    /// crafting stations bound, every exposed block attached and the seams
    /// with its loaded neighbors re-evaluated.
    ///
    /// # Returns
    /// `false` if a chunk already exists at the coordinate; the existing one
    /// is kept.
    pub fn add_chunk(&mut self, mut chunk: Chunk) -> bool {
        let coord = chunk.coord();
        if self.chunks.contains_key(&coord) {
            warn!("Chunk {} already exists, keeping the existing one", coord);
            return false;
        }
        if chunk.dimensions() != self.dimensions {
            warn!(
                "Chunk {} has dimensions {:?}, expected {:?}",
                coord,
                chunk.dimensions(),
                self.dimensions
            );
            return false;
        }

        chunk.sunlight.factor_intensity(self.light_factor);
        let loaded = chunk.is_loaded();
        self.chunks.insert(coord, chunk);

        if loaded {
            self.bind_variants(coord);
            self.reveal_chunk(coord);
            self.refresh_seams(coord);
            self.rebuild_requests.insert(coord);
            self.lighting_dirty = true;
            self.events.push(WorldEvent::ChunkLoaded(coord));
            info!("Chunk {} added", coord);
        }
        true
    }

    /// Builds a chunk out of generated block types and inserts it.
    pub fn insert_blueprint(&mut self, blueprint: &ChunkBlueprint) -> bool {
        let chunk = Chunk::from_blueprint(
            blueprint,
            self.dimensions,
            self.config.ambient_light,
            self.config.sun_intensity,
        );
        self.add_chunk(chunk)
    }

    /// Compresses a loaded chunk.
    ///
    /// Every attached block is detached, emitted lights are unregistered and
    /// the chunk's physics body is removed. A pending collision rebuild is
    /// abandoned.
    ///
    /// # Returns
    /// `false` if the chunk is missing or already compressed.
    pub fn destroy_chunk(&mut self, coord: ChunkCoord) -> bool {
        let width = self.dimensions.width;
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return false;
        };
        chunk.rebuild = None;
        let body = chunk.body.take();
        let Some(blocks) = chunk.compress() else {
            return false;
        };

        for block in &blocks {
            if !block.is_hidden() {
                self.commands
                    .push(SceneCommand::Detach(block.world_position(width)));
            }
            if let Some(light) = block.emitted_light() {
                self.lights.unregister(light);
            }
        }
        if let Some(body) = body {
            self.commands.push(SceneCommand::RemoveBody(body));
        }
        self.rebuild_requests.remove(&coord);
        self.lighting_dirty = true;
        self.events.push(WorldEvent::ChunkUnloaded(coord));
        info!("Chunk {} compressed", coord);
        true
    }

    /// Decompresses a chunk and reattaches its visible blocks.
    ///
    /// # Returns
    /// `Ok(false)` if the chunk is missing or already loaded.
    ///
    /// # Errors
    /// Fails if a record names an unknown block type; the chunk then stays
    /// compressed.
    pub fn restore_chunk(&mut self, coord: ChunkCoord) -> EngineResult<bool> {
        let width = self.dimensions.width;
        let factor = self.light_factor;
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return Ok(false);
        };
        if !chunk.decompress()? {
            return Ok(false);
        }
        chunk.sunlight.factor_intensity(factor);
        let nodes: Vec<BlockNode> = chunk
            .blocks()
            .iter()
            .filter(|block| !block.is_hidden() && !block.is_air())
            .map(|block| BlockNode {
                position: block.world_position(width),
                block_type: block.block_type(),
                light: block.actual_light_level(),
            })
            .collect();

        self.commands
            .extend(nodes.into_iter().map(SceneCommand::Attach));
        self.bind_variants(coord);
        self.refresh_seams(coord);
        self.rebuild_requests.insert(coord);
        self.lighting_dirty = true;
        self.events.push(WorldEvent::ChunkLoaded(coord));
        info!("Chunk {} restored", coord);
        Ok(true)
    }

    /// Binds the runtime variant of every block in a loaded chunk.
    fn bind_variants(&mut self, coord: ChunkCoord) {
        let width = self.dimensions.width;
        let Some(chunk) = self.chunks.get(&coord) else {
            return;
        };
        let pending: Vec<(Point3<i32>, BlockType)> = chunk
            .blocks()
            .iter()
            .filter(|block| {
                block.block_type().variant_kind() != VariantKind::Plain
                    && *block.variant() == BlockVariant::Plain
            })
            .map(|block| (block.world_position(width), block.block_type()))
            .collect();

        for (position, block_type) in pending {
            let variant = self.variant_for(block_type, position);
            if let Some(block) = self.get_block_mut(position) {
                block.variant = variant;
            }
        }
    }

    /// Creates the runtime variant a block of `block_type` at `position`
    /// needs, registering its light if it emits one.
    pub(crate) fn variant_for(&mut self, block_type: BlockType, position: Point3<i32>) -> BlockVariant {
        match block_type.variant_kind() {
            VariantKind::Plain => BlockVariant::Plain,
            VariantKind::CraftingStation => BlockVariant::CraftingStation,
            VariantKind::Torch => {
                let light = self.lights.register(Light::new(
                    position,
                    self.config.torch_intensity,
                    self.config.torch_decay,
                ));
                BlockVariant::Torch { light }
            }
        }
    }

    /// Sets the hour of day and rescales every chunk's sunlight.
    pub fn set_time(&mut self, hour: u32) {
        self.hour = hour % 24;
        self.light_factor = light_factor(self.hour);
        for chunk in self.chunks.values_mut() {
            chunk.sunlight.factor_intensity(self.light_factor);
        }
        self.lighting_dirty = true;
    }

    /// The attached geometry of a loaded chunk.
    pub fn visible_geometry(&self, coord: ChunkCoord) -> Option<GeometrySet> {
        let chunk = self.chunks.get(&coord).filter(|chunk| chunk.is_loaded())?;
        let width = self.dimensions.width;
        Some(GeometrySet {
            chunk: coord,
            cubes: chunk
                .blocks()
                .iter()
                .filter(|block| !block.is_hidden() && !block.is_air())
                .map(|block| block.world_position(width))
                .collect(),
        })
    }

    /// Captures what a lighting pass needs from the loaded chunks.
    pub fn lighting_snapshot(&self) -> LightingSnapshot {
        let mut snapshot = LightingSnapshot::new(
            self.dimensions,
            self.config.ambient_light,
            self.config.sun_decay,
        );
        for (coord, chunk) in &self.chunks {
            if chunk.is_loaded() {
                snapshot.insert_chunk(
                    *coord,
                    ChunkCells::from_blocks(chunk.blocks(), chunk.sunlight().intensity()),
                );
            }
        }
        for light in self.lights.lights() {
            snapshot.add_light(*light);
        }
        snapshot
    }

    /// Writes the result of a lighting pass back into the blocks.
    ///
    /// Blocks whose level changed get a shading command if they are attached.
    /// Chunks that were unloaded while the pass ran are skipped.
    pub fn apply_lighting(&mut self, outcome: LightingOutcome) {
        let width = self.dimensions.width;
        for (coord, levels) in outcome.levels {
            let Some(chunk) = self.chunks.get_mut(&coord) else {
                continue;
            };
            if levels.len() != chunk.blocks().len() {
                continue;
            }
            for (block, level) in chunk.blocks_mut().iter_mut().zip(levels) {
                block.light_level = level;
                if block.actual_light_level != level {
                    block.actual_light_level = level;
                    if !block.hidden {
                        self.commands.push(SceneCommand::Shade {
                            position: block.world_position(width),
                            level,
                        });
                    }
                }
            }
        }
        for (coord, origins) in outcome.sunlight_origins {
            if let Some(chunk) = self.chunks.get_mut(&coord) {
                chunk.sunlight.replace_origins(origins);
            }
        }
    }

    /// Runs a full lighting pass on the calling thread.
    pub fn recalculate_lights_blocking(&mut self) {
        let outcome = recalculate_all_lights(&self.lighting_snapshot());
        self.apply_lighting(outcome);
        self.lighting_dirty = false;
    }

    /// Produces the persisted form of the world.
    pub fn to_record(&self) -> WorldRecord {
        let mut chunks: Vec<ChunkRecord> = self.chunks.values().map(Chunk::to_record).collect();
        chunks.sort_by_key(|record| (record.x, record.z));
        WorldRecord {
            chunk_width: self.dimensions.width,
            chunk_height: self.dimensions.height,
            hour: self.hour,
            current_chunk: self.current_chunk,
            chunks,
        }
    }

    /// Rebuilds a world from its persisted form.
    ///
    /// Chunks marked as loaded are restored; everything else stays
    /// compressed.
    ///
    /// # Errors
    /// Fails if the record was taken with a different chunk size or holds an
    /// invalid chunk.
    pub fn from_record(config: &WorldConfig, record: WorldRecord) -> EngineResult<Self> {
        if record.chunk_width != config.chunk_width || record.chunk_height != config.chunk_height {
            return Err(EngineError::InvalidConfig(format!(
                "record uses {}x{} chunks, configuration uses {}x{}",
                record.chunk_width, record.chunk_height, config.chunk_width, config.chunk_height
            )));
        }
        let mut world = World::new(config);
        world.set_time(record.hour);
        world.current_chunk = record.current_chunk;

        for chunk_record in record.chunks {
            let loaded = chunk_record.loaded;
            let chunk = Chunk::from_record(chunk_record, world.dimensions, config.sun_intensity)?;
            let coord = chunk.coord();
            if world.contains_chunk(coord) {
                return Err(EngineError::DuplicateChunk(coord));
            }
            world.add_chunk(chunk);
            if loaded {
                world.restore_chunk(coord)?;
            }
        }
        Ok(world)
    }

    /// Takes the scene commands queued since the last call.
    pub fn drain_commands(&mut self) -> Vec<SceneCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Takes the events queued since the last call.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    /// Takes the chunks whose collision shape needs rebuilding, sorted.
    pub fn take_rebuild_requests(&mut self) -> Vec<ChunkCoord> {
        let mut coords: Vec<ChunkCoord> = self.rebuild_requests.drain().collect();
        coords.sort();
        coords
    }

    /// Takes the lighting dirty flag.
    pub fn take_lighting_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.lighting_dirty, false)
    }
}
