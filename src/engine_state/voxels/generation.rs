//! # Terrain Generation
//!
//! Produces the block types of a chunk from the world seed and the chunk
//! coordinate alone, so the same chunk always comes out the same. The output
//! is a [`ChunkBlueprint`]: plain data that a worker can hand back to the main
//! thread, where it becomes a live [`Chunk`](super::chunk::Chunk).
//!
//! ## Layers
//!
//! From the bottom up a layered column holds bedrock, stone with ores, three
//! layers of dirt and a grass surface. The surface height follows Perlin
//! noise around the configured height. Trees are planted afterwards.

use cgmath::Point3;
use noise::{NoiseFn, Perlin};

use crate::{
    config::{GenerationMethod, WorldConfig},
    engine_state::voxels::{
        block::block_type::BlockType,
        chunk::{ChunkCoord, ChunkDimensions},
    },
    error::{EngineError, EngineResult},
};

/// Scaling factor applied to world coordinates when sampling the surface noise.
pub const SURFACE_NOISE_SCALE: f64 = 0.05;

/// Cumulative ore chances, rarest first.
const ORE_CHANCES: [(BlockType, f32); 4] = [
    (BlockType::DIAMOND_ORE, 0.001),
    (BlockType::GOLD_ORE, 0.0075),
    (BlockType::IRON_ORE, 0.01),
    (BlockType::COAL_ORE, 0.05),
];

/// Number of dirt layers under the grass.
const DIRT_DEPTH: usize = 3;

/// Trees keep this many blocks away from the chunk edge.
const TREE_EDGE_MARGIN: usize = 4;

/// Minimum spacing between two trunks.
const TREE_SPACING: usize = 7;

/// Growth of the planting roll after every column that got no tree.
const TREE_CHANCE_STEP: f32 = 0.3;

/// The block types of a freshly generated chunk, in storage order.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkBlueprint {
    /// Coordinate of the generated chunk
    pub coord: ChunkCoord,
    /// One type per block, indexed like the chunk's block vector
    pub blocks: Vec<BlockType>,
}

/// Deterministic terrain generator.
#[derive(Clone)]
pub struct TerrainGenerator {
    seed: u64,
    method: GenerationMethod,
    dimensions: ChunkDimensions,
    surface_height: usize,
    surface_variation: usize,
    perlin: Perlin,
}

impl TerrainGenerator {
    /// Creates a generator from the world configuration.
    pub fn new(config: &WorldConfig) -> Self {
        TerrainGenerator {
            seed: config.seed,
            method: config.generation,
            dimensions: config.dimensions(),
            surface_height: config.surface_height(),
            surface_variation: config.surface_variation,
            perlin: Perlin::new(config.seed as u32),
        }
    }

    /// The chunk size this generator produces.
    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    /// Generates the block types of the chunk at `coord`.
    ///
    /// # Errors
    /// Returns [`EngineError::Generation`] if the chunks are too short to hold
    /// a bedrock floor under the surface.
    pub fn generate(&self, coord: ChunkCoord) -> EngineResult<ChunkBlueprint> {
        let mut blueprint = ChunkBlueprint {
            coord,
            blocks: vec![BlockType::AIR; self.dimensions.volume()],
        };
        match self.method {
            GenerationMethod::Empty => Ok(blueprint),
            GenerationMethod::Layered => {
                if self.dimensions.height < 2 {
                    return Err(EngineError::Generation {
                        coord,
                        reason: format!(
                            "{} blocks leave no room above the bedrock",
                            self.dimensions.height
                        ),
                    });
                }
                let mut rng = fastrand::Rng::with_seed(self.chunk_seed(coord));
                let surfaces = self.fill_layers(&mut blueprint, &mut rng);
                self.plant_trees(&mut blueprint, &surfaces, &mut rng);
                Ok(blueprint)
            }
        }
    }

    fn chunk_seed(&self, coord: ChunkCoord) -> u64 {
        self.seed
            ^ (coord.x as i64 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ (coord.z as i64 as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
    }

    /// Height of the grass layer at world column (`x`, `z`).
    pub fn surface_at(&self, x: i32, z: i32) -> usize {
        let sample = self.perlin.get([
            x as f64 * SURFACE_NOISE_SCALE,
            z as f64 * SURFACE_NOISE_SCALE,
        ]);
        let offset = (sample * self.surface_variation as f64).round() as i64;
        let top = self.dimensions.height as i64 - 1;
        (self.surface_height as i64 + offset).clamp(1, top) as usize
    }

    /// Fills every column up to its surface.
    ///
    /// # Returns
    /// The surface height of each column, indexed `x + width * z`.
    fn fill_layers(&self, blueprint: &mut ChunkBlueprint, rng: &mut fastrand::Rng) -> Vec<usize> {
        let width = self.dimensions.width;
        let origin = blueprint.coord.block_origin(width);
        let mut surfaces = vec![0; width * width];

        for z in 0..width {
            for x in 0..width {
                let surface = self.surface_at(origin.x + x as i32, origin.z + z as i32);
                surfaces[x + width * z] = surface;
                for y in 0..=surface {
                    let block_type = if y == 0 {
                        BlockType::BEDROCK
                    } else if y == surface {
                        BlockType::GRASS
                    } else if y + DIRT_DEPTH >= surface {
                        BlockType::DIRT
                    } else {
                        roll_stone(rng)
                    };
                    let index = self.dimensions.index(Point3::new(x, y, z));
                    blueprint.blocks[index] = block_type;
                }
            }
        }
        surfaces
    }

    fn plant_trees(&self, blueprint: &mut ChunkBlueprint, surfaces: &[usize], rng: &mut fastrand::Rng) {
        let width = self.dimensions.width;
        let mut trees: Vec<(usize, usize)> = Vec::new();
        let mut possibility = 0.0f32;

        for x in 0..width {
            for z in 0..width {
                let roll = rng.f32() * possibility;
                let inside = x > TREE_EDGE_MARGIN
                    && x + TREE_EDGE_MARGIN < width
                    && z > TREE_EDGE_MARGIN
                    && z + TREE_EDGE_MARGIN < width;
                let near = trees
                    .iter()
                    .any(|(tx, tz)| tx.abs_diff(x).max(tz.abs_diff(z)) <= TREE_SPACING);

                if roll < 1.0 && inside && !near {
                    let height = rng.usize(4..=8);
                    let base = surfaces[x + width * z] + 1;
                    if self.place_tree(blueprint, Point3::new(x, base, z), height) {
                        trees.push((x, z));
                    }
                } else {
                    possibility += TREE_CHANCE_STEP;
                }
            }
        }
    }

    /// Writes a trunk of `height + 1` wood blocks and its canopy.
    ///
    /// # Returns
    /// `false` if the tree would not fit under the top of the chunk.
    fn place_tree(&self, blueprint: &mut ChunkBlueprint, base: Point3<usize>, height: usize) -> bool {
        if base.y + height + 2 >= self.dimensions.height {
            return false;
        }
        let dimensions = self.dimensions;
        let mut set = |dx: i32, dy: usize, dz: i32, block_type: BlockType| {
            let x = base.x as i32 + dx;
            let z = base.z as i32 + dz;
            let local = Point3::new(x, (base.y + dy) as i32, z);
            if dimensions.contains(local) {
                let index = dimensions.index(Point3::new(x as usize, base.y + dy, z as usize));
                blueprint.blocks[index] = block_type;
            }
        };

        for dy in 0..=height {
            set(0, dy, 0, BlockType::WOOD);
        }
        for dx in -2..=2 {
            for dy in 2..=height {
                for dz in -1..=1 {
                    if !(dx == 0 && dz == 0) {
                        set(dx, dy, dz, BlockType::LEAVES);
                    }
                }
            }
        }
        for dx in -1..=1 {
            for dy in 2..=height {
                set(dx, dy, -2, BlockType::LEAVES);
                set(dx, dy, 2, BlockType::LEAVES);
            }
        }
        for dx in -1..=1 {
            for dz in -1..=1 {
                set(dx, height + 1, dz, BlockType::LEAVES);
            }
        }
        set(0, height + 2, 0, BlockType::LEAVES);
        true
    }
}

fn roll_stone(rng: &mut fastrand::Rng) -> BlockType {
    let roll = rng.f32();
    let mut threshold = 0.0;
    for (ore, chance) in ORE_CHANCES {
        threshold += chance;
        if roll <= threshold {
            return ore;
        }
    }
    BlockType::STONE
}
