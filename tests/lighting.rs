mod common;

use cgmath::Point3;
use voxel_world::{
    config::{GenerationMethod, WorldConfig},
    engine_state::voxels::{
        block::block_type::BlockType, chunk::ChunkCoord, generation::TerrainGenerator, world::World,
    },
};

use common::{engine, small_config};

fn single_chunk(config: &WorldConfig) -> World {
    let mut world = World::new(config);
    let blueprint = TerrainGenerator::new(config)
        .generate(ChunkCoord::new(0, 0))
        .unwrap();
    world.insert_blueprint(&blueprint);
    world
}

fn empty_config(hour: u32) -> WorldConfig {
    WorldConfig {
        chunk_width: 4,
        chunk_height: 16,
        generation: GenerationMethod::Empty,
        start_hour: hour,
        ..WorldConfig::default()
    }
}

#[test]
fn test_open_sky_lights_down_from_the_top_cell() {
    let mut world = single_chunk(&empty_config(12));
    world.recalculate_lights_blocking();

    let chunk = world.chunk(ChunkCoord::new(0, 0)).unwrap();
    let origins = chunk.sunlight().origins();
    assert_eq!(origins.len(), 16);
    assert!(origins.iter().all(|light| light.origin.y == 15));
    assert!(origins.iter().all(|light| light.intensity == 3.0));

    let level = |y| world.get_block(Point3::new(1, y, 2)).unwrap().light_level();
    assert_eq!(level(15), 3.0);
    assert!((level(10) - 1.75).abs() < 1e-4);
    assert!((level(9) - 1.5).abs() < 1e-4);
    // Out of the sun's reach every cell falls back to exactly ambient.
    assert_eq!(level(2), 1.0);
    assert_eq!(level(0), 1.0);
}

#[test]
fn test_midnight_sky_is_ambient_everywhere() {
    let mut world = single_chunk(&empty_config(0));
    world.recalculate_lights_blocking();
    for block in world.chunk(ChunkCoord::new(0, 0)).unwrap().blocks() {
        assert_eq!(block.light_level(), 1.0);
    }
}

#[test]
fn test_sun_floods_the_sky_above_the_surface() {
    let config = WorldConfig {
        chunk_width: 4,
        chunk_height: 12,
        surface_height: Some(5),
        surface_variation: 0,
        start_hour: 12,
        generation: GenerationMethod::Layered,
        ..WorldConfig::default()
    };
    let mut world = single_chunk(&config);
    world.recalculate_lights_blocking();

    let origins = world.chunk(ChunkCoord::new(0, 0)).unwrap().sunlight().origins();
    assert!(origins.iter().any(|light| light.origin == Point3::new(2, 6, 2)));

    let level = |y| world.get_block(Point3::new(2, y, 2)).unwrap().light_level();
    assert_eq!(
        world.get_block(Point3::new(2, 5, 2)).unwrap().block_type(),
        BlockType::GRASS
    );
    assert_eq!(level(6), 3.0);
    assert!((level(5) - 2.75).abs() < 1e-4);
    // The opaque surface stops the flood.
    assert_eq!(level(4), 1.0);
    for y in 7..12 {
        assert!(level(y) > 1.0, "open sky at height {} stayed dark", y);
    }
}

#[test]
fn test_generation_is_reproducible_across_engines() {
    let (a, _, _) = engine(small_config());
    let (b, _, _) = engine(small_config());
    assert_eq!(a.to_record(), b.to_record());

    let other = WorldConfig {
        seed: 8,
        ..small_config()
    };
    let (c, _, _) = engine(other);
    assert_ne!(a.to_record(), c.to_record());
}
