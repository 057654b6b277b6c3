mod common;

use std::sync::Arc;

use cgmath::{Point3, Vector3};
use voxel_world::{
    config::{GenerationMethod, WorldConfig},
    engine_state::{
        events::WorldEvent,
        scene::headless::{BoxShapeBuilder, HeadlessBackend},
        voxels::{block::block_type::BlockType, chunk::ChunkCoord},
        EngineState, ToolProfile,
    },
    error::EngineError,
};
use web_time::{Duration, Instant};

use common::{assert_attached_matches_covered, engine, settle, small_config};

fn surface(engine: &EngineState, x: i32, z: i32) -> Point3<i32> {
    let height = engine.world().dimensions().height as i32;
    (0..height)
        .rev()
        .map(|y| Point3::new(x, y, z))
        .find(|p| !engine.world().get_block(*p).unwrap().is_air())
        .unwrap()
}

fn drops(events: &[WorldEvent]) -> Vec<BlockType> {
    events
        .iter()
        .filter_map(|event| match event {
            WorldEvent::ItemDropped { item, .. } => Some(*item),
            _ => None,
        })
        .collect()
}

#[test]
fn test_attached_set_tracks_covered_blocks_through_edits() {
    let (mut engine, backend, _) = engine(small_config());
    let player = Point3::new(4.0, 14.0, 4.0);
    let now = Instant::now();
    settle(&mut engine, player, now);
    assert_attached_matches_covered(&engine, &backend);

    let placeable = [
        BlockType::DIRT,
        BlockType::STONE,
        BlockType::LEAVES,
        BlockType::TORCH,
        BlockType::WORKBENCH,
        BlockType::WOODEN_PLANKS,
    ];
    let mut rng = fastrand::Rng::with_seed(11);
    for _ in 0..60 {
        let x = rng.i32(-6..14);
        let z = rng.i32(-6..14);
        let top = surface(&engine, x, z);
        if rng.bool() {
            let block_type = placeable[rng.usize(..placeable.len())];
            engine.place_block(block_type, top, Vector3::new(0, 1, 0));
        } else {
            engine.damage_block(top, 100.0, ToolProfile::HAND);
        }
    }
    settle(&mut engine, player, now);
    assert_attached_matches_covered(&engine, &backend);
}

#[test]
fn test_breaking_emits_exactly_one_drop() {
    let (mut engine, _, _) = engine(small_config());
    let now = Instant::now();
    let top = surface(&engine, 3, 3);
    engine.drain_events();

    assert!(!engine.damage_block(top, 0.5, ToolProfile::HAND));
    assert!(engine.damage_block(top, 0.5, ToolProfile::HAND));
    assert!(engine.world().get_block(top).unwrap().is_air());
    assert!(!engine.damage_block(top, 0.5, ToolProfile::HAND));
    assert_eq!(drops(&engine.drain_events()), vec![BlockType::GRASS]);

    // Leaves have nothing to drop.
    let below = Point3::new(top.x, top.y - 1, top.z);
    assert!(engine.place_block(BlockType::LEAVES, below, Vector3::new(0, 1, 0)));
    assert!(engine.damage_block(top, 1.0, ToolProfile::HAND));
    assert!(drops(&engine.drain_events()).is_empty());

    settle(&mut engine, Point3::new(4.0, 14.0, 4.0), now);
}

#[test]
fn test_switching_target_restores_health() {
    let (mut engine, _, _) = engine(small_config());
    let first = surface(&engine, 2, 2);
    let second = surface(&engine, 5, 5);
    let full = engine.world().get_block(first).unwrap().health();
    let second_full = engine.world().get_block(second).unwrap().health();

    let pickaxe = ToolProfile {
        rock: 4.0,
        wood: 1.0,
        dirt: 0.5,
    };
    assert!(!engine.damage_block(first, 0.5, pickaxe));
    assert_eq!(engine.world().get_block(first).unwrap().health(), full - 0.25);

    engine.damage_block(second, 0.5, pickaxe);
    assert_eq!(engine.world().get_block(first).unwrap().health(), full);
    assert_eq!(engine.damage_target(), Some(second));

    engine.stop_damaging();
    assert_eq!(engine.world().get_block(second).unwrap().health(), second_full);
    assert_eq!(engine.damage_target(), None);
}

#[test]
fn test_unbreakable_and_empty_targets_take_no_damage() {
    let (mut engine, _, _) = engine(small_config());
    let bedrock = Point3::new(1, 0, 1);
    assert!(!engine.damage_block(bedrock, 1000.0, ToolProfile::HAND));
    assert_eq!(
        engine.world().get_block(bedrock).unwrap().block_type(),
        BlockType::BEDROCK
    );
    let sky = Point3::new(1, 23, 1);
    assert!(!engine.damage_block(sky, 1.0, ToolProfile::HAND));
}

#[test]
fn test_burst_of_edits_runs_one_collision_rebuild() {
    let (mut engine, backend, builder) = engine(small_config());
    let player = Point3::new(4.0, 14.0, 4.0);
    let now = Instant::now();
    settle(&mut engine, player, now);

    assert_eq!(engine.collision().jobs_submitted(), 9);
    assert_eq!(engine.collision().swaps(), 9);
    assert_eq!(backend.body_count(), 9);
    for coord in engine.world().loaded_chunks() {
        assert_eq!(backend.bodies_for(coord).len(), 1);
    }

    let jobs = engine.collision().jobs_submitted();
    let builds = builder.build_count();
    let a = surface(&engine, 3, 3);
    let b = surface(&engine, 4, 4);
    assert!(engine.place_block(BlockType::STONE, a, Vector3::new(0, 1, 0)));
    assert!(engine.place_block(BlockType::STONE, b, Vector3::new(0, 1, 0)));
    assert_eq!(engine.pending_rebuilds(), 1);
    settle(&mut engine, player, now);

    assert_eq!(engine.collision().jobs_submitted(), jobs + 1);
    assert_eq!(engine.collision().swaps(), 10);
    assert_eq!(builder.build_count(), builds + 1);
    assert_eq!(backend.bodies_for(ChunkCoord::new(0, 0)).len(), 1);
    assert_eq!(backend.body_churn(), (10, 1));
    assert!(engine.lighting().dropped_triggers() >= 1);
}

#[test]
fn test_torch_lights_its_surroundings() {
    let config = WorldConfig {
        chunk_width: 16,
        chunk_height: 16,
        generation: GenerationMethod::Empty,
        start_hour: 0,
        worker_count: 1,
        ..WorldConfig::default()
    };
    let (mut engine, _, _) = engine(config);
    let player = Point3::new(8.0, 8.0, 8.0);
    let now = Instant::now();
    settle(&mut engine, player, now);

    assert!(engine.place_block(BlockType::TORCH, Point3::new(5, 9, 5), Vector3::new(0, 1, 0)));
    settle(&mut engine, player, now);

    let level = |p: Point3<i32>| engine.world().get_block(p).unwrap().light_level();
    assert!((level(Point3::new(5, 10, 5)) - 4.0).abs() < 1e-4);
    assert!(level(Point3::new(5, 10, 8)) >= 1.1);
    assert!((level(Point3::new(5, 10, 14)) - 1.3).abs() < 1e-4);
    assert_eq!(level(Point3::new(5, 10, 15)), 1.0);
    assert_eq!(level(Point3::new(-10, 10, 5)), 1.0);
}

#[test]
fn test_crafting_station_opens_the_ui() {
    let (mut engine, _, _) = engine(small_config());
    let top = surface(&engine, 2, 6);
    assert!(engine.place_block(BlockType::WORKBENCH, top, Vector3::new(0, 1, 0)));
    let bench = Point3::new(top.x, top.y + 1, top.z);
    engine.drain_events();

    assert!(engine.interact(bench));
    assert!(!engine.interact(top));
    assert_eq!(
        engine.drain_events(),
        vec![WorldEvent::OpenCraftingUi { position: bench }]
    );
}

#[test]
fn test_night_reports_spawn_candidates() {
    let (mut engine, _, _) = engine(small_config());
    let player = Point3::new(4.0, 14.0, 4.0);
    let now = Instant::now();
    settle(&mut engine, player, now);

    engine.set_time(22);
    settle(&mut engine, player, now);
    engine.drain_events();
    engine.set_time(23);

    let candidates: Vec<Point3<i32>> = engine
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            WorldEvent::MobSpawnCandidates { positions } => Some(positions),
            _ => None,
        })
        .flatten()
        .collect();
    assert!(!candidates.is_empty());
    for position in candidates {
        let block = engine.world().get_block(position).unwrap();
        assert!(!block.is_air());
        assert!(block.actual_light_level() < 1.5);
    }

    engine.set_time(12);
    assert!(!engine
        .drain_events()
        .iter()
        .any(|event| matches!(event, WorldEvent::MobSpawnCandidates { .. })));
}

#[test]
fn test_window_follows_the_player_and_reloads_records() {
    let (mut engine, backend, _) = engine(small_config());
    let start = Instant::now();
    let home = Point3::new(4.0, 14.0, 4.0);
    settle(&mut engine, home, start);
    let before = engine.world().chunk(ChunkCoord::new(-1, 0)).unwrap().to_record();

    // Stepping out briefly changes nothing.
    let east = Point3::new(12.0, 14.0, 4.0);
    engine.tick(east, start + Duration::from_millis(10));
    engine.tick(home, start + Duration::from_millis(100));
    engine.tick(east, start + Duration::from_millis(250));
    assert_eq!(engine.world().current_chunk(), ChunkCoord::new(0, 0));

    let later = start + Duration::from_millis(500);
    engine.tick(east, later);
    settle(&mut engine, east, later);
    assert_eq!(engine.world().current_chunk(), ChunkCoord::new(1, 0));
    assert_eq!(engine.world().loaded_chunks().len(), 9);
    assert!(!engine.world().is_chunk_loaded(ChunkCoord::new(-1, 0)));
    assert!(engine.world().is_chunk_loaded(ChunkCoord::new(2, 1)));
    for z in -1..=1 {
        assert!(backend.bodies_for(ChunkCoord::new(-1, z)).is_empty());
        assert_eq!(backend.bodies_for(ChunkCoord::new(2, z)).len(), 1);
    }
    let events = engine.drain_events();
    assert!(events.contains(&WorldEvent::ChunkUnloaded(ChunkCoord::new(-1, 0))));
    assert!(events.contains(&WorldEvent::MobsDespawnRequested {
        center: ChunkCoord::new(1, 0)
    }));

    let back = later + Duration::from_millis(10);
    engine.tick(home, back);
    engine.tick(home, back + Duration::from_millis(300));
    settle(&mut engine, home, back + Duration::from_millis(300));
    assert_eq!(engine.world().current_chunk(), ChunkCoord::new(0, 0));
    assert_eq!(engine.world().chunk_count(), 12);
    let after = engine.world().chunk(ChunkCoord::new(-1, 0)).unwrap().to_record();
    assert_eq!(after.blocks.len(), before.blocks.len());
    for (a, b) in after.blocks.iter().zip(&before.blocks) {
        assert_eq!(a.block_type, b.block_type);
        assert_eq!(a.health, b.health);
        assert_eq!(a.hidden, b.hidden);
    }
}

#[test]
fn test_engine_restores_from_a_record() {
    let (mut engine, _, _) = engine(small_config());
    let player = Point3::new(4.0, 14.0, 4.0);
    let now = Instant::now();
    let top = surface(&engine, 3, 4);
    engine.damage_block(top, 100.0, ToolProfile::HAND);
    settle(&mut engine, player, now);
    let record = engine.to_record();

    let backend = HeadlessBackend::new();
    let mut restored = EngineState::from_record(
        small_config(),
        record.clone(),
        Box::new(backend.clone()),
        Arc::new(BoxShapeBuilder::new()),
    )
    .unwrap();
    assert!(restored.world().get_block(top).unwrap().is_air());
    settle(&mut restored, player, now);
    assert_attached_matches_covered(&restored, &backend);
    assert_eq!(restored.to_record().chunks.len(), record.chunks.len());
}

#[test]
fn test_engine_refuses_a_config_without_workers() {
    let config = WorldConfig {
        worker_count: 0,
        ..small_config()
    };
    let result = EngineState::new(
        config,
        Box::new(HeadlessBackend::new()),
        Arc::new(BoxShapeBuilder::new()),
    );
    assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
}
