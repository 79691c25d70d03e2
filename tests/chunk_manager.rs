mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use cgmath::Point3;
use voxel_chunks::meshing::{FacesMeshGenerator, ShapeRegistry};
use voxel_chunks::voxels::block::BlockRegistry;
use voxel_chunks::voxels::chunk::Chunk;
use voxel_chunks::voxels::generation::{ChunkGenerator, FlatTerrainGenerator};
use voxel_chunks::voxels::repository::FileRepository;
use voxel_chunks::{
    ChunkError, ChunkManager, ChunkManagerConfig, ChunkResult, ChunkState, FailurePolicy,
};

use common::{chunk_config, manager, manager_config, settle, Recorder, ScriptedGenerator};

#[test]
fn single_cube_meshes_to_six_faces() {
    let generator = Arc::new(ScriptedGenerator::new().with_block(
        Point3::new(0, 0, 0),
        Point3::new(1, 1, 1),
        "stone",
    ));
    let mut manager = manager(manager_config(), generator);
    let recorder = Arc::new(Recorder::default());
    manager.add_listener(recorder.clone());

    manager.request_chunk(Point3::new(0, 0, 0)).unwrap();
    settle(&mut manager);

    assert_eq!(manager.chunk_state(Point3::new(0, 0, 0)), Some(ChunkState::Ready));
    let chunk = manager.get_chunk(Point3::new(0, 0, 0)).unwrap();
    let chunk = chunk.get();
    let mesh = chunk.mesh().unwrap();
    assert_eq!(mesh.triangle_count(), 12);
    assert_eq!(mesh.buffer("stone").unwrap().vertex_count(), 24);
    assert_eq!(chunk.collision_mesh().unwrap().triangle_count(), 12);
    assert_eq!(recorder.available(), vec![Point3::new(0, 0, 0)]);
    manager.cleanup();
}

#[test]
fn adjacent_chunks_hide_shared_faces() {
    let edge = common::CHUNK_DIMENSION - 1;
    let generator = Arc::new(
        ScriptedGenerator::new()
            .with_block(Point3::new(0, 0, 0), Point3::new(edge, 0, 0), "stone")
            .with_block(Point3::new(1, 0, 0), Point3::new(0, 0, 0), "stone"),
    );
    let mut manager = manager(manager_config(), generator);

    manager.request_chunk(Point3::new(0, 0, 0)).unwrap();
    manager.request_chunk(Point3::new(1, 0, 0)).unwrap();
    settle(&mut manager);

    for location in [Point3::new(0, 0, 0), Point3::new(1, 0, 0)] {
        let chunk = manager.get_chunk(location).unwrap();
        let triangles = chunk.get().mesh().unwrap().triangle_count();
        assert_eq!(triangles, 10, "chunk {:?}", location);
    }
    manager.cleanup();
}

#[test]
fn duplicate_requests_generate_once() {
    let generator = Arc::new(ScriptedGenerator::new().with_delay(Duration::from_millis(20)));
    let mut manager = manager(manager_config(), generator.clone());

    for _ in 0..3 {
        manager.request_chunk(Point3::new(2, 0, -1)).unwrap();
    }
    assert_eq!(manager.stats().requested_chunks, 1);
    settle(&mut manager);
    manager.request_chunk(Point3::new(2, 0, -1)).unwrap();
    settle(&mut manager);

    assert_eq!(generator.calls(), 1);
    manager.cleanup();
}

#[test]
fn failures_are_reported_and_can_be_retried() {
    let failing = Point3::new(5, 0, 0);
    let generator = Arc::new(ScriptedGenerator::new().failing_at(failing));
    let mut manager = manager(manager_config(), generator.clone());
    let recorder = Arc::new(Recorder::default());
    manager.add_listener(recorder.clone());

    manager.request_chunk(failing).unwrap();
    manager.request_chunk(Point3::new(0, 0, 0)).unwrap();
    settle(&mut manager);

    let failed = recorder.failed();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, failing);
    assert!(matches!(failed[0].1, ChunkError::GenerationFailure { .. }));
    assert_eq!(manager.chunk_state(failing), None);
    assert!(manager.get_chunk(failing).is_none());
    assert_eq!(manager.chunk_state(Point3::new(0, 0, 0)), Some(ChunkState::Ready));

    manager.request_chunk(failing).unwrap();
    settle(&mut manager);
    assert_eq!(recorder.failed().len(), 2);
    assert_eq!(generator.calls(), 3);
    manager.cleanup();
}

#[test]
fn log_and_drop_skips_the_failure_callback() {
    let failing = Point3::new(0, 0, 0);
    let config = ChunkManagerConfig {
        failure_policy: FailurePolicy::LogAndDrop,
        ..manager_config()
    };
    let mut manager = manager(config, Arc::new(ScriptedGenerator::new().failing_at(failing)));
    let recorder = Arc::new(Recorder::default());
    manager.add_listener(recorder.clone());

    manager.request_chunk(failing).unwrap();
    settle(&mut manager);

    assert!(recorder.failed().is_empty());
    assert_eq!(manager.chunk_state(failing), None);
    manager.cleanup();
}

struct Panics;

impl ChunkGenerator for Panics {
    fn generate(&self, _location: Point3<i32>) -> ChunkResult<Chunk> {
        panic!("generator exploded");
    }
}

#[test]
fn worker_panics_become_generation_failures() {
    let mut manager = manager(manager_config(), Arc::new(Panics));
    let recorder = Arc::new(Recorder::default());
    manager.add_listener(recorder.clone());

    manager.request_chunk(Point3::new(0, 0, 0)).unwrap();
    settle(&mut manager);

    let failed = recorder.failed();
    assert_eq!(failed.len(), 1);
    assert!(matches!(
        &failed[0].1,
        ChunkError::GenerationFailure { reason, .. } if reason.contains("generator exploded")
    ));
    manager.cleanup();
}

#[test]
fn removed_chunk_discards_late_results() {
    let generator = Arc::new(ScriptedGenerator::new().with_delay(Duration::from_millis(50)));
    let mut manager = manager(manager_config(), generator.clone());
    let recorder = Arc::new(Recorder::default());
    manager.add_listener(recorder.clone());

    manager.request_chunk(Point3::new(0, 0, 0)).unwrap();
    assert!(manager.remove_chunk(Point3::new(0, 0, 0)));
    settle(&mut manager);

    assert_eq!(generator.calls(), 1);
    assert_eq!(manager.chunk_state(Point3::new(0, 0, 0)), None);
    assert!(manager.get_chunk(Point3::new(0, 0, 0)).is_none());
    assert!(recorder.available().is_empty());
    manager.cleanup();
}

#[test]
fn removing_a_ready_chunk_releases_its_meshes() {
    let generator = Arc::new(ScriptedGenerator::new().with_block(
        Point3::new(0, 0, 0),
        Point3::new(2, 2, 2),
        "stone",
    ));
    let mut manager = manager(manager_config(), generator);
    manager.request_chunk(Point3::new(0, 0, 0)).unwrap();
    settle(&mut manager);

    let chunk = manager.get_chunk(Point3::new(0, 0, 0)).unwrap();
    assert!(chunk.get().mesh().is_some());
    assert!(chunk.get().collision_mesh().is_some());

    assert!(manager.remove_chunk_for(&chunk));
    assert_eq!(manager.chunk_state(Point3::new(0, 0, 0)), None);
    let deadline = Instant::now() + Duration::from_secs(5);
    while !chunk.get().is_released() {
        assert!(Instant::now() < deadline, "removed chunk was not released");
        std::thread::sleep(Duration::from_millis(1));
    }

    let released = chunk.get();
    assert!(released.mesh().is_none());
    assert!(released.collision_mesh().is_none());
    assert!(released.get_block(Point3::new(2, 2, 2)).is_none());
    drop(released);
    manager.cleanup();
}

#[test]
fn maintenance_keeps_the_cache_bounded() {
    let config = ChunkManagerConfig {
        cache_size: Some(2),
        trigger_adjacent_chunk_updates: false,
        ..manager_config()
    };
    let mut manager = manager(config, Arc::new(ScriptedGenerator::new()));

    for x in 0..6 {
        manager.request_chunk(Point3::new(x * 10, 0, 0)).unwrap();
    }
    settle(&mut manager);
    manager.update();

    assert!(manager.cache().len() <= 2);
    assert!(manager.stats().requested_chunks <= 2);
    manager.cleanup();
}

#[test]
fn chunks_round_trip_through_the_repository() {
    let directory = tempfile::tempdir().unwrap();
    let blocks = Arc::new(BlockRegistry::with_defaults());
    let repository = Arc::new(
        FileRepository::new(directory.path(), blocks.clone(), chunk_config()).unwrap(),
    );
    let generator = FlatTerrainGenerator::new(
        chunk_config(),
        2,
        blocks.require("grass").unwrap(),
        blocks.require("dirt").unwrap(),
        blocks.require("stone").unwrap(),
    );

    let mut first =
        manager(manager_config(), Arc::new(generator)).with_repository(repository.clone());
    first.request_chunk(Point3::new(0, 0, 0)).unwrap();
    settle(&mut first);
    assert_eq!(first.save_chunk(Point3::new(0, 0, 0)), Ok(true));
    assert_eq!(first.save_chunk(Point3::new(9, 9, 9)), Ok(false));
    first.cleanup();

    let mesher = Arc::new(FacesMeshGenerator::new(Arc::new(ShapeRegistry::default()), 1.0));
    let mut second =
        ChunkManager::new(manager_config(), chunk_config(), mesher).with_repository(repository);
    second.initialize().unwrap();
    second.request_chunk(Point3::new(0, 0, 0)).unwrap();
    settle(&mut second);

    let loaded = second.get_chunk(Point3::new(0, 0, 0)).unwrap();
    let loaded = loaded.get();
    assert_eq!(loaded.block_count(), 2 * 16);
    assert_eq!(loaded.get_block(Point3::new(0, 1, 0)).unwrap().name, "grass");
    assert_eq!(loaded.get_block(Point3::new(3, 0, 3)).unwrap().name, "dirt");
    assert!(loaded.get_block(Point3::new(0, 2, 0)).is_none());
    second.cleanup();
}
