#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cgmath::Point3;
use voxel_chunks::core::MtResource;
use voxel_chunks::meshing::{FacesMeshGenerator, ShapeRegistry};
use voxel_chunks::voxels::block::{Block, BlockRef};
use voxel_chunks::voxels::chunk::Chunk;
use voxel_chunks::voxels::generation::ChunkGenerator;
use voxel_chunks::{
    ChunkConfig, ChunkError, ChunkListener, ChunkManager, ChunkManagerConfig, ChunkResult,
};

pub const CHUNK_DIMENSION: i32 = 4;

pub fn chunk_config() -> ChunkConfig {
    ChunkConfig::with_chunk_dimension(CHUNK_DIMENSION)
}

pub fn manager_config() -> ChunkManagerConfig {
    ChunkManagerConfig {
        generation_workers: 2,
        mesh_workers: 2,
        cache_size: Some(64),
        ..ChunkManagerConfig::default()
    }
}

pub fn manager(config: ChunkManagerConfig, generator: Arc<dyn ChunkGenerator>) -> ChunkManager {
    voxel_chunks::logging::init();
    let mesher = Arc::new(FacesMeshGenerator::new(Arc::new(ShapeRegistry::default()), 1.0));
    let mut manager = ChunkManager::new(config, chunk_config(), mesher).with_generator(generator);
    manager.initialize().unwrap();
    manager
}

/// Runs `update()` until nothing is pending or in flight.
pub fn settle(manager: &mut ChunkManager) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        manager.update();
        let stats = manager.stats();
        if stats.tasks_in_flight == 0
            && stats.tasks_queued == 0
            && stats.generation_pending == 0
            && stats.mesh_pending == 0
        {
            return;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    panic!("chunk manager did not settle: {:?}", manager.stats());
}

/// Places given blocks per chunk location and counts its calls.
pub struct ScriptedGenerator {
    blocks: Vec<(Point3<i32>, Point3<i32>, BlockRef)>,
    failing: Vec<Point3<i32>>,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        ScriptedGenerator {
            blocks: Vec::new(),
            failing: Vec::new(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_block(mut self, chunk: Point3<i32>, local: Point3<i32>, name: &str) -> Self {
        self.blocks.push((chunk, local, Arc::new(Block::cube(name))));
        self
    }

    pub fn failing_at(mut self, chunk: Point3<i32>) -> Self {
        self.failing.push(chunk);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChunkGenerator for ScriptedGenerator {
    fn generate(&self, location: Point3<i32>) -> ChunkResult<Chunk> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        if self.failing.contains(&location) {
            return Err(ChunkError::GenerationFailure {
                location,
                reason: "scripted failure".to_string(),
            });
        }

        let mut chunk = Chunk::new(location, &chunk_config());
        for (chunk_location, local, block) in &self.blocks {
            if *chunk_location == location {
                chunk.add_block(*local, block.clone())?;
            }
        }
        Ok(chunk)
    }
}

/// Records every listener callback.
#[derive(Default)]
pub struct Recorder {
    pub available: Mutex<Vec<Point3<i32>>>,
    pub updated: Mutex<Vec<Point3<i32>>>,
    pub failed: Mutex<Vec<(Point3<i32>, ChunkError)>>,
}

impl Recorder {
    pub fn available(&self) -> Vec<Point3<i32>> {
        self.available.lock().unwrap().clone()
    }

    pub fn failed(&self) -> Vec<(Point3<i32>, ChunkError)> {
        self.failed.lock().unwrap().clone()
    }
}

impl ChunkListener for Recorder {
    fn on_chunk_available(&self, chunk: &MtResource<Chunk>) {
        self.available.lock().unwrap().push(chunk.get().location());
    }

    fn on_chunk_updated(&self, chunk: &MtResource<Chunk>) {
        self.updated.lock().unwrap().push(chunk.get().location());
    }

    fn on_chunk_failed(&self, location: Point3<i32>, error: &ChunkError) {
        self.failed.lock().unwrap().push((location, error.clone()));
    }
}
