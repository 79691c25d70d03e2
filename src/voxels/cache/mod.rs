//! # Chunk Cache
//!
//! A bounded map from chunk location to chunk, ordered by recency.
//!
//! Inserts are never refused: the capacity is enforced separately by
//! [`ChunkCache::maintain`], which the manager runs once per tick. Evicted
//! chunks are handed to a [`ChunkCleaner`] so the caller never pays for
//! dropping their data.
//!
//! The cache belongs to the control thread. It is also the
//! [`ChunkResolver`] for face visibility queries made there.

use cgmath::Point3;
use log::debug;
use lru::LruCache;

use crate::core::MtResource;
use crate::voxels::chunk::{Chunk, ChunkResolver};

mod cleaner;

pub use cleaner::ChunkCleaner;

pub struct ChunkCache {
    chunks: LruCache<Point3<i32>, MtResource<Chunk>>,
    max_size: usize,
    cleaner: ChunkCleaner,
}

impl ChunkCache {
    pub fn new(max_size: usize) -> Self {
        ChunkCache {
            chunks: LruCache::unbounded(),
            max_size: max_size.max(1),
            cleaner: ChunkCleaner::new(),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Inserts a chunk under its own location, replacing any previous entry.
    ///
    /// A replaced chunk is released unless it is the same handle.
    pub fn put(&mut self, chunk: MtResource<Chunk>) {
        let location = chunk.get().location();
        if let Some(previous) = self.chunks.put(location, chunk.clone()) {
            if !previous.ptr_eq(&chunk) {
                self.cleaner.release(previous);
            }
        }
    }

    /// The chunk at `location`, marking it as recently used.
    pub fn get(&mut self, location: Point3<i32>) -> Option<MtResource<Chunk>> {
        self.chunks.get(&location).cloned()
    }

    /// The chunk at `location` without touching its recency.
    pub fn peek(&self, location: Point3<i32>) -> Option<MtResource<Chunk>> {
        self.chunks.peek(&location).cloned()
    }

    pub fn contains(&self, location: Point3<i32>) -> bool {
        self.chunks.contains(&location)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Locations of every cached chunk, most recently used first.
    pub fn locations(&self) -> Vec<Point3<i32>> {
        self.chunks.iter().map(|(location, _)| *location).collect()
    }

    /// Evicts least recently used chunks until the cache is within capacity.
    ///
    /// Returns the evicted locations, oldest first.
    pub fn maintain(&mut self) -> Vec<Point3<i32>> {
        let mut evicted = Vec::new();
        while self.chunks.len() > self.max_size {
            let Some((location, chunk)) = self.chunks.pop_lru() else {
                break;
            };
            self.cleaner.release(chunk);
            evicted.push(location);
        }
        if !evicted.is_empty() {
            debug!("Cache maintenance evicted {} chunks", evicted.len());
        }
        evicted
    }

    /// Removes a chunk and schedules its release. Missing locations are ignored.
    pub fn evict(&mut self, location: Point3<i32>) -> bool {
        match self.chunks.pop(&location) {
            Some(chunk) => {
                self.cleaner.release(chunk);
                true
            }
            None => false,
        }
    }

    /// Removes every chunk and schedules their release.
    pub fn evict_all(&mut self) {
        while let Some((_, chunk)) = self.chunks.pop_lru() {
            self.cleaner.release(chunk);
        }
    }
}

impl ChunkResolver for ChunkCache {
    fn get_chunk(&self, location: Point3<i32>) -> Option<MtResource<Chunk>> {
        self.peek(location)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::config::ChunkConfig;
    use crate::meshing::{ChunkMesh, MeshBuffer};
    use crate::voxels::block::Block;

    fn chunk(x: i32) -> MtResource<Chunk> {
        MtResource::new(Chunk::new(Point3::new(x, 0, 0), &ChunkConfig::with_chunk_dimension(2)))
    }

    fn wait_for_release(chunk: &MtResource<Chunk>) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if chunk.get().is_released() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn maintain_trims_to_capacity() {
        let mut cache = ChunkCache::new(4);
        for x in 0..8 {
            cache.put(chunk(x));
        }
        assert_eq!(cache.len(), 8);
        cache.maintain();
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn maintain_evicts_least_recently_used() {
        let mut cache = ChunkCache::new(2);
        cache.put(chunk(0));
        cache.put(chunk(1));
        cache.put(chunk(2));
        cache.get(Point3::new(0, 0, 0));

        assert_eq!(cache.maintain(), vec![Point3::new(1, 0, 0)]);
        assert!(cache.contains(Point3::new(0, 0, 0)));
        assert!(cache.contains(Point3::new(2, 0, 0)));
        assert!(cache.maintain().is_empty());
    }

    #[test]
    fn peek_does_not_touch_recency() {
        let mut cache = ChunkCache::new(1);
        cache.put(chunk(0));
        cache.put(chunk(1));
        cache.peek(Point3::new(0, 0, 0));
        assert_eq!(cache.maintain(), vec![Point3::new(0, 0, 0)]);
    }

    #[test]
    fn evict_releases_asynchronously() {
        let mut cache = ChunkCache::new(4);
        let evicted = chunk(0);
        {
            let mut chunk = evicted.get_mut();
            chunk
                .add_block(Point3::new(0, 0, 0), Arc::new(Block::cube("stone")))
                .unwrap();
            let mut mesh = ChunkMesh::new();
            mesh.buffer_mut("stone");
            chunk.set_mesh(Some(Arc::new(mesh)));
            chunk.set_collision_mesh(Some(Arc::new(MeshBuffer::collision())));
        }
        cache.put(evicted.clone());
        assert!(evicted.get().mesh().is_some());
        assert!(evicted.get().collision_mesh().is_some());

        assert!(cache.evict(Point3::new(0, 0, 0)));
        assert!(cache.get(Point3::new(0, 0, 0)).is_none());
        assert!(wait_for_release(&evicted));

        let released = evicted.get();
        assert!(released.get_block(Point3::new(0, 0, 0)).is_none());
        assert!(released.mesh().is_none());
        assert!(released.collision_mesh().is_none());
    }

    #[test]
    fn missing_locations_are_no_ops() {
        let mut cache = ChunkCache::new(4);
        assert!(!cache.evict(Point3::new(9, 9, 9)));
        assert!(cache.get(Point3::new(9, 9, 9)).is_none());
        assert!(cache.get_chunk(Point3::new(9, 9, 9)).is_none());
    }

    #[test]
    fn replacing_a_chunk_releases_the_old_one() {
        let mut cache = ChunkCache::new(4);
        let old = chunk(0);
        cache.put(old.clone());
        cache.put(old.clone());
        assert!(!old.get().is_released());

        cache.put(chunk(0));
        assert_eq!(cache.len(), 1);
        assert!(wait_for_release(&old));
    }

    #[test]
    fn evict_all_empties_the_cache() {
        let mut cache = ChunkCache::new(4);
        let chunks: Vec<_> = (0..3).map(chunk).collect();
        for c in &chunks {
            cache.put(c.clone());
        }
        cache.evict_all();
        assert!(cache.is_empty());
        assert!(chunks.iter().all(wait_for_release));
    }
}
