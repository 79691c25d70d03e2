//! Neighbour chunk lookup.
//!
//! Face culling on a chunk boundary needs the chunk on the other side. The
//! chunk never owns that knowledge: callers pass a [`ChunkResolver`] into the
//! query. On the control thread the [`ChunkCache`](crate::voxels::cache::ChunkCache)
//! is the resolver. Mesh tasks run on worker threads and cannot touch the
//! cache, so they carry a [`NeighbourChunks`] snapshot taken at dispatch.

use std::collections::HashMap;

use cgmath::Point3;

use crate::core::MtResource;
use crate::voxels::block::BlockSide;

use super::Chunk;

/// Answers "which chunk sits at this chunk-grid location".
pub trait ChunkResolver {
    /// The chunk at `location`, or `None` when it is not available.
    fn get_chunk(&self, location: Point3<i32>) -> Option<MtResource<Chunk>>;
}

/// A resolver that knows no chunks. Every boundary face is treated as visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNeighbours;

impl ChunkResolver for NoNeighbours {
    fn get_chunk(&self, _location: Point3<i32>) -> Option<MtResource<Chunk>> {
        None
    }
}

/// Handles to the face-adjacent chunks of one chunk.
#[derive(Default, Clone)]
pub struct NeighbourChunks {
    chunks: HashMap<Point3<i32>, MtResource<Chunk>>,
}

impl NeighbourChunks {
    /// Collects the six face-adjacent neighbours of `location` from `resolver`.
    pub fn collect(location: Point3<i32>, resolver: &dyn ChunkResolver) -> Self {
        let chunks = BlockSide::all()
            .into_iter()
            .map(|side| location + side.vector())
            .filter_map(|neighbour| resolver.get_chunk(neighbour).map(|chunk| (neighbour, chunk)))
            .collect();
        NeighbourChunks { chunks }
    }

    /// Builds a snapshot from explicit chunk handles, keyed by their locations.
    pub fn from_chunks(chunks: impl IntoIterator<Item = MtResource<Chunk>>) -> Self {
        let chunks = chunks
            .into_iter()
            .map(|chunk| {
                let location = chunk.get().location();
                (location, chunk)
            })
            .collect();
        NeighbourChunks { chunks }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl ChunkResolver for NeighbourChunks {
    fn get_chunk(&self, location: Point3<i32>) -> Option<MtResource<Chunk>> {
        self.chunks.get(&location).cloned()
    }
}
