use cgmath::Point3;

use crate::core::MtResource;
use crate::error::ChunkError;
use crate::voxels::chunk::Chunk;

/// Receives chunk lifecycle events from [`ChunkManager::update`].
///
/// Every callback runs on the thread calling `update()`, never on a worker,
/// so implementations may touch state that is not thread-safe. The chunk is
/// passed as a handle; take its lock only for as long as needed.
///
/// [`ChunkManager::update`]: super::ChunkManager::update
pub trait ChunkListener {
    /// The chunk received its first mesh.
    fn on_chunk_available(&self, _chunk: &MtResource<Chunk>) {}

    /// The chunk was meshed again.
    fn on_chunk_updated(&self, _chunk: &MtResource<Chunk>) {}

    /// Generating or meshing the chunk failed. The location is unrequested
    /// again and may be retried.
    fn on_chunk_failed(&self, _location: Point3<i32>, _error: &ChunkError) {}
}
