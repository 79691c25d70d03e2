//! # Mesh Generation
//!
//! Turns the block data of a chunk into render geometry grouped per block
//! type, plus a position-only collision buffer.
//!
//! Geometry is produced by [`Shape`] strategies looked up by id in a
//! [`ShapeRegistry`]. The stock [`FacesMeshGenerator`] walks a chunk in index
//! order and lets each block's shape append its visible faces.

mod faces;
mod mesh_buffer;
pub mod shapes;
pub mod tasks;

pub use faces::FacesMeshGenerator;
pub use mesh_buffer::{ChunkMesh, MeshBuffer};
pub use shapes::{Shape, ShapeInput, ShapeRegistry};

use crate::error::ChunkResult;
use crate::voxels::chunk::{Chunk, ChunkResolver};

/// Builds the meshes of a chunk.
///
/// Called from mesh worker threads with the chunk read-locked. `neighbours`
/// resolves the chunks across the boundary faces.
pub trait ChunkMeshGenerator: Send + Sync {
    fn generate_mesh(
        &self,
        chunk: &Chunk,
        neighbours: &dyn ChunkResolver,
    ) -> ChunkResult<ChunkMesh>;

    fn generate_collision_mesh(
        &self,
        chunk: &Chunk,
        neighbours: &dyn ChunkResolver,
    ) -> ChunkResult<MeshBuffer>;

    /// World units per block edge the generator emits, if it scales at all.
    /// The manager rejects a generator whose scale differs from its
    /// `ChunkConfig::block_scale`.
    fn block_scale(&self) -> Option<f32> {
        None
    }
}
