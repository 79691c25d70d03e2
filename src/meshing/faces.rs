//! Face-culled mesh generation.
//!
//! Walks the occupied cells of a chunk in index order and lets each block's
//! shape append its visible faces to the buffer of the block's type.

use std::sync::Arc;

use log::debug;
use web_time::Instant;

use crate::config::ChunkConfig;
use crate::error::{ChunkError, ChunkResult};
use crate::voxels::chunk::{Chunk, ChunkResolver};

use super::shapes::{Shape, ShapeInput, ShapeRegistry};
use super::{ChunkMesh, ChunkMeshGenerator, MeshBuffer};

/// Builds one buffer per block type by dispatching every cell to its shape.
#[derive(Clone)]
pub struct FacesMeshGenerator {
    shapes: Arc<ShapeRegistry>,
    block_scale: f32,
}

impl FacesMeshGenerator {
    pub fn new(shapes: Arc<ShapeRegistry>, block_scale: f32) -> Self {
        FacesMeshGenerator {
            shapes,
            block_scale,
        }
    }

    /// A generator using the block scale of the chunk config.
    pub fn from_config(shapes: Arc<ShapeRegistry>, config: &ChunkConfig) -> Self {
        Self::new(shapes, config.block_scale)
    }

    fn shape_for(&self, chunk: &Chunk, id: &str) -> ChunkResult<&Arc<dyn Shape>> {
        self.shapes.get(id).map_err(|e| ChunkError::MeshingFailure {
            location: chunk.location(),
            reason: e.to_string(),
        })
    }
}

impl ChunkMeshGenerator for FacesMeshGenerator {
    fn generate_mesh(
        &self,
        chunk: &Chunk,
        neighbours: &dyn ChunkResolver,
    ) -> ChunkResult<ChunkMesh> {
        let start = Instant::now();
        let mut mesh = ChunkMesh::new();

        for (location, block) in chunk.iter_blocks() {
            let shape = self.shape_for(chunk, &block.shape)?;
            let input = ShapeInput {
                location,
                chunk,
                block,
                neighbours,
                block_scale: self.block_scale,
            };
            shape.add(&input, mesh.buffer_mut(&block.block_type));
        }

        mesh.prune_empty();
        debug!(
            "Meshed chunk {:?}: {} triangles in {} buffers ({:?})",
            chunk.location(),
            mesh.triangle_count(),
            mesh.buffers().count(),
            start.elapsed()
        );
        Ok(mesh)
    }

    fn generate_collision_mesh(
        &self,
        chunk: &Chunk,
        neighbours: &dyn ChunkResolver,
    ) -> ChunkResult<MeshBuffer> {
        let mut buffer = MeshBuffer::collision();
        for (location, block) in chunk.iter_blocks().filter(|(_, block)| block.solid) {
            let shape = self.shape_for(chunk, &block.shape)?;
            let input = ShapeInput {
                location,
                chunk,
                block,
                neighbours,
                block_scale: self.block_scale,
            };
            shape.add(&input, &mut buffer);
        }
        Ok(buffer)
    }

    fn block_scale(&self) -> Option<f32> {
        Some(self.block_scale)
    }
}
