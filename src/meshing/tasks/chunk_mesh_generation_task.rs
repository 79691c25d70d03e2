//! Task for generating mesh data for chunks in a background thread.

use std::sync::Arc;

use cgmath::Point3;

use crate::core::MtResource;
use crate::error::{ChunkError, ChunkResult};
use crate::meshing::{ChunkMesh, ChunkMeshGenerator, MeshBuffer};
use crate::task_management::task::Task;
use crate::voxels::chunk::{Chunk, NeighbourChunks};

/// A task that builds the render and collision meshes of one chunk.
///
/// The chunk is only read-locked while the meshes are built. The meshes are
/// attached by the control thread once the output arrives, so two workers
/// never write the same chunk's mesh fields.
pub struct ChunkMeshGenerationTask {
    location: Point3<i32>,
    ticket: u64,
    chunk: MtResource<Chunk>,
    /// Face-adjacent chunks as they were cached when the task was published.
    neighbours: NeighbourChunks,
    generator: Arc<dyn ChunkMeshGenerator>,
}

/// Meshes produced for a chunk.
pub struct ChunkMeshes {
    pub mesh: ChunkMesh,
    pub collision_mesh: MeshBuffer,
}

/// Output of a [`ChunkMeshGenerationTask`].
pub struct ChunkMeshGenerationOutput {
    pub location: Point3<i32>,
    pub ticket: u64,
    pub chunk: MtResource<Chunk>,
    pub result: ChunkResult<ChunkMeshes>,
}

impl ChunkMeshGenerationTask {
    pub fn new(
        location: Point3<i32>,
        ticket: u64,
        chunk: MtResource<Chunk>,
        neighbours: NeighbourChunks,
        generator: Arc<dyn ChunkMeshGenerator>,
    ) -> Self {
        ChunkMeshGenerationTask {
            location,
            ticket,
            chunk,
            neighbours,
            generator,
        }
    }

    fn build(&self) -> ChunkResult<ChunkMeshes> {
        let chunk = self.chunk.get();
        let mesh = self.generator.generate_mesh(&chunk, &self.neighbours)?;
        let collision_mesh = self
            .generator
            .generate_collision_mesh(&chunk, &self.neighbours)?;
        Ok(ChunkMeshes {
            mesh,
            collision_mesh,
        })
    }

    fn output(&self, result: ChunkResult<ChunkMeshes>) -> ChunkMeshGenerationOutput {
        ChunkMeshGenerationOutput {
            location: self.location,
            ticket: self.ticket,
            chunk: self.chunk.clone(),
            result,
        }
    }
}

impl Task for ChunkMeshGenerationTask {
    type Output = ChunkMeshGenerationOutput;

    fn process(&self) -> ChunkMeshGenerationOutput {
        let result = self.build().map_err(|e| match e {
            ChunkError::MeshingFailure { .. } => e,
            other => ChunkError::MeshingFailure {
                location: self.location,
                reason: other.to_string(),
            },
        });
        self.output(result)
    }

    fn fail(&self, reason: String) -> ChunkMeshGenerationOutput {
        self.output(Err(ChunkError::MeshingFailure {
            location: self.location,
            reason,
        }))
    }
}
