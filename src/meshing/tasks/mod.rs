//! Background tasks for mesh generation.
//!
//! # Available Tasks
//! - `ChunkMeshGenerationTask`: Builds the meshes of one chunk on the mesh pool

pub mod chunk_mesh_generation_task;

pub use chunk_mesh_generation_task::{
    ChunkMeshGenerationOutput, ChunkMeshGenerationTask, ChunkMeshes,
};
