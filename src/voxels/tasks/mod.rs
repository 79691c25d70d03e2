//! # Voxel Task System
//!
//! Tasks that produce chunk data on the generation pool.

pub mod chunk_generation_task;

pub use chunk_generation_task::{ChunkGenerationOutput, ChunkGenerationTask};
