//! # Chunk Generation
//!
//! Procedural sources of chunk data. A generator is called from generation
//! worker threads, possibly for several locations at once, so implementations
//! are `Send + Sync` and keep no per-call mutable state.
//!
//! ## Stock Generators
//! - [`FlatTerrainGenerator`]: layered ground below a fixed height
//! - [`NoiseTerrainGenerator`]: 3D Perlin noise with caves and overhangs
//! - [`PatternGenerator`]: solid, checkerboard and random test patterns

use cgmath::Point3;

use crate::error::ChunkResult;
use crate::voxels::chunk::Chunk;

mod flat;
mod noise_terrain;
mod pattern;

pub use flat::FlatTerrainGenerator;
pub use noise_terrain::NoiseTerrainGenerator;
pub use pattern::{Pattern, PatternGenerator};

/// Produces the block data of a chunk.
pub trait ChunkGenerator: Send + Sync {
    /// Builds the chunk at a chunk-grid location.
    ///
    /// The returned chunk must be located at `location`. Flags are recomputed
    /// by the caller.
    fn generate(&self, location: Point3<i32>) -> ChunkResult<Chunk>;
}
