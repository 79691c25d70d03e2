//! # Configuration
//!
//! Immutable settings created once at startup and passed to the chunk, cache,
//! manager and pager constructors. Nothing in the crate reads configuration
//! from a global; two managers with different chunk sizes can live in the same
//! process.
//!
//! Both structs can be loaded from JSON. Missing fields fall back to their
//! defaults:
//!
//! ```rust
//! use voxel_chunks::config::ChunkManagerConfig;
//!
//! let config = ChunkManagerConfig::from_json(r#"{ "mesh_workers": 4 }"#).unwrap();
//! assert_eq!(config.mesh_workers, 4);
//! assert_eq!(config.generation_workers, ChunkManagerConfig::default().generation_workers);
//! ```

use cgmath::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{ChunkError, ChunkResult};

/// The default edge length of a chunk in blocks.
pub const DEFAULT_CHUNK_DIMENSION: i32 = 32;
/// The default number of chunks along each edge of the paged grid.
pub const DEFAULT_GRID_SIZE: i32 = 9;

/// Chunk geometry shared by every chunk of one world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Size of a chunk in blocks along x, y and z.
    pub chunk_size: Vector3<i32>,
    /// Number of chunks along each edge of the grid kept around the pager centre.
    pub grid_size: i32,
    /// World units per block edge.
    pub block_scale: f32,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: Vector3::new(
                DEFAULT_CHUNK_DIMENSION,
                DEFAULT_CHUNK_DIMENSION,
                DEFAULT_CHUNK_DIMENSION,
            ),
            grid_size: DEFAULT_GRID_SIZE,
            block_scale: 1.0,
        }
    }
}

impl ChunkConfig {
    /// A config with cubic chunks of the given edge length and default grid.
    pub fn with_chunk_dimension(dimension: i32) -> Self {
        Self {
            chunk_size: Vector3::new(dimension, dimension, dimension),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> ChunkResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ChunkError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ChunkResult<()> {
        let size = self.chunk_size;
        if size.x <= 0 || size.y <= 0 || size.z <= 0 {
            return Err(ChunkError::InvalidConfig(format!(
                "chunk size must be positive, got {:?}",
                size
            )));
        }
        if self.grid_size <= 0 {
            return Err(ChunkError::InvalidConfig(format!(
                "grid size must be positive, got {}",
                self.grid_size
            )));
        }
        if !(self.block_scale > 0.0) {
            return Err(ChunkError::InvalidConfig(format!(
                "block scale must be positive, got {}",
                self.block_scale
            )));
        }
        Ok(())
    }

    /// Number of blocks in one chunk.
    pub fn chunk_volume(&self) -> usize {
        (self.chunk_size.x * self.chunk_size.y * self.chunk_size.z) as usize
    }

    /// Number of chunks in the paged grid, the default cache capacity.
    pub fn grid_volume(&self) -> usize {
        (self.grid_size * self.grid_size * self.grid_size) as usize
    }

    /// Chunk-grid location containing the given world position.
    pub fn chunk_location(&self, world: Point3<f32>) -> Point3<i32> {
        let edge = |size: i32| size as f32 * self.block_scale;
        Point3::new(
            (world.x / edge(self.chunk_size.x)).floor() as i32,
            (world.y / edge(self.chunk_size.y)).floor() as i32,
            (world.z / edge(self.chunk_size.z)).floor() as i32,
        )
    }

    /// World block location of the first block of a chunk.
    pub fn chunk_origin(&self, chunk_location: Point3<i32>) -> Point3<i32> {
        Point3::new(
            chunk_location.x * self.chunk_size.x,
            chunk_location.y * self.chunk_size.y,
            chunk_location.z * self.chunk_size.z,
        )
    }
}

/// What the manager does with a failed generation or meshing task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and call `on_chunk_failed` on every listener.
    #[default]
    Notify,
    /// Log the failure only.
    LogAndDrop,
}

/// Worker pool and cache settings of the chunk manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkManagerConfig {
    /// Worker threads generating or loading chunks.
    pub generation_workers: usize,
    /// Tasks a generation worker may hold at once; the rest wait in the pool queue.
    pub generation_queue_depth: usize,
    /// Worker threads building meshes.
    pub mesh_workers: usize,
    /// Tasks a mesh worker may hold at once.
    pub mesh_queue_depth: usize,
    /// Cache capacity. `None` uses the grid volume of the chunk config.
    pub cache_size: Option<usize>,
    /// Re-mesh cached neighbours when a chunk finishes generating.
    pub trigger_adjacent_chunk_updates: bool,
    /// Run cache maintenance at the end of every `update()`.
    pub maintain_cache_on_update: bool,
    pub failure_policy: FailurePolicy,
}

impl Default for ChunkManagerConfig {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2);
        Self {
            generation_workers: (parallelism / 2).max(1),
            generation_queue_depth: 1,
            mesh_workers: (parallelism / 2).max(1),
            mesh_queue_depth: 1,
            cache_size: None,
            trigger_adjacent_chunk_updates: true,
            maintain_cache_on_update: true,
            failure_policy: FailurePolicy::Notify,
        }
    }
}

impl ChunkManagerConfig {
    pub fn from_json(json: &str) -> ChunkResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ChunkError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ChunkResult<()> {
        if self.generation_workers == 0 || self.mesh_workers == 0 {
            return Err(ChunkError::InvalidConfig(
                "both worker pools need at least one thread".to_string(),
            ));
        }
        if self.generation_queue_depth == 0 || self.mesh_queue_depth == 0 {
            return Err(ChunkError::InvalidConfig(
                "queue depths must be at least one".to_string(),
            ));
        }
        if self.cache_size == Some(0) {
            return Err(ChunkError::InvalidConfig(
                "cache size must be at least one".to_string(),
            ));
        }
        Ok(())
    }

    /// Cache capacity resolved against the chunk config.
    pub fn resolved_cache_size(&self, chunk_config: &ChunkConfig) -> usize {
        self.cache_size.unwrap_or_else(|| chunk_config.grid_volume())
    }
}
