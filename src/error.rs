//! Error handling for the chunk pipeline.
//!
//! Chunk and cache level problems are recovered where they happen (reads past
//! the edge return empty cells, evicting a missing chunk does nothing). The
//! variants below are the ones that actually travel: invalid writes, worker
//! failures that are reported back to the control thread, repository I/O and
//! registry/configuration mistakes.

use cgmath::{Point3, Vector3};

/// Result type used across the crate.
pub type ChunkResult<T> = Result<T, ChunkError>;

/// Errors raised by the chunk pipeline.
///
/// The type is `Clone` so a single failure can be handed to every registered
/// listener.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChunkError {
    #[error("block location {location:?} is outside the chunk bounds {size:?}")]
    InvalidCoordinate {
        location: Point3<i32>,
        size: Vector3<i32>,
    },

    #[error("chunk generation failed at {location:?}: {reason}")]
    GenerationFailure {
        location: Point3<i32>,
        reason: String,
    },

    #[error("chunk meshing failed at {location:?}: {reason}")]
    MeshingFailure {
        location: Point3<i32>,
        reason: String,
    },

    #[error("chunk repository i/o failure: {0}")]
    RepositoryIo(String),

    #[error("unknown block `{0}`")]
    UnknownBlock(String),

    #[error("block `{0}` is already registered")]
    DuplicateBlock(String),

    #[error("unknown shape `{0}`")]
    UnknownShape(String),

    #[error("chunk manager is not initialized")]
    NotInitialized,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ChunkError {
    /// Location the error is attached to, if any.
    pub fn location(&self) -> Option<Point3<i32>> {
        match self {
            ChunkError::InvalidCoordinate { location, .. }
            | ChunkError::GenerationFailure { location, .. }
            | ChunkError::MeshingFailure { location, .. } => Some(*location),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ChunkError {
    fn from(error: std::io::Error) -> Self {
        ChunkError::RepositoryIo(error.to_string())
    }
}

impl From<serde_json::Error> for ChunkError {
    fn from(error: serde_json::Error) -> Self {
        ChunkError::RepositoryIo(error.to_string())
    }
}
