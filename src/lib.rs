#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Chunks
//!
//! Chunk storage, generation, caching and meshing for voxel worlds.
//!
//! A voxel world is cut into fixed-size chunks addressed by integer grid
//! locations. This crate keeps those chunks in a bounded cache, produces them
//! on a generation worker pool (from a repository, a procedural generator or
//! empty), builds their render and collision meshes on a mesh worker pool,
//! and reports finished chunks to listeners on the control thread.
//!
//! ## Key Modules
//!
//! * `config` - chunk geometry and manager settings
//! * `core` - the shared lock handle chunks travel in
//! * `voxels` - blocks, chunks, the cache, generators and repositories
//! * `meshing` - shapes, mesh buffers and the face mesher
//! * `task_management` - the worker pools
//! * `manager` - the request pipeline tying everything together
//! * `pager` - keeps a grid of chunks requested around a moving centre
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//!
//! use cgmath::Point3;
//! use voxel_chunks::config::{ChunkConfig, ChunkManagerConfig};
//! use voxel_chunks::manager::{ChunkManager, ChunkState};
//! use voxel_chunks::meshing::{FacesMeshGenerator, ShapeRegistry};
//! use voxel_chunks::voxels::block::BlockRegistry;
//! use voxel_chunks::voxels::generation::FlatTerrainGenerator;
//!
//! let chunk_config = ChunkConfig::with_chunk_dimension(8);
//! let blocks = BlockRegistry::with_defaults();
//! let generator = FlatTerrainGenerator::new(
//!     chunk_config,
//!     4,
//!     blocks.require("grass").unwrap(),
//!     blocks.require("dirt").unwrap(),
//!     blocks.require("stone").unwrap(),
//! );
//! let mesher = FacesMeshGenerator::new(Arc::new(ShapeRegistry::default()), 1.0);
//!
//! let mut manager = ChunkManager::new(ChunkManagerConfig::default(), chunk_config, Arc::new(mesher))
//!     .with_generator(Arc::new(generator));
//! manager.initialize().unwrap();
//! manager.request_chunk(Point3::new(0, 0, 0)).unwrap();
//!
//! let deadline = Instant::now() + Duration::from_secs(5);
//! while manager.chunk_state(Point3::new(0, 0, 0)) != Some(ChunkState::Ready)
//!     && Instant::now() < deadline
//! {
//!     manager.update();
//!     std::thread::sleep(Duration::from_millis(1));
//! }
//! manager.cleanup();
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod manager;
pub mod meshing;
pub mod pager;
pub mod task_management;
pub mod voxels;

pub use config::{ChunkConfig, ChunkManagerConfig, FailurePolicy};
pub use error::{ChunkError, ChunkResult};
pub use manager::{ChunkListener, ChunkManager, ChunkManagerStats, ChunkState};
pub use pager::ChunkPager;
