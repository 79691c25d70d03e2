//! # Voxel Data
//!
//! Block descriptors, chunk storage and the places chunk data comes from and
//! lives in:
//!
//! * `block` - block descriptors, faces and the block registry
//! * `chunk` - fixed-size block storage and face visibility
//! * `cache` - bounded recency-ordered chunk store with background release
//! * `generation` - procedural chunk generators
//! * `repository` - persisted chunk storage
//! * `tasks` - the chunk generation task run on the generation pool

pub mod block;
pub mod cache;
pub mod chunk;
pub mod generation;
pub mod repository;
pub mod tasks;
