//! # Core Module
//!
//! Concurrency primitives shared by the rest of the crate.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking.
//!   Chunks travel between the control thread, the worker pools and the cache
//!   cleaner as `MtResource<Chunk>` handles.

pub mod mt_resource;

pub use mt_resource::MtResource;
