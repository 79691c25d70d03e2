//! # Chunk Iteration Module
//!
//! Iteration over the occupied cells of a chunk in storage order.
//!
//! Mesh generation relies on this order: shapes append to shared buffers and
//! use the running buffer length as their index base, so walking the cells in
//! a fixed order makes the output deterministic.

use cgmath::Point3;

use crate::voxels::block::BlockRef;

use super::Chunk;

/// An iterator over all occupied cells of a chunk.
///
/// Yields the local location and block of every non-empty cell, skipping
/// empty ones, in increasing index order (x fastest, then z, then y).
pub struct ChunkBlockIterator<'a> {
    /// Reference to the chunk being iterated over
    chunk_ref: &'a Chunk,
    /// Next linear index to inspect
    current_index: usize,
}

impl<'a> ChunkBlockIterator<'a> {
    pub fn new(chunk_ref: &'a Chunk) -> Self {
        ChunkBlockIterator {
            chunk_ref,
            current_index: 0,
        }
    }
}

impl<'a> Iterator for ChunkBlockIterator<'a> {
    type Item = (Point3<i32>, &'a BlockRef);

    fn next(&mut self) -> Option<Self::Item> {
        while self.current_index < self.chunk_ref.volume() {
            let index = self.current_index;
            self.current_index += 1;

            if let Some(block) = self.chunk_ref.get_block_at_index(index) {
                return Some((self.chunk_ref.location_of(index), block));
            }
        }
        None
    }
}
