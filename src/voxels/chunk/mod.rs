//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a fixed-size 3D array of block
//! references plus the derived `empty`/`full` flags and the face-visibility
//! queries mesh generation is built on.
//!
//! ## Storage Layout
//!
//! Blocks are stored in one flat vector in row-major order, x fastest, then z,
//! then y:
//!
//! ```text
//! index = x + z * size_x + y * size_x * size_z
//! ```
//!
//! The same order is used by the file repository, so it must not change.
//!
//! ## Reads and Writes
//!
//! Writes outside the chunk are rejected with
//! [`ChunkError::InvalidCoordinate`]. Reads outside the chunk return no block:
//! neighbour probes routinely step one cell past the edge.

use std::sync::Arc;

use cgmath::{Point3, Vector3};

use crate::config::ChunkConfig;
use crate::error::{ChunkError, ChunkResult};
use crate::meshing::{ChunkMesh, MeshBuffer};

use super::block::{BlockRef, BlockSide};

pub mod chunk_iteration;
pub mod resolver;

pub use chunk_iteration::ChunkBlockIterator;
pub use resolver::{ChunkResolver, NeighbourChunks, NoNeighbours};

/// What sits on the other side of a block face.
#[derive(Debug, Clone, PartialEq)]
pub enum Neighbour {
    /// The neighbour lies in a chunk the resolver does not know.
    Unresolved,
    Empty,
    Block(BlockRef),
}

/// A fixed-size block of voxel data addressed by its chunk-grid location.
#[derive(Debug)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    location: Point3<i32>,
    size: Vector3<i32>,
    /// Block references in row-major order; `None` is an empty cell.
    ///
    /// Emptied when the chunk is released by the cache.
    blocks: Vec<Option<BlockRef>>,
    empty: bool,
    full: bool,
    mesh: Option<Arc<ChunkMesh>>,
    collision_mesh: Option<Arc<MeshBuffer>>,
}

impl Chunk {
    /// Creates a chunk with every cell empty.
    pub fn new(location: Point3<i32>, config: &ChunkConfig) -> Self {
        Chunk {
            location,
            size: config.chunk_size,
            blocks: vec![None; config.chunk_volume()],
            empty: true,
            full: false,
            mesh: None,
            collision_mesh: None,
        }
    }

    pub fn location(&self) -> Point3<i32> {
        self.location
    }

    pub fn size(&self) -> Vector3<i32> {
        self.size
    }

    /// Number of cells of the chunk.
    pub fn volume(&self) -> usize {
        (self.size.x * self.size.y * self.size.z) as usize
    }

    pub fn contains(&self, location: Point3<i32>) -> bool {
        (0..self.size.x).contains(&location.x)
            && (0..self.size.y).contains(&location.y)
            && (0..self.size.z).contains(&location.z)
    }

    /// Linear index of a local block location, `None` outside the chunk.
    pub fn index_of(&self, location: Point3<i32>) -> Option<usize> {
        if !self.contains(location) {
            return None;
        }
        Some(
            (location.x
                + location.z * self.size.x
                + location.y * self.size.x * self.size.z) as usize,
        )
    }

    /// Local block location of a linear index. Inverse of [`index_of`](Self::index_of).
    pub fn location_of(&self, index: usize) -> Point3<i32> {
        let index = index as i32;
        let plane = self.size.x * self.size.z;
        Point3::new(
            index % self.size.x,
            index / plane,
            (index % plane) / self.size.x,
        )
    }

    /// Writes a block at a local location.
    pub fn add_block(&mut self, location: Point3<i32>, block: BlockRef) -> ChunkResult<()> {
        self.set(location, Some(block)).map(|_| ())
    }

    /// Empties a cell and returns what was there.
    pub fn remove_block(&mut self, location: Point3<i32>) -> ChunkResult<Option<BlockRef>> {
        self.set(location, None)
    }

    fn set(&mut self, location: Point3<i32>, block: Option<BlockRef>) -> ChunkResult<Option<BlockRef>> {
        let index = self
            .index_of(location)
            .ok_or(ChunkError::InvalidCoordinate {
                location,
                size: self.size,
            })?;
        match self.blocks.get_mut(index) {
            Some(cell) => Ok(std::mem::replace(cell, block)),
            // The block array was released by the cache; nothing to write into.
            None => Ok(None),
        }
    }

    /// Block at a local location. Out-of-range locations hold no block.
    pub fn get_block(&self, location: Point3<i32>) -> Option<&BlockRef> {
        self.index_of(location)
            .and_then(|index| self.blocks.get(index))
            .and_then(Option::as_ref)
    }

    /// Block stored at a linear index.
    pub fn get_block_at_index(&self, index: usize) -> Option<&BlockRef> {
        self.blocks.get(index).and_then(Option::as_ref)
    }

    /// Recomputes the `empty` and `full` flags.
    ///
    /// Writes do not maintain the flags; call this after a batch of writes and
    /// before meshing.
    pub fn update(&mut self) {
        let occupied = self.blocks.iter().filter(|cell| cell.is_some()).count();
        self.empty = occupied == 0;
        self.full = !self.blocks.is_empty() && occupied == self.blocks.len();
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Empties every cell and drops the attached meshes.
    pub fn clear(&mut self) {
        self.blocks.iter_mut().for_each(|cell| *cell = None);
        self.mesh = None;
        self.collision_mesh = None;
        self.update();
    }

    /// Number of occupied cells.
    pub fn block_count(&self) -> usize {
        self.blocks.iter().filter(|cell| cell.is_some()).count()
    }

    /// Iterates over occupied cells in index order.
    pub fn iter_blocks(&self) -> ChunkBlockIterator<'_> {
        ChunkBlockIterator::new(self)
    }

    /// World block location of the chunk's first cell.
    pub fn world_origin(&self) -> Point3<i32> {
        Point3::new(
            self.location.x * self.size.x,
            self.location.y * self.size.y,
            self.location.z * self.size.z,
        )
    }

    /// World block location of a local block location.
    pub fn world_location(&self, local: Point3<i32>) -> Point3<i32> {
        let origin = self.world_origin();
        Point3::new(origin.x + local.x, origin.y + local.y, origin.z + local.z)
    }

    /// Local block location of a world block location inside this chunk.
    pub fn to_local_location(&self, world: Point3<i32>) -> Option<Point3<i32>> {
        let origin = self.world_origin();
        let local = Point3::new(world.x - origin.x, world.y - origin.y, world.z - origin.z);
        self.contains(local).then_some(local)
    }

    /// Chunk-grid location of the neighbouring chunk across a side.
    pub fn neighbour_location(&self, side: BlockSide) -> Point3<i32> {
        self.location + side.vector()
    }

    /// Looks up the block across one face of a local location.
    ///
    /// Faces on the chunk boundary are resolved through `resolver`; the
    /// neighbour chunk is only read-locked for the single lookup.
    pub fn get_neighbour_block(
        &self,
        location: Point3<i32>,
        side: BlockSide,
        resolver: &dyn ChunkResolver,
    ) -> Neighbour {
        let target = location + side.vector();
        if self.contains(target) {
            return match self.get_block(target) {
                Some(block) => Neighbour::Block(block.clone()),
                None => Neighbour::Empty,
            };
        }

        let Some(neighbour) = resolver.get_chunk(self.neighbour_location(side)) else {
            return Neighbour::Unresolved;
        };
        let wrapped = Point3::new(
            target.x.rem_euclid(self.size.x),
            target.y.rem_euclid(self.size.y),
            target.z.rem_euclid(self.size.z),
        );
        let neighbour = neighbour.get();
        match neighbour.get_block(wrapped) {
            Some(block) => Neighbour::Block(block.clone()),
            None => Neighbour::Empty,
        }
    }

    /// Whether the face of the block at `location` facing `side` must be drawn.
    ///
    /// A face is visible when the neighbour is empty, or transparent while
    /// this block is opaque, or not solid. A neighbour in a chunk the resolver
    /// cannot provide counts as visible, so the edge of the loaded area is
    /// closed rather than left with holes. Empty cells have no visible faces.
    pub fn is_face_visible(
        &self,
        location: Point3<i32>,
        side: BlockSide,
        resolver: &dyn ChunkResolver,
    ) -> bool {
        let Some(current) = self.get_block(location) else {
            return false;
        };

        match self.get_neighbour_block(location, side, resolver) {
            Neighbour::Unresolved | Neighbour::Empty => true,
            Neighbour::Block(neighbour) => {
                (neighbour.transparent && !current.transparent) || !neighbour.solid
            }
        }
    }

    /// Whether any face of the block at `location` is visible.
    pub fn is_block_on_surface(&self, location: Point3<i32>, resolver: &dyn ChunkResolver) -> bool {
        BlockSide::all()
            .into_iter()
            .any(|side| self.is_face_visible(location, side, resolver))
    }

    pub fn mesh(&self) -> Option<&Arc<ChunkMesh>> {
        self.mesh.as_ref()
    }

    pub fn collision_mesh(&self) -> Option<&Arc<MeshBuffer>> {
        self.collision_mesh.as_ref()
    }

    pub fn set_mesh(&mut self, mesh: Option<Arc<ChunkMesh>>) {
        self.mesh = mesh;
    }

    pub fn set_collision_mesh(&mut self, collision_mesh: Option<Arc<MeshBuffer>>) {
        self.collision_mesh = collision_mesh;
    }

    /// Whether the heavy fields were released.
    pub fn is_released(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Drops the block array, mesh and collision mesh.
    ///
    /// Reads on a released chunk see empty cells and no mesh.
    pub fn release(&mut self) {
        self.blocks = Vec::new();
        self.mesh = None;
        self.collision_mesh = None;
        self.empty = true;
        self.full = false;
    }
}
