//! Block registry.
//!
//! The registry is filled during startup and then shared read-only, usually
//! behind an `Arc`. Lookups never lock.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use super::{Block, BlockRef, SHAPE_SLAB};
use crate::error::{ChunkError, ChunkResult};

pub const GRASS: &str = "grass";
pub const DIRT: &str = "dirt";
pub const STONE: &str = "stone";
pub const SAND: &str = "sand";
pub const WATER: &str = "water";
pub const GLASS: &str = "glass";
pub const STONE_SLAB: &str = "stone_slab";

/// Maps block names to shared block handles.
#[derive(Debug, Default)]
pub struct BlockRegistry {
    blocks: HashMap<String, BlockRef>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the stock terrain blocks.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let defaults = [
            Block::cube(GRASS).with_multiple_images(true),
            Block::cube(DIRT),
            Block::cube(STONE),
            Block::cube(SAND),
            Block::cube(WATER).with_solid(false).with_transparent(true),
            Block::cube(GLASS).with_transparent(true),
            Block::cube(STONE_SLAB)
                .with_type(STONE)
                .with_shape(SHAPE_SLAB)
                .with_transparent(true),
        ];
        for block in defaults {
            // The stock names are unique, registration cannot collide.
            let _ = registry.register(block);
        }
        registry
    }

    /// Registers a block under its name and returns the shared handle.
    pub fn register(&mut self, block: Block) -> ChunkResult<BlockRef> {
        if self.blocks.contains_key(&block.name) {
            return Err(ChunkError::DuplicateBlock(block.name));
        }
        debug!("Registering block {:?}", block.name);
        let block = Arc::new(block);
        self.blocks.insert(block.name.clone(), block.clone());
        Ok(block)
    }

    /// Registers every block of a JSON array of block descriptors.
    ///
    /// Either all blocks are registered or, on the first error, none are.
    pub fn register_json(&mut self, json: &str) -> ChunkResult<Vec<BlockRef>> {
        let blocks: Vec<Block> =
            serde_json::from_str(json).map_err(|e| ChunkError::InvalidConfig(e.to_string()))?;

        for (i, block) in blocks.iter().enumerate() {
            if self.blocks.contains_key(&block.name)
                || blocks[..i].iter().any(|other| other.name == block.name)
            {
                return Err(ChunkError::DuplicateBlock(block.name.clone()));
            }
        }

        blocks.into_iter().map(|block| self.register(block)).collect()
    }

    pub fn get(&self, name: &str) -> Option<BlockRef> {
        self.blocks.get(name).cloned()
    }

    /// Like [`get`](Self::get) but reports unknown names as an error.
    pub fn require(&self, name: &str) -> ChunkResult<BlockRef> {
        self.get(name)
            .ok_or_else(|| ChunkError::UnknownBlock(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }
}
