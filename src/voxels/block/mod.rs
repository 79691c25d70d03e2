//! # Block Module
//!
//! This module provides the block descriptors stored in chunks, the six block
//! faces and the registry that hands out shared block handles.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod block_side;
pub mod registry;

pub use block_side::BlockSide;
pub use registry::BlockRegistry;

/// Shape id of a full unit cube.
pub const SHAPE_CUBE: &str = "cube";
/// Shape id of the lower half of a cube.
pub const SHAPE_SLAB: &str = "slab";

/// Shared handle to a registered block. Chunks store these, never owned blocks.
pub type BlockRef = Arc<Block>;

/// Describes one kind of block.
///
/// Blocks are immutable once registered. Every cell of every chunk that holds
/// a grass block points at the same `Block` value, so the struct carries only
/// descriptive data.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    /// Unique id of the block.
    pub name: String,
    /// Material group. Mesh output is merged per type.
    #[serde(rename = "type")]
    pub block_type: String,
    /// Id of the shape strategy that emits this block's geometry.
    #[serde(default = "default_shape")]
    pub shape: String,
    #[serde(default = "default_true")]
    pub solid: bool,
    #[serde(default)]
    pub transparent: bool,
    /// Whether the texture is three stacked images (top, side, bottom)
    /// instead of one image for every face.
    #[serde(default)]
    pub using_multiple_images: bool,
}

fn default_shape() -> String {
    SHAPE_CUBE.to_string()
}

fn default_true() -> bool {
    true
}

impl Block {
    /// A solid, opaque cube whose type is its own name.
    pub fn cube(name: &str) -> Self {
        Block {
            name: name.to_string(),
            block_type: name.to_string(),
            shape: SHAPE_CUBE.to_string(),
            solid: true,
            transparent: false,
            using_multiple_images: false,
        }
    }

    pub fn with_type(mut self, block_type: &str) -> Self {
        self.block_type = block_type.to_string();
        self
    }

    pub fn with_shape(mut self, shape: &str) -> Self {
        self.shape = shape.to_string();
        self
    }

    pub fn with_solid(mut self, solid: bool) -> Self {
        self.solid = solid;
        self
    }

    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    pub fn with_multiple_images(mut self, using_multiple_images: bool) -> Self {
        self.using_multiple_images = using_multiple_images;
        self
    }
}
