use crate::meshing::MeshBuffer;
use crate::voxels::block::BlockSide;

use super::{face_corners, push_quad, Shape, ShapeInput};

/// A box filling the lower part of a cell up to `height`.
///
/// The top face sits inside the cell, so it is drawn whatever lies above.
/// The other faces are culled like a cube's.
#[derive(Debug, Clone, Copy)]
pub struct Slab {
    height: f32,
}

impl Slab {
    pub fn new(height: f32) -> Self {
        Slab {
            height: height.clamp(0.0, 1.0),
        }
    }

    /// The lower half of a cell.
    pub fn lower() -> Self {
        Slab::new(0.5)
    }
}

impl Shape for Slab {
    fn add(&self, input: &ShapeInput<'_>, buffer: &mut MeshBuffer) {
        for side in BlockSide::all() {
            let always_drawn = side == BlockSide::TOP && self.height < 1.0;
            if !always_drawn && !input.is_face_visible(side) {
                continue;
            }

            let corners = face_corners(side).map(|[x, y, z]| [x, y * self.height, z]);
            let uv_height = if side.is_vertical() { 1.0 } else { self.height };
            push_quad(buffer, input, side, corners, uv_height);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cgmath::Point3;

    use super::*;
    use crate::config::ChunkConfig;
    use crate::voxels::block::Block;
    use crate::voxels::chunk::{Chunk, NoNeighbours};

    #[test]
    fn slab_top_is_drawn_under_an_opaque_block() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0), &ChunkConfig::with_chunk_dimension(4));
        let slab = Arc::new(Block::cube("slab").with_shape("slab").with_transparent(true));
        let stone = Arc::new(Block::cube("stone"));
        chunk.add_block(Point3::new(1, 1, 1), slab.clone()).unwrap();
        chunk.add_block(Point3::new(1, 2, 1), stone).unwrap();

        let input = ShapeInput {
            location: Point3::new(1, 1, 1),
            chunk: &chunk,
            block: &slab,
            neighbours: &NoNeighbours,
            block_scale: 1.0,
        };
        let mut buffer = MeshBuffer::new();
        Slab::lower().add(&input, &mut buffer);

        assert_eq!(buffer.positions.len(), 24);
        let max_y = buffer
            .positions
            .iter()
            .map(|p| p[1])
            .fold(f32::MIN, f32::max);
        assert_eq!(max_y, 1.5);
    }

    #[test]
    fn slab_sides_are_culled_by_opaque_neighbours() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0), &ChunkConfig::with_chunk_dimension(4));
        let slab = Arc::new(Block::cube("slab").with_shape("slab").with_transparent(true));
        let stone = Arc::new(Block::cube("stone"));
        chunk.add_block(Point3::new(1, 1, 1), slab.clone()).unwrap();
        chunk.add_block(Point3::new(2, 1, 1), stone.clone()).unwrap();
        chunk.add_block(Point3::new(1, 0, 1), stone).unwrap();

        let input = ShapeInput {
            location: Point3::new(1, 1, 1),
            chunk: &chunk,
            block: &slab,
            neighbours: &NoNeighbours,
            block_scale: 1.0,
        };
        let mut buffer = MeshBuffer::new();
        Slab::lower().add(&input, &mut buffer);

        // right and bottom culled
        assert_eq!(buffer.positions.len(), 16);
    }
}
