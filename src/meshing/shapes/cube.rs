use crate::meshing::MeshBuffer;
use crate::voxels::block::BlockSide;

use super::{face_corners, push_quad, Shape, ShapeInput};

/// A full unit cube. Emits one quad per visible face.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cube;

impl Shape for Cube {
    fn add(&self, input: &ShapeInput<'_>, buffer: &mut MeshBuffer) {
        for side in BlockSide::all() {
            if input.is_face_visible(side) {
                push_quad(buffer, input, side, face_corners(side), 1.0);
            }
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
    fn isolated_cube_emits_six_quads() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0), &ChunkConfig::with_chunk_dimension(4));
        let block = Arc::new(Block::cube("stone"));
        chunk.add_block(Point3::new(1, 2, 3), block.clone()).unwrap();

        let input = ShapeInput {
            location: Point3::new(1, 2, 3),
            chunk: &chunk,
            block: &block,
            neighbours: &NoNeighbours,
            block_scale: 2.0,
        };
        let mut buffer = MeshBuffer::new();
        Cube.add(&input, &mut buffer);

        assert_eq!(buffer.positions.len(), 24);
        assert_eq!(buffer.indices.len(), 36);
        assert_eq!(buffer.normals.len(), 24);
        assert_eq!(buffer.tangents.len(), 24);
        assert_eq!(buffer.uvs.len(), 24);
        assert!(buffer.indices.iter().all(|&i| i < 24));
        for position in &buffer.positions {
            assert!((2.0..=4.0).contains(&position[0]));
            assert!((4.0..=6.0).contains(&position[1]));
            assert!((6.0..=8.0).contains(&position[2]));
        }
    }

    #[test]
    fn indices_start_at_the_running_vertex_count() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0), &ChunkConfig::with_chunk_dimension(4));
        let block = Arc::new(Block::cube("stone"));
        chunk.add_block(Point3::new(0, 0, 0), block.clone()).unwrap();

        let input = ShapeInput {
            location: Point3::new(0, 0, 0),
            chunk: &chunk,
            block: &block,
            neighbours: &NoNeighbours,
            block_scale: 1.0,
        };
        let mut buffer = MeshBuffer::collision();
        Cube.add(&input, &mut buffer);
        Cube.add(&input, &mut buffer);

        assert_eq!(buffer.positions.len(), 48);
        assert_eq!(buffer.indices[36], 24);
        assert_eq!(*buffer.indices.iter().max().unwrap(), 47);
        assert!(buffer.normals.is_empty());
        assert!(buffer.uvs.is_empty());
    }
}
