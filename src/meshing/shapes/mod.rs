//! Shape strategies.
//!
//! A shape emits the geometry of one occupied cell into a shared
//! [`MeshBuffer`], skipping faces the chunk reports as hidden. Every block
//! names its shape by id; the [`ShapeRegistry`] resolves ids to strategies.
//!
//! Shapes share the quad emission in [`push_quad`], which also carries the
//! index contract: indices are offsets from the buffer's vertex count at the
//! moment the quad is pushed.

use std::collections::HashMap;
use std::sync::Arc;

use cgmath::Point3;

use crate::error::{ChunkError, ChunkResult};
use crate::voxels::block::{Block, BlockSide, SHAPE_CUBE, SHAPE_SLAB};
use crate::voxels::chunk::{Chunk, ChunkResolver};

use super::MeshBuffer;

mod cube;
mod slab;

pub use cube::Cube;
pub use slab::Slab;

/// Everything a shape needs to know about the cell it emits.
pub struct ShapeInput<'a> {
    /// Local location of the cell inside `chunk`.
    pub location: Point3<i32>,
    pub chunk: &'a Chunk,
    pub block: &'a Block,
    /// Resolver for faces on the chunk boundary.
    pub neighbours: &'a dyn ChunkResolver,
    pub block_scale: f32,
}

impl ShapeInput<'_> {
    pub fn is_face_visible(&self, side: BlockSide) -> bool {
        self.chunk
            .is_face_visible(self.location, side, self.neighbours)
    }
}

/// Emits the geometry of one block.
pub trait Shape: Send + Sync {
    fn add(&self, input: &ShapeInput<'_>, buffer: &mut MeshBuffer);
}

/// Maps shape ids to strategies. Read-only once meshing starts.
#[derive(Clone)]
pub struct ShapeRegistry {
    shapes: HashMap<String, Arc<dyn Shape>>,
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        let mut registry = ShapeRegistry {
            shapes: HashMap::new(),
        };
        registry.register(SHAPE_CUBE, Arc::new(Cube));
        registry.register(SHAPE_SLAB, Arc::new(Slab::lower()));
        registry
    }
}

impl ShapeRegistry {
    /// A registry holding no shapes at all.
    pub fn empty() -> Self {
        ShapeRegistry {
            shapes: HashMap::new(),
        }
    }

    /// Registers or replaces the strategy for an id.
    pub fn register(&mut self, id: &str, shape: Arc<dyn Shape>) {
        self.shapes.insert(id.to_string(), shape);
    }

    pub fn get(&self, id: &str) -> ChunkResult<&Arc<dyn Shape>> {
        self.shapes
            .get(id)
            .ok_or_else(|| ChunkError::UnknownShape(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.shapes.contains_key(id)
    }
}

/// Unit-cube corners of each face as lower-left, lower-right, upper-left,
/// upper-right, wound counter-clockwise seen from outside.
pub(crate) fn face_corners(side: BlockSide) -> [[f32; 3]; 4] {
    match side {
        BlockSide::FRONT => [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0]],
        BlockSide::BACK => [[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        BlockSide::BOTTOM => [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 1.0]],
        BlockSide::TOP => [[0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
        BlockSide::LEFT => [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [0.0, 1.0, 1.0]],
        BlockSide::RIGHT => [[1.0, 0.0, 1.0], [1.0, 0.0, 0.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]],
    }
}

/// V range of the texture used for a face.
///
/// A single image covers the whole texture. Three stacked images put the top
/// face in the upper third, the sides in the middle third and the bottom in
/// the lower third.
pub(crate) fn texture_v_range(side: BlockSide, using_multiple_images: bool) -> (f32, f32) {
    if !using_multiple_images {
        return (0.0, 1.0);
    }
    match side {
        BlockSide::TOP => (2.0 / 3.0, 1.0),
        BlockSide::BOTTOM => (0.0, 1.0 / 3.0),
        _ => (1.0 / 3.0, 2.0 / 3.0),
    }
}

/// Pushes one quad for `side` of the cell described by `input`.
///
/// `corners` are in cell units (0..=1) and are offset by the cell location and
/// scaled by the block scale. `uv_height` is the fraction of the face's image
/// height the quad covers; partial shapes such as slabs pass less than 1.
pub(crate) fn push_quad(
    buffer: &mut MeshBuffer,
    input: &ShapeInput<'_>,
    side: BlockSide,
    corners: [[f32; 3]; 4],
    uv_height: f32,
) {
    let base = buffer.vertex_count();
    let origin = [
        input.location.x as f32,
        input.location.y as f32,
        input.location.z as f32,
    ];

    for corner in corners {
        buffer.positions.push([
            (origin[0] + corner[0]) * input.block_scale,
            (origin[1] + corner[1]) * input.block_scale,
            (origin[2] + corner[2]) * input.block_scale,
        ]);
    }
    buffer
        .indices
        .extend_from_slice(&[base, base + 1, base + 3, base, base + 3, base + 2]);

    if !buffer.has_attributes() {
        return;
    }

    let normal = side.normal();
    let right = [
        corners[1][0] - corners[0][0],
        corners[1][1] - corners[0][1],
        corners[1][2] - corners[0][2],
    ];
    let tangent = [right[0], right[1], right[2], 1.0];
    let (v_min, v_max) = texture_v_range(side, input.block.using_multiple_images);
    let v_top = v_min + (v_max - v_min) * uv_height;

    for _ in 0..4 {
        buffer.normals.push(normal);
        buffer.tangents.push(tangent);
    }
    buffer.uvs.extend_from_slice(&[
        [0.0, v_min],
        [1.0, v_min],
        [0.0, v_top],
        [1.0, v_top],
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    #[test]
    fn face_corners_wind_towards_the_normal() {
        for side in BlockSide::all() {
            let [ll, lr, ul, _] = face_corners(side);
            let n = cross(sub(lr, ll), sub(ul, ll));
            assert_eq!(n, side.normal(), "winding of {:?}", side);
        }
    }

    #[test]
    fn stacked_images_split_the_texture_in_thirds() {
        assert_eq!(texture_v_range(BlockSide::TOP, false), (0.0, 1.0));
        assert_eq!(texture_v_range(BlockSide::TOP, true), (2.0 / 3.0, 1.0));
        assert_eq!(texture_v_range(BlockSide::LEFT, true), (1.0 / 3.0, 2.0 / 3.0));
        assert_eq!(texture_v_range(BlockSide::BOTTOM, true), (0.0, 1.0 / 3.0));
    }

    #[test]
    fn unknown_shape_is_an_error() {
        let registry = ShapeRegistry::default();
        assert!(registry.contains("cube"));
        assert!(matches!(
            registry.get("wedge"),
            Err(ChunkError::UnknownShape(id)) if id == "wedge"
        ));
    }
}
