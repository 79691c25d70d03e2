//! Geometry buffers filled by shapes.

use std::collections::BTreeMap;

/// Vertex attributes and indices of one mergeable geometry.
///
/// Index values point into this buffer's own `positions`, so a shape must read
/// [`vertex_count`](Self::vertex_count) as its base offset before pushing
/// vertices. A collision buffer carries positions and indices only; shapes
/// check [`has_attributes`](Self::has_attributes) and skip the rest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffer {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub normals: Vec<[f32; 3]>,
    pub tangents: Vec<[f32; 4]>,
    pub uvs: Vec<[f32; 2]>,
    collision: bool,
}

impl MeshBuffer {
    /// A buffer that collects every vertex attribute.
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer that collects positions and indices only.
    pub fn collision() -> Self {
        MeshBuffer {
            collision: true,
            ..Self::default()
        }
    }

    pub fn has_attributes(&self) -> bool {
        !self.collision
    }

    pub fn vertex_count(&self) -> u32 {
        self.positions.len() as u32
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Raw bytes of the position stream, ready for a vertex buffer upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Raw bytes of the index stream.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Appends another buffer, rebasing its indices onto this one.
    pub fn append(&mut self, other: &MeshBuffer) {
        let base = self.vertex_count();
        self.positions.extend_from_slice(&other.positions);
        self.indices.extend(other.indices.iter().map(|index| index + base));
        if self.has_attributes() {
            self.normals.extend_from_slice(&other.normals);
            self.tangents.extend_from_slice(&other.tangents);
            self.uvs.extend_from_slice(&other.uvs);
        }
    }
}

/// Render geometry of one chunk, one buffer per block type.
///
/// Each entry maps to a single material (texture atlas group), so a renderer
/// issues one geometry per type instead of one per block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMesh {
    buffers: BTreeMap<String, MeshBuffer>,
}

impl ChunkMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer of a block type, created on first use.
    pub fn buffer_mut(&mut self, block_type: &str) -> &mut MeshBuffer {
        self.buffers.entry(block_type.to_string()).or_default()
    }

    pub fn buffer(&self, block_type: &str) -> Option<&MeshBuffer> {
        self.buffers.get(block_type)
    }

    /// Buffers in block type order.
    pub fn buffers(&self) -> impl Iterator<Item = (&str, &MeshBuffer)> {
        self.buffers.iter().map(|(name, buffer)| (name.as_str(), buffer))
    }

    /// Removes buffers that received no geometry.
    pub fn prune_empty(&mut self) {
        self.buffers.retain(|_, buffer| !buffer.is_empty());
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.values().all(MeshBuffer::is_empty)
    }

    pub fn triangle_count(&self) -> usize {
        self.buffers.values().map(MeshBuffer::triangle_count).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.buffers.values().map(|buffer| buffer.positions.len()).sum()
    }
}
