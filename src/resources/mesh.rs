use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::errors::{Result, TesseraError};

/// A single vertex as uploaded to the renderer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub texcoord: Vec2,
}

impl Vertex {
    #[inline]
    #[must_use]
    pub fn new(position: Vec3, normal: Vec3, texcoord: Vec2) -> Self {
        Self { position, normal, texcoord }
    }
}

/// Triangle-list geometry with one material index per vertex.
///
/// `indices.len()` is a multiple of three and every index is smaller than
/// `vertices.len()`. `material_indices` holds exactly one entry per vertex,
/// indexing into [`LevelAssets::materials`](crate::assets::LevelAssets).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub material_indices: Vec<u32>,
}

impl Mesh {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterates the index buffer one triangle at a time.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
    }

    /// Appends `vertices`, all assigned to `material_index`, and returns the
    /// index of the first appended vertex.
    pub fn push_vertices(&mut self, vertices: &[Vertex], material_index: u32) -> u32 {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(vertices);
        self.material_indices
            .resize(self.vertices.len(), material_index);
        base
    }

    /// Checks the layout invariants shared by every producer of meshes.
    pub fn validate(&self) -> Result<()> {
        if self.indices.len() % 3 != 0 {
            return Err(TesseraError::MalformedTriangleList(self.indices.len()));
        }
        if self.material_indices.len() != self.vertices.len() {
            return Err(TesseraError::AttributeCountMismatch {
                attribute: "material indices",
                expected: self.vertices.len(),
                found: self.material_indices.len(),
            });
        }
        let vertex_count = self.vertices.len();
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(TesseraError::IndexOutOfRange { index, vertex_count });
        }
        Ok(())
    }
}
