use glam::{Vec2, Vec3};

use crate::resources::mesh::{Mesh, Vertex};

// 24 vertices (4 per face), unit cube spanning [0, 1] on every axis.
const CUBE_POSITIONS: [[f32; 3]; 24] = [
    // Left (-X)
    [0.0, 0.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0],
    [0.0, 1.0, 1.0],
    // Right (+X)
    [1.0, 0.0, 0.0],
    [1.0, 0.0, 1.0],
    [1.0, 1.0, 0.0],
    [1.0, 1.0, 1.0],
    // Bottom (-Y)
    [0.0, 0.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 0.0],
    [1.0, 0.0, 1.0],
    // Top (+Y)
    [0.0, 1.0, 0.0],
    [0.0, 1.0, 1.0],
    [1.0, 1.0, 0.0],
    [1.0, 1.0, 1.0],
    // Back (-Z)
    [0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    // Front (+Z)
    [0.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
    [1.0, 0.0, 1.0],
    [1.0, 1.0, 1.0],
];

// One normal per face, shared by its 4 vertices.
const CUBE_FACE_NORMALS: [[f32; 3]; 6] = [
    [-1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, -1.0],
    [0.0, 0.0, 1.0],
];

const CUBE_TEXCOORDS: [[f32; 2]; 24] = [
    // Left
    [0.0, 0.0],
    [1.0, 0.0],
    [0.0, 1.0],
    [1.0, 1.0],
    // Right
    [1.0, 0.0],
    [0.0, 0.0],
    [1.0, 1.0],
    [0.0, 1.0],
    // Bottom
    [0.0, 0.0],
    [0.0, 1.0],
    [1.0, 0.0],
    [1.0, 1.0],
    // Top
    [0.0, 1.0],
    [0.0, 0.0],
    [1.0, 1.0],
    [1.0, 0.0],
    // Back
    [1.0, 0.0],
    [1.0, 1.0],
    [0.0, 0.0],
    [0.0, 1.0],
    // Front
    [0.0, 0.0],
    [0.0, 1.0],
    [1.0, 0.0],
    [1.0, 1.0],
];

// Counter-clockwise when viewed from outside.
const CUBE_INDICES: [u32; 36] = [
    // Left
    0, 1, 2, 3, 2, 1,
    // Right
    5, 4, 7, 6, 7, 4,
    // Bottom
    8, 10, 9, 11, 9, 10,
    // Top
    13, 15, 12, 14, 12, 15,
    // Back
    18, 16, 19, 17, 19, 16,
    // Front
    20, 22, 21, 23, 21, 22,
];

/// Builds the unit cube used as a placeholder and test fixture, with every
/// vertex assigned to `material_index`.
#[must_use]
pub fn create_cube_mesh(material_index: u32) -> Mesh {
    let vertices: Vec<Vertex> = CUBE_POSITIONS
        .iter()
        .zip(CUBE_TEXCOORDS.iter())
        .enumerate()
        .map(|(i, (pos, uv))| Vertex {
            position: Vec3::from_array(*pos),
            normal: Vec3::from_array(CUBE_FACE_NORMALS[i / 4]),
            texcoord: Vec2::from_array(*uv),
        })
        .collect();

    Mesh {
        material_indices: vec![material_index; vertices.len()],
        vertices,
        indices: CUBE_INDICES.to_vec(),
    }
}
