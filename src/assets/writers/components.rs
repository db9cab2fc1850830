use crate::errors::{Result, TesseraError};
use crate::resources::Mesh;

/// Triangles of one mesh that share a material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshComponent {
    pub material_index: u32,
    /// Flat triangle list into the parent mesh's vertices.
    pub indices: Vec<u32>,
}

/// Groups the triangles of `mesh` by material.
///
/// Components appear in the order their material is first met walking the
/// index buffer, and triangle order is kept within each component. A
/// triangle whose corners disagree on the material is rejected.
pub fn split(mesh: &Mesh) -> Result<Vec<MeshComponent>> {
    if mesh.indices.len() % 3 != 0 {
        return Err(TesseraError::MalformedTriangleList(mesh.indices.len()));
    }

    let mut components: Vec<MeshComponent> = Vec::new();
    for (triangle, tri) in mesh.triangles().enumerate() {
        let mut materials = [0u32; 3];
        for (slot, &index) in materials.iter_mut().zip(&tri) {
            *slot = *mesh.material_indices.get(index as usize).ok_or(TesseraError::IndexOutOfRange {
                index,
                vertex_count: mesh.material_indices.len(),
            })?;
        }
        if materials[0] != materials[1] || materials[0] != materials[2] {
            return Err(TesseraError::MixedMaterialTriangle { triangle, materials });
        }

        let material_index = materials[0];
        match components.iter_mut().find(|c| c.material_index == material_index) {
            Some(component) => component.indices.extend_from_slice(&tri),
            None => components.push(MeshComponent { material_index, indices: tri.to_vec() }),
        }
    }
    Ok(components)
}
