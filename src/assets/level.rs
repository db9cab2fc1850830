use rustc_hash::FxHashMap;

use crate::resources::{Image, Material, Mesh};

/// Flat asset tables produced by one load and consumed by the renderer or
/// the writer.
///
/// Meshes reference `materials` through their per-vertex material indices;
/// materials reference `textures` through their texture slots. Textures are
/// identified by the source key they were loaded from (a file path, or two
/// concatenated paths for packed metallic/roughness maps), recorded in
/// `texture_source_keys`.
#[derive(Debug, Clone, Default)]
pub struct LevelAssets {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub textures: Vec<Image>,
    pub texture_source_keys: FxHashMap<String, u32>,
    /// Loaded channels of each packed metallic/roughness texture.
    pub(crate) packed_channels: FxHashMap<u32, PackedRoughnessMetallic>,
}

/// A packed metallic/roughness texture and which of its channels came from a
/// loaded map. A channel without a map is filled with 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedRoughnessMetallic {
    pub index: u32,
    pub roughness: bool,
    pub metallic: bool,
}

impl LevelAssets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty() && self.materials.is_empty() && self.textures.is_empty()
    }

    /// Source key a texture was registered under.
    #[must_use]
    pub fn texture_source_key(&self, texture_index: u32) -> Option<&str> {
        self.texture_source_keys
            .iter()
            .find_map(|(key, &index)| (index == texture_index).then_some(key.as_str()))
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices.len()).sum()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }
}
