//! Import & Export Settings
//!
//! Configuration for the loaders and the glTF writer. Both settings types
//! deserialize from JSON with every field optional, so a settings file only
//! needs to name what it overrides:
//!
//! ```json
//! { "flip_uvs": true, "model_matrix": [0.05, 0, 0, 0, 0, 0.05, 0, 0, 0, 0, 0.05, 0, 0, 0, 0, 1] }
//! ```

use std::path::Path;

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

// ---------------------------------------------------------------------------
// ImportSettings
// ---------------------------------------------------------------------------

/// Controls how source scenes are converted into [`LevelAssets`](crate::assets::LevelAssets).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Treat a primitive without `TEXCOORD_0` as malformed instead of
    /// filling texcoords with zero.
    pub require_texcoords: bool,

    /// Replace `v` with `1 - v` for every texcoord. OBJ files put the texture
    /// origin at the bottom-left corner.
    pub flip_uvs: bool,

    /// Transform applied to the whole scene graph before any node transform.
    pub model_matrix: Mat4,

    /// Multiply each node's local transform into the accumulated transform.
    /// When disabled only `model_matrix` is applied to every mesh.
    pub compose_node_transforms: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            require_texcoords: false,
            flip_uvs: false,
            model_matrix: Mat4::IDENTITY,
            compose_node_transforms: true,
        }
    }
}

impl ImportSettings {
    /// Defaults for OBJ/MTL sources.
    #[must_use]
    pub fn obj() -> Self {
        Self {
            flip_uvs: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_model_matrix(mut self, model_matrix: Mat4) -> Self {
        self.model_matrix = model_matrix;
        self
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

// ---------------------------------------------------------------------------
// ExportSettings
// ---------------------------------------------------------------------------

/// Controls the glTF writer output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Value of `asset.generator`.
    pub generator: String,

    /// Directory, relative to the written `.gltf`, receiving PNG textures.
    pub texture_dir: String,

    /// Emit buffers, accessors, meshes and nodes. When disabled the document
    /// only carries materials and textures.
    pub write_geometry: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            generator: "Tessera".to_string(),
            texture_dir: "textures".to_string(),
            write_geometry: true,
        }
    }
}

impl ExportSettings {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
