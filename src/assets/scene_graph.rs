//! Scene Graph Walker
//!
//! Generic node tree produced by the OBJ importer (and buildable by hand),
//! plus the recursive walk that flattens it into [`LevelAssets`].
//!
//! Geometry leaves the walker already in level space: positions go through the
//! accumulated model matrix and normals through its normal matrix. Meshes are
//! appended in depth-first pre-order, which keeps mesh indices stable across a
//! load → export → load cycle.

use std::path::Path;

use glam::{Mat3, Mat4, Vec2, Vec3};
use rustc_hash::FxHashMap;

use crate::assets::io::AssetReader;
use crate::assets::level::LevelAssets;
use crate::errors::{Result, TesseraError};
use crate::resources::{Material, Mesh, Vertex};
use crate::resources::material::unorm8;
use crate::settings::ImportSettings;

// ============================================================================
// 1. Imported Data
// ============================================================================

/// Texture semantics of the source material model.
///
/// These name the slot a map was authored in, not its meaning in the PBR
/// material; the walker decides how each one is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSemantic {
    Diffuse,
    Shininess,
    Ambient,
    Normals,
    Emissive,
}

/// Scalar colour keys of the source material model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorKey {
    Diffuse,
    Specular,
    Ambient,
    Emissive,
}

#[derive(Debug, Clone, Default)]
pub struct ImportedMaterial {
    pub name: String,
    pub textures: FxHashMap<TextureSemantic, String>,
    pub colors: FxHashMap<ColorKey, Vec3>,
}

impl ImportedMaterial {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    #[must_use]
    pub fn with_texture(mut self, semantic: TextureSemantic, path: impl Into<String>) -> Self {
        self.textures.insert(semantic, path.into());
        self
    }

    #[must_use]
    pub fn with_color(mut self, key: ColorKey, color: Vec3) -> Self {
        self.colors.insert(key, color);
        self
    }

    #[must_use]
    pub fn texture(&self, semantic: TextureSemantic) -> Option<&str> {
        self.textures.get(&semantic).map(String::as_str).filter(|p| !p.is_empty())
    }

    /// Colour for `key`, black when unset.
    #[must_use]
    pub fn color(&self, key: ColorKey) -> Vec3 {
        self.colors.get(&key).copied().unwrap_or(Vec3::ZERO)
    }
}

/// Geometry of one source mesh, in its node's local space.
#[derive(Debug, Clone, Default)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub texcoords: Option<Vec<Vec2>>,
    /// Flat triangle list.
    pub indices: Vec<u32>,
    /// Index into [`SceneGraph::materials`].
    pub material_index: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    /// Local transform relative to the parent node.
    pub transform: Mat4,
    /// Indices into [`SceneGraph::meshes`].
    pub meshes: Vec<usize>,
    pub children: Vec<SceneNode>,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Mat4::IDENTITY,
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl SceneNode {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn with_mesh(mut self, mesh_index: usize) -> Self {
        self.meshes.push(mesh_index);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    pub root: SceneNode,
    pub meshes: Vec<ImportedMesh>,
    pub materials: Vec<ImportedMaterial>,
}

// ============================================================================
// 2. Transforms
// ============================================================================

/// Accumulated transform of the node being visited.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub model: Mat4,
    pub normal: Mat3,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::from_model(Mat4::IDENTITY)
    }
}

impl NodeTransform {
    /// `normal = inverse(transpose(model))`, restricted to the linear part.
    #[must_use]
    pub fn from_model(model: Mat4) -> Self {
        Self {
            model,
            normal: Mat3::from_mat4(model).transpose().inverse(),
        }
    }

    /// Applies a child's local transform: `parent * local`.
    #[must_use]
    pub fn then(&self, local: Mat4) -> Self {
        if local == Mat4::IDENTITY {
            return *self;
        }
        Self::from_model(self.model * local)
    }

    #[inline]
    #[must_use]
    pub fn point(&self, p: Vec3) -> Vec3 {
        self.model.transform_point3(p)
    }

    #[inline]
    #[must_use]
    pub fn normal(&self, n: Vec3) -> Vec3 {
        (self.normal * n).normalize_or_zero()
    }
}

// ============================================================================
// 3. Walker
// ============================================================================

/// Flattens `graph` into a fresh [`LevelAssets`].
///
/// `base_path` resolves relative texture paths. The walk starts from
/// `settings.model_matrix`.
pub fn load_scene_graph(
    graph: &SceneGraph,
    base_path: &Path,
    reader: &dyn AssetReader,
    settings: &ImportSettings,
) -> Result<LevelAssets> {
    let mut level = LevelAssets::new();
    let walker = SceneWalker { graph, base_path, reader, settings };
    walker.walk(&graph.root, NodeTransform::from_model(settings.model_matrix), &mut level)?;
    Ok(level)
}

pub struct SceneWalker<'a> {
    pub graph: &'a SceneGraph,
    pub base_path: &'a Path,
    pub reader: &'a dyn AssetReader,
    pub settings: &'a ImportSettings,
}

impl SceneWalker<'_> {
    /// Visits `node` and its subtree in pre-order.
    ///
    /// `inherited` is the transform accumulated by the ancestors. When
    /// [`ImportSettings::compose_node_transforms`] is off, node-local
    /// transforms are ignored and the whole tree uses `inherited`.
    pub fn walk(&self, node: &SceneNode, inherited: NodeTransform, level: &mut LevelAssets) -> Result<()> {
        let transform = if self.settings.compose_node_transforms {
            inherited.then(node.transform)
        } else {
            inherited
        };

        for &mesh_index in &node.meshes {
            let Some(imported) = self.graph.meshes.get(mesh_index) else {
                log::warn!("Node \"{}\" references missing mesh {mesh_index}, skipping", node.name);
                continue;
            };
            let material_index = self.resolve_material(imported, level)?;
            let mesh = extract_imported_mesh(imported, &transform, material_index, self.settings)?;
            level.meshes.push(mesh);
        }

        for child in &node.children {
            self.walk(child, transform, level)?;
        }
        Ok(())
    }

    fn resolve_material(&self, mesh: &ImportedMesh, level: &mut LevelAssets) -> Result<u32> {
        let source = mesh.material_index.and_then(|i| self.graph.materials.get(i));
        let material = match source {
            Some(source) => self.build_material(source, level)?,
            None => Material::default(),
        };
        Ok(level.resolve_or_add_material(material))
    }

    /// Interprets a source material:
    /// diffuse → albedo, shininess → roughness, ambient → metallic.
    fn build_material(&self, source: &ImportedMaterial, level: &mut LevelAssets) -> Result<Material> {
        let mut material = Material::default();

        match source.texture(TextureSemantic::Diffuse) {
            Some(path) => material.albedo_tex = level.resolve_or_add_texture(self.reader, path, self.base_path),
            None => material.set_albedo(source.color(ColorKey::Diffuse).extend(1.0)),
        }

        let roughness_map = source.texture(TextureSemantic::Shininess);
        let metallic_map = source.texture(TextureSemantic::Ambient);
        let packed = level.resolve_or_add_roughness_metallic(self.reader, roughness_map, metallic_map, self.base_path)?;
        material.metallic_roughness_tex = packed.map(|p| p.index);
        material.roughness = match packed {
            Some(p) if p.roughness => 255,
            _ => unorm8(source.color(ColorKey::Specular).x),
        };
        material.metallic = match packed {
            Some(p) if p.metallic => 255,
            _ => unorm8(source.color(ColorKey::Ambient).x),
        };

        if let Some(path) = source.texture(TextureSemantic::Normals) {
            material.normal_tex = level.resolve_or_add_texture(self.reader, path, self.base_path);
        }

        match source.texture(TextureSemantic::Emissive) {
            Some(path) => {
                material.emissive_tex = level.resolve_or_add_texture(self.reader, path, self.base_path);
                if material.emissive_tex.is_some() {
                    material.emissive = [255; 3];
                }
            }
            None => material.set_emissive(source.color(ColorKey::Emissive)),
        }

        Ok(material)
    }
}

/// Converts one imported mesh into level space.
pub fn extract_imported_mesh(
    imported: &ImportedMesh,
    transform: &NodeTransform,
    material_index: u32,
    settings: &ImportSettings,
) -> Result<Mesh> {
    if imported.indices.len() % 3 != 0 {
        return Err(TesseraError::MalformedTriangleList(imported.indices.len()));
    }
    let count = imported.positions.len();
    if imported.normals.is_empty() && count > 0 {
        return Err(TesseraError::MissingAttribute("NORMAL"));
    }
    if imported.normals.len() != count {
        return Err(TesseraError::AttributeCountMismatch {
            attribute: "NORMAL",
            expected: count,
            found: imported.normals.len(),
        });
    }
    match &imported.texcoords {
        Some(uvs) if uvs.len() != count => {
            return Err(TesseraError::AttributeCountMismatch {
                attribute: "TEXCOORD_0",
                expected: count,
                found: uvs.len(),
            });
        }
        None if settings.require_texcoords => return Err(TesseraError::MissingAttribute("TEXCOORD_0")),
        _ => {}
    }

    let vertices = (0..count)
        .map(|i| {
            let mut texcoord = imported.texcoords.as_ref().map_or(Vec2::ZERO, |uvs| uvs[i]);
            if settings.flip_uvs {
                texcoord.y = 1.0 - texcoord.y;
            }
            Vertex::new(
                transform.point(imported.positions[i]),
                transform.normal(imported.normals[i]),
                texcoord,
            )
        })
        .collect::<Vec<_>>();

    let mesh = Mesh {
        material_indices: vec![material_index; vertices.len()],
        vertices,
        indices: imported.indices.clone(),
    };
    mesh.validate()?;
    Ok(mesh)
}

