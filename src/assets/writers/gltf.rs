//! glTF 2.0 writer
//!
//! Exports a selection of meshes from [`LevelAssets`] as a `.gltf` document,
//! a sibling `.bin` geometry payload and one PNG per referenced texture.
//!
//! Only what the selected meshes use is written. Materials are remapped to a
//! local table in first-use order, and textures to a local table in the order
//! material slots reference them.

use std::path::Path;

use glam::Vec3;
use serde::Serialize;

use crate::assets::accessor::ComponentType;
use crate::assets::io::{ensure_dir, save_image_png};
use crate::assets::level::LevelAssets;
use crate::assets::writers::components::{MeshComponent, split};
use crate::errors::Result;
use crate::resources::{Material, Mesh, TextureSlot};
use crate::resources::material::unorm8_to_f32;
use crate::settings::ExportSettings;

const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;
const COMPONENT_F32: u32 = ComponentType::F32.gl_code();
const COMPONENT_U32: u32 = ComponentType::U32.gl_code();
const MODE_TRIANGLES: u32 = 4;

// ============================================================================
// 1. Document model
// ============================================================================

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    asset: AssetInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    scene: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    scenes: Vec<SceneJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    nodes: Vec<NodeJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    meshes: Vec<MeshJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    accessors: Vec<AccessorJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    buffer_views: Vec<BufferViewJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    buffers: Vec<BufferJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    materials: Vec<MaterialJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<ImageJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    textures: Vec<TextureJson>,
}

#[derive(Debug, Default, Serialize)]
struct AssetInfo {
    version: &'static str,
    generator: String,
}

#[derive(Debug, Serialize)]
struct SceneJson {
    nodes: Vec<usize>,
}

#[derive(Debug, Serialize)]
struct NodeJson {
    mesh: usize,
}

#[derive(Debug, Serialize)]
struct MeshJson {
    primitives: Vec<PrimitiveJson>,
}

#[derive(Debug, Serialize)]
struct PrimitiveJson {
    attributes: Attributes,
    indices: usize,
    material: usize,
    mode: u32,
}

#[derive(Debug, Serialize)]
struct Attributes {
    #[serde(rename = "POSITION")]
    position: usize,
    #[serde(rename = "NORMAL")]
    normal: usize,
    #[serde(rename = "TEXCOORD_0")]
    texcoord_0: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccessorJson {
    buffer_view: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<[f32; 3]>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BufferViewJson {
    buffer: usize,
    byte_offset: usize,
    byte_length: usize,
    target: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BufferJson {
    byte_length: usize,
    uri: String,
}

#[derive(Debug, Serialize)]
struct TextureRef {
    index: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PbrJson {
    base_color_factor: [f32; 4],
    #[serde(skip_serializing_if = "Option::is_none")]
    base_color_texture: Option<TextureRef>,
    metallic_factor: f32,
    roughness_factor: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    metallic_roughness_texture: Option<TextureRef>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MaterialJson {
    pbr_metallic_roughness: PbrJson,
    #[serde(skip_serializing_if = "Option::is_none")]
    normal_texture: Option<TextureRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    occlusion_texture: Option<TextureRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    emissive_texture: Option<TextureRef>,
    emissive_factor: [f32; 3],
}

impl MaterialJson {
    /// `material` must already carry local texture indices.
    fn new(material: &Material) -> Self {
        let tex = |slot| material.texture(slot).map(|index| TextureRef { index: index as usize });
        Self {
            pbr_metallic_roughness: PbrJson {
                base_color_factor: material.albedo_factor().to_array(),
                base_color_texture: tex(TextureSlot::Albedo),
                metallic_factor: unorm8_to_f32(material.metallic),
                roughness_factor: unorm8_to_f32(material.roughness),
                metallic_roughness_texture: tex(TextureSlot::MetallicRoughness),
            },
            normal_texture: tex(TextureSlot::Normal),
            occlusion_texture: tex(TextureSlot::Occlusion),
            emissive_texture: tex(TextureSlot::Emissive),
            emissive_factor: material.emissive_factor().to_array(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ImageJson {
    uri: String,
}

#[derive(Debug, Serialize)]
struct TextureJson {
    source: usize,
}

// ============================================================================
// 2. Remapping
// ============================================================================

struct ExportMesh<'a> {
    mesh: &'a Mesh,
    /// Material indices already rewritten to the local table.
    components: Vec<MeshComponent>,
}

/// Write-local material and texture tables.
#[derive(Debug, Default)]
struct LocalTables {
    /// Global material index of each local material.
    material_sources: Vec<u32>,
    /// Local materials with local texture indices.
    materials: Vec<Material>,
    /// Global texture index of each local texture, in slot encounter order.
    texture_sources: Vec<u32>,
}

impl LocalTables {
    fn local_material(&mut self, global: u32) -> u32 {
        if let Some(local) = self.material_sources.iter().position(|&g| g == global) {
            return local as u32;
        }
        self.material_sources.push(global);
        (self.material_sources.len() - 1) as u32
    }

    fn remap_textures(&mut self, assets: &LevelAssets) {
        for &global in &self.material_sources {
            let mut material = assets.materials.get(global as usize).copied().unwrap_or_else(|| {
                log::warn!("Material {global} does not exist, exporting a default material");
                Material::default()
            });
            for slot in TextureSlot::ALL {
                let texture = material.texture_mut(slot);
                *texture = match *texture {
                    Some(global_tex) if (global_tex as usize) < assets.textures.len() => {
                        self.texture_sources.push(global_tex);
                        Some((self.texture_sources.len() - 1) as u32)
                    }
                    Some(global_tex) => {
                        log::warn!("Texture {global_tex} does not exist, dropping it from material {global}");
                        None
                    }
                    None => None,
                };
            }
            self.materials.push(material);
        }
    }
}

// ============================================================================
// 3. Texture files
// ============================================================================

/// File stem for a texture: the source file name without extension, with any
/// `#fragment` appended after an underscore.
fn texture_stem(source_key: Option<&str>, global_index: u32) -> String {
    let Some(key) = source_key else {
        return format!("texture_{global_index}");
    };
    let file_name = key.rsplit(['/', '\\']).next().unwrap_or(key);
    let (name, fragment) = match file_name.split_once('#') {
        Some((name, fragment)) => (name, Some(fragment)),
        None => (file_name, None),
    };
    let stem = match name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => name,
    };
    let mut out = match fragment {
        Some(fragment) => format!("{stem}_{fragment}"),
        None => stem.to_string(),
    };
    out = out
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' { c } else { '_' })
        .collect();
    if out.is_empty() {
        out = format!("texture_{global_index}");
    }
    out
}

/// Assigns a unique `<dir>/<stem>.png` URI to every distinct global texture.
fn texture_uris(assets: &LevelAssets, texture_sources: &[u32], texture_dir: &str) -> Vec<(u32, String)> {
    let mut assigned: Vec<(u32, String)> = Vec::new();
    for &global in texture_sources {
        if assigned.iter().any(|(g, _)| *g == global) {
            continue;
        }
        let stem = texture_stem(assets.texture_source_key(global), global);
        let mut uri = format!("{texture_dir}/{stem}.png");
        let mut suffix = 1;
        while assigned.iter().any(|(_, u)| *u == uri) {
            uri = format!("{texture_dir}/{stem}_{suffix}.png");
            suffix += 1;
        }
        assigned.push((global, uri));
    }
    assigned
}

// ============================================================================
// 4. Geometry payload
// ============================================================================

#[derive(Debug, Default)]
struct GeometryPayload {
    data: Vec<u8>,
    views: Vec<BufferViewJson>,
    accessors: Vec<AccessorJson>,
}

impl GeometryPayload {
    fn push_view(&mut self, bytes: &[u8], target: u32) -> usize {
        // Every element written is four-byte aligned already.
        let byte_offset = self.data.len();
        self.data.extend_from_slice(bytes);
        self.views.push(BufferViewJson { buffer: 0, byte_offset, byte_length: bytes.len(), target });
        self.views.len() - 1
    }

    fn push_accessor(&mut self, accessor: AccessorJson) -> usize {
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    fn add_mesh(&mut self, export: &ExportMesh<'_>) -> MeshJson {
        let vertices = &export.mesh.vertices;
        let count = vertices.len();

        let positions: Vec<[f32; 3]> = vertices.iter().map(|v| v.position.to_array()).collect();
        let normals: Vec<[f32; 3]> = vertices.iter().map(|v| v.normal.to_array()).collect();
        let texcoords: Vec<[f32; 2]> = vertices.iter().map(|v| v.texcoord.to_array()).collect();

        let (min, max) = vertices.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), v| (min.min(v.position), max.max(v.position)),
        );

        let view = self.push_view(bytemuck::cast_slice(&positions), ARRAY_BUFFER);
        let position = self.push_accessor(AccessorJson {
            buffer_view: view,
            component_type: COMPONENT_F32,
            count,
            kind: "VEC3",
            min: Some(min.to_array()),
            max: Some(max.to_array()),
        });
        let view = self.push_view(bytemuck::cast_slice(&normals), ARRAY_BUFFER);
        let normal = self.push_accessor(AccessorJson {
            buffer_view: view,
            component_type: COMPONENT_F32,
            count,
            kind: "VEC3",
            min: None,
            max: None,
        });
        let view = self.push_view(bytemuck::cast_slice(&texcoords), ARRAY_BUFFER);
        let texcoord_0 = self.push_accessor(AccessorJson {
            buffer_view: view,
            component_type: COMPONENT_F32,
            count,
            kind: "VEC2",
            min: None,
            max: None,
        });

        let primitives = export
            .components
            .iter()
            .map(|component| {
                let view = self.push_view(bytemuck::cast_slice(&component.indices), ELEMENT_ARRAY_BUFFER);
                let indices = self.push_accessor(AccessorJson {
                    buffer_view: view,
                    component_type: COMPONENT_U32,
                    count: component.indices.len(),
                    kind: "SCALAR",
                    min: None,
                    max: None,
                });
                PrimitiveJson {
                    attributes: Attributes { position, normal, texcoord_0 },
                    indices,
                    material: component.material_index as usize,
                    mode: MODE_TRIANGLES,
                }
            })
            .collect();

        MeshJson { primitives }
    }
}

// ============================================================================
// 5. Entry point
// ============================================================================

/// Writes the meshes of `assets` selected by `mesh_indices` to `write_path`.
///
/// Indices that do not name a mesh are logged and skipped. Fails on the first
/// directory or file that cannot be written; files already written are left
/// in place.
pub fn write_assets_to_gltf(
    write_path: &Path,
    assets: &LevelAssets,
    mesh_indices: &[usize],
    settings: &ExportSettings,
) -> Result<()> {
    let out_dir = write_path.parent().unwrap_or(Path::new(""));
    let stem = write_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "level".to_string());

    // 1. Split meshes and remap materials
    let mut tables = LocalTables::default();
    let mut exports = Vec::with_capacity(mesh_indices.len());
    for &mesh_index in mesh_indices {
        let Some(mesh) = assets.meshes.get(mesh_index) else {
            log::warn!("Mesh {mesh_index} does not exist, skipping it");
            continue;
        };
        let mut components = split(mesh)?;
        if components.is_empty() {
            log::warn!("Mesh {mesh_index} has no triangles, skipping it");
            continue;
        }
        for component in &mut components {
            component.material_index = tables.local_material(component.material_index);
        }
        exports.push(ExportMesh { mesh, components });
    }

    // 2. Remap texture slots
    tables.remap_textures(assets);

    let mut doc = Document {
        asset: AssetInfo { version: "2.0", generator: settings.generator.clone() },
        materials: tables.materials.iter().map(MaterialJson::new).collect(),
        ..Default::default()
    };

    // 3. Images and textures
    ensure_dir(out_dir)?;
    if !tables.texture_sources.is_empty() {
        ensure_dir(&out_dir.join(&settings.texture_dir))?;
    }
    let uris = texture_uris(assets, &tables.texture_sources, &settings.texture_dir);
    for (global, uri) in &uris {
        let image = &assets.textures[*global as usize];
        if let Err(err) = save_image_png(image, &out_dir.join(uri)) {
            log::error!("Could not write texture {global} to \"{uri}\": {err}");
            return Err(err);
        }
    }
    for (local, global) in tables.texture_sources.iter().enumerate() {
        let uri = uris
            .iter()
            .find_map(|(g, u)| (g == global).then(|| u.clone()))
            .unwrap_or_default();
        doc.images.push(ImageJson { uri });
        doc.textures.push(TextureJson { source: local });
    }

    // 4. Geometry
    if settings.write_geometry && !exports.is_empty() {
        let mut payload = GeometryPayload::default();
        for export in &exports {
            let mesh = payload.add_mesh(export);
            doc.meshes.push(mesh);
            doc.nodes.push(NodeJson { mesh: doc.meshes.len() - 1 });
        }
        let bin_name = format!("{stem}.bin");
        std::fs::write(out_dir.join(&bin_name), &payload.data)?;

        doc.buffers.push(BufferJson { byte_length: payload.data.len(), uri: bin_name });
        doc.buffer_views = payload.views;
        doc.accessors = payload.accessors;
        doc.scenes.push(SceneJson { nodes: (0..doc.nodes.len()).collect() });
        doc.scene = Some(0);
    }

    let json = serde_json::to_string_pretty(&doc)?;
    std::fs::write(write_path, json)?;

    log::info!(
        "Wrote glTF \"{}\": {} meshes, {} materials, {} textures",
        write_path.display(),
        doc.meshes.len(),
        doc.materials.len(),
        doc.textures.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_strips_directories_and_extension() {
        assert_eq!(texture_stem(Some("textures/sponza/floor_a.tga"), 0), "floor_a");
        assert_eq!(texture_stem(Some("a\\b\\wall.png"), 0), "wall");
    }

    #[test]
    fn stem_keeps_fragment() {
        assert_eq!(texture_stem(Some("rock.png#metallic-roughness"), 0), "rock_metallic-roughness");
        assert_eq!(texture_stem(Some("level.glb#image2"), 0), "level_image2");
    }

    #[test]
    fn stem_without_key_uses_index() {
        assert_eq!(texture_stem(None, 7), "texture_7");
    }

    #[test]
    fn colliding_stems_get_suffixes() {
        let mut assets = LevelAssets::new();
        for key in ["a/wall.png", "b/wall.png", "c/wall.jpg"] {
            let index = assets.textures.len() as u32;
            assets.textures.push(crate::resources::Image::new(1, 1, 1, vec![0]));
            assets.texture_source_keys.insert(key.to_string(), index);
        }
        let uris = texture_uris(&assets, &[0, 1, 0, 2], "textures");
        let uris: Vec<&str> = uris.iter().map(|(_, u)| u.as_str()).collect();
        assert_eq!(uris, ["textures/wall.png", "textures/wall_1.png", "textures/wall_2.png"]);
    }
}
