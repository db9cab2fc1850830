//! glTF 2.0 loader
//!
//! Reads `.gltf` and `.glb` files into [`LevelAssets`]. Every glTF mesh becomes
//! one [`Mesh`]; its primitives are merged, each carrying its own material
//! index per vertex. Node transforms, skins and animations are not read.

use std::path::{Path, PathBuf};

use gltf::accessor::{DataType, Dimensions as GltfDimensions};
use gltf::mesh::{Mode, Semantic};
use rustc_hash::FxHashMap;

use crate::assets::accessor::{AccessorDesc, BufferSet, BufferViewDesc, ComponentType, Dimensions, PrimitiveDesc, Topology};
use crate::assets::geometry::{NORMAL, POSITION, PrimitiveAccess, TEXCOORD_0, extract_mesh};
use crate::assets::io::{AssetReader, base_path_of, decode_data_uri, decode_image};
use crate::assets::level::LevelAssets;
use crate::assets::scene_graph::NodeTransform;
use crate::errors::{Result, TesseraError};
use crate::resources::material::unorm8;
use crate::resources::{Image, Material, Mesh};
use crate::settings::ImportSettings;

/// Appended to an image key for its converted metallic/roughness variant.
const METALLIC_ROUGHNESS_SUFFIX: &str = "#metallic-roughness";

/// Loads the glTF scene at `path` and appends its meshes, materials and
/// textures to `level`.
///
/// External buffers and images are resolved relative to the directory of
/// `path` through `reader`.
pub fn load_assets_from_gltf(
    path: &Path,
    level: &mut LevelAssets,
    reader: &dyn AssetReader,
    settings: &ImportSettings,
) -> Result<()> {
    let bytes = reader.read_bytes(path)?;
    let gltf = gltf::Gltf::from_slice(&bytes)?;

    let base_path = base_path_of(path);
    let buffers = load_buffers(&gltf, &base_path, reader)?;

    let mut loader = GltfLoader {
        base_path,
        scene_key: path.to_string_lossy().into_owned(),
        buffers: &buffers,
        reader,
        settings,
        material_map: Vec::new(),
        default_material: None,
    };

    let mesh_start = level.meshes.len();
    let material_start = level.materials.len();
    let texture_start = level.textures.len();

    // 1. Materials (textures are pulled in on demand)
    loader.load_materials(&gltf, level)?;

    // 2. Geometry
    let buffer_set = buffer_set(&gltf, &buffers);
    for mesh in gltf.meshes() {
        let built = loader.load_mesh(&mesh, &buffer_set, level)?;
        level.meshes.push(built);
    }

    log::info!(
        "Loaded glTF \"{}\": {} meshes, {} materials, {} textures",
        path.display(),
        level.meshes.len() - mesh_start,
        level.materials.len() - material_start,
        level.textures.len() - texture_start
    );
    Ok(())
}

/// Loads every buffer of `gltf`: the GLB binary chunk, a base64 data URI or an
/// external file.
fn load_buffers(gltf: &gltf::Gltf, base_path: &Path, reader: &dyn AssetReader) -> Result<Vec<Vec<u8>>> {
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .ok_or_else(|| TesseraError::GltfError("Missing GLB binary chunk".to_string()))?,
            gltf::buffer::Source::Uri(uri) => match decode_data_uri(uri)? {
                Some(bytes) => bytes,
                None => reader.read_bytes(&base_path.join(uri))?,
            },
        };
        if data.len() < buffer.length() {
            return Err(TesseraError::GltfError(format!(
                "Buffer {} holds {} bytes, {} declared",
                buffer.index(),
                data.len(),
                buffer.length()
            )));
        }
        buffer_data.push(data);
    }
    Ok(buffer_data)
}

fn buffer_set<'b>(gltf: &gltf::Gltf, buffers: &'b [Vec<u8>]) -> BufferSet<'b> {
    let accessors = gltf
        .accessors()
        .map(|accessor| AccessorDesc {
            // Sparse-only accessors have no view and resolve to nothing.
            buffer_view: accessor.view().map(|v| v.index()),
            byte_offset: accessor.offset(),
            count: accessor.count(),
            component_type: component_type(accessor.data_type()),
            dimensions: dimensions(accessor.dimensions()),
        })
        .collect();
    let views = gltf
        .views()
        .map(|view| BufferViewDesc {
            buffer: view.buffer().index(),
            byte_offset: view.offset(),
            byte_length: view.length(),
            byte_stride: view.stride(),
        })
        .collect();
    BufferSet::new(accessors, views, buffers.iter().map(Vec::as_slice).collect())
}

struct GltfLoader<'a> {
    base_path: PathBuf,
    /// Prefix for keys of images without a file of their own.
    scene_key: String,
    buffers: &'a [Vec<u8>],
    reader: &'a dyn AssetReader,
    settings: &'a ImportSettings,

    /// glTF material index → level material index
    material_map: Vec<u32>,
    default_material: Option<u32>,
}

impl GltfLoader<'_> {
    // ========================================================================
    // Geometry
    // ========================================================================

    /// Merges all primitives of `mesh` into one [`Mesh`].
    ///
    /// A primitive with the same vertex accessors as an earlier one reuses its
    /// vertices, as long as none of the vertices it draws is already drawn
    /// with another material. Otherwise it gets its own copy.
    fn load_mesh(&mut self, mesh: &gltf::Mesh<'_>, buffers: &BufferSet<'_>, level: &mut LevelAssets) -> Result<Mesh> {
        let mut out = Mesh::new();
        let mut shared: FxHashMap<[Option<usize>; 3], u32> = FxHashMap::default();
        // Whether a vertex is drawn by a primitive loaded so far.
        let mut drawn: Vec<bool> = Vec::new();
        let transform = NodeTransform::from_model(self.settings.model_matrix);
        let transformed = self.settings.model_matrix != glam::Mat4::IDENTITY;

        for primitive in mesh.primitives() {
            let desc = primitive_desc(&primitive);
            let material_index = match desc.material {
                Some(index) => match self.material_map.get(index) {
                    Some(&mapped) => mapped,
                    None => self.default_material(level),
                },
                None => self.default_material(level),
            };

            let access = PrimitiveAccess::resolve(buffers, &desc)?;
            let part = extract_mesh(&access, material_index, self.settings)?;

            let key = [desc.attribute(POSITION), desc.attribute(NORMAL), desc.attribute(TEXCOORD_0)];
            let reusable = shared.get(&key).copied().filter(|&base| {
                part.indices.iter().all(|&index| {
                    let vertex = (base + index) as usize;
                    !drawn[vertex] || out.material_indices[vertex] == material_index
                })
            });
            let base = match reusable {
                Some(base) => base,
                None => {
                    let base = if transformed {
                        let vertices = part
                            .vertices
                            .iter()
                            .map(|v| {
                                let mut v = *v;
                                v.position = transform.point(v.position);
                                v.normal = transform.normal(v.normal);
                                v
                            })
                            .collect::<Vec<_>>();
                        out.push_vertices(&vertices, material_index)
                    } else {
                        out.push_vertices(&part.vertices, material_index)
                    };
                    drawn.resize(out.vertices.len(), false);
                    shared.entry(key).or_insert(base);
                    base
                }
            };
            for &index in &part.indices {
                let vertex = (base + index) as usize;
                drawn[vertex] = true;
                out.material_indices[vertex] = material_index;
            }
            out.indices.extend(part.indices.iter().map(|&i| i + base));
        }

        out.validate()?;
        Ok(out)
    }

    // ========================================================================
    // Materials & textures
    // ========================================================================

    fn default_material(&mut self, level: &mut LevelAssets) -> u32 {
        *self.default_material.get_or_insert_with(|| {
            level.materials.push(Material::default());
            (level.materials.len() - 1) as u32
        })
    }

    fn load_materials(&mut self, gltf: &gltf::Gltf, level: &mut LevelAssets) -> Result<()> {
        for material in gltf.materials() {
            let pbr = material.pbr_metallic_roughness();
            let mut mat = Material::default();

            mat.albedo = pbr.base_color_factor().map(unorm8);
            mat.roughness = unorm8(pbr.roughness_factor());
            mat.metallic = unorm8(pbr.metallic_factor());
            mat.emissive = material.emissive_factor().map(unorm8);

            mat.albedo_tex = pbr
                .base_color_texture()
                .and_then(|info| self.load_texture(&info.texture().source(), level));
            mat.metallic_roughness_tex = pbr
                .metallic_roughness_texture()
                .and_then(|info| self.load_metallic_roughness(&info.texture().source(), level));
            mat.normal_tex = material
                .normal_texture()
                .and_then(|info| self.load_texture(&info.texture().source(), level));
            mat.occlusion_tex = material
                .occlusion_texture()
                .and_then(|info| self.load_texture(&info.texture().source(), level));
            mat.emissive_tex = material
                .emissive_texture()
                .and_then(|info| self.load_texture(&info.texture().source(), level));

            level.materials.push(mat);
            self.material_map.push((level.materials.len() - 1) as u32);
        }
        Ok(())
    }

    /// Key of `image` in the level's texture table: its URI for external
    /// files, `<scene>#image<N>` for embedded data.
    fn texture_key(&self, image: &gltf::Image<'_>) -> String {
        match image.source() {
            gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => uri.to_string(),
            _ => format!("{}#image{}", self.scene_key, image.index()),
        }
    }

    fn read_image(&self, image: &gltf::Image<'_>) -> Result<Image> {
        match image.source() {
            gltf::image::Source::Uri { uri, .. } => match decode_data_uri(uri)? {
                Some(bytes) => decode_image(&bytes),
                None => self.reader.load_image(&self.base_path, uri),
            },
            gltf::image::Source::View { view, .. } => {
                let start = view.offset();
                let end = start + view.length();
                let bytes = self
                    .buffers
                    .get(view.buffer().index())
                    .and_then(|b| b.get(start..end))
                    .ok_or_else(|| TesseraError::ImageError(format!("image {} view out of bounds", image.index())))?;
                decode_image(bytes)
            }
        }
    }

    fn load_texture(&self, image: &gltf::Image<'_>, level: &mut LevelAssets) -> Option<u32> {
        let key = self.texture_key(image);
        level.resolve_or_insert_texture_with(&key, || self.read_image(image))
    }

    /// glTF packs roughness in G and metallic in B; the level layout is two
    /// bytes per pixel, metallic first.
    fn load_metallic_roughness(&self, image: &gltf::Image<'_>, level: &mut LevelAssets) -> Option<u32> {
        let key = format!("{}{METALLIC_ROUGHNESS_SUFFIX}", self.texture_key(image));
        level.resolve_or_insert_texture_with(&key, || {
            let source = self.read_image(image)?;
            Ok(repack_metallic_roughness(&source))
        })
    }
}

/// Converts a glTF metallic/roughness image into the two-channel layout.
///
/// Grey images carry the same value in both channels.
pub fn repack_metallic_roughness(source: &Image) -> Image {
    let (metallic, roughness): (Vec<u8>, Vec<u8>) = match source.bytes_per_pixel {
        1 => (source.data.clone(), source.data.clone()),
        bpp => source
            .data
            .chunks_exact(bpp as usize)
            .map(|px| (px[2 % px.len()], px[1 % px.len()]))
            .unzip(),
    };
    Image::pack_metallic_roughness(&metallic, &roughness, source.width, source.height)
}

fn primitive_desc(primitive: &gltf::Primitive<'_>) -> PrimitiveDesc {
    let attributes = primitive
        .attributes()
        .filter_map(|(semantic, accessor)| {
            let name = match semantic {
                Semantic::Positions => POSITION,
                Semantic::Normals => NORMAL,
                Semantic::TexCoords(0) => TEXCOORD_0,
                _ => return None,
            };
            Some((name.to_string(), accessor.index()))
        })
        .collect();

    PrimitiveDesc {
        mode: topology(primitive.mode()),
        attributes,
        indices: primitive.indices().map(|a| a.index()),
        material: primitive.material().index(),
    }
}

fn topology(mode: Mode) -> Topology {
    match mode {
        Mode::Points => Topology::Points,
        Mode::Lines => Topology::Lines,
        Mode::LineLoop => Topology::LineLoop,
        Mode::LineStrip => Topology::LineStrip,
        Mode::Triangles => Topology::Triangles,
        Mode::TriangleStrip => Topology::TriangleStrip,
        Mode::TriangleFan => Topology::TriangleFan,
    }
}

fn component_type(data_type: DataType) -> ComponentType {
    match data_type {
        DataType::I8 => ComponentType::I8,
        DataType::U8 => ComponentType::U8,
        DataType::I16 => ComponentType::I16,
        DataType::U16 => ComponentType::U16,
        DataType::U32 => ComponentType::U32,
        DataType::F32 => ComponentType::F32,
    }
}

fn dimensions(dims: GltfDimensions) -> Dimensions {
    match dims {
        GltfDimensions::Scalar => Dimensions::Scalar,
        GltfDimensions::Vec2 => Dimensions::Vec2,
        GltfDimensions::Vec3 => Dimensions::Vec3,
        GltfDimensions::Vec4 => Dimensions::Vec4,
        GltfDimensions::Mat2 => Dimensions::Mat2,
        GltfDimensions::Mat3 => Dimensions::Mat3,
        GltfDimensions::Mat4 => Dimensions::Mat4,
    }
}
