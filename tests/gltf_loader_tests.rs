//! glTF Loader Tests
//!
//! Tests for documents assembled by hand rather than by the writer:
//! - Buffer sources (GLB binary chunk, base64 data URI)
//! - Images embedded in buffer views and their keys
//! - Shared vertex accessors across primitives with different materials
//! - The lazily created default material
//! - Structural rejection of interleaved buffer views

#![cfg(feature = "gltf")]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::Engine;
use image::{ImageFormat, Rgba, RgbaImage};
use serde_json::{Value, json};
use tessera::assets::writers::split;
use tessera::{FileAssetReader, Image, ImportSettings, LevelAssets, Material, TesseraError};

const QUAD_POSITIONS: [[f32; 3]; 4] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];

/// Accumulates buffer views and accessors over one binary buffer.
#[derive(Default)]
struct DocumentBuilder {
    bin: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
}

impl DocumentBuilder {
    fn view(&mut self, bytes: &[u8], stride: Option<usize>) -> usize {
        let offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let mut view = json!({ "buffer": 0, "byteOffset": offset, "byteLength": bytes.len() });
        if let Some(stride) = stride {
            view["byteStride"] = json!(stride);
        }
        self.views.push(view);
        self.views.len() - 1
    }

    fn accessor(&mut self, view: usize, component_type: u32, count: usize, kind: &str) -> usize {
        self.accessors.push(json!({
            "bufferView": view,
            "componentType": component_type,
            "count": count,
            "type": kind,
        }));
        self.accessors.len() - 1
    }

    /// POSITION, NORMAL and TEXCOORD_0 accessors for `positions`, normals +Z.
    fn vertex_attributes(&mut self, positions: &[[f32; 3]]) -> Value {
        let floats = |values: &[f32]| values.iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<u8>>();
        let count = positions.len();

        let flat: Vec<f32> = positions.iter().flatten().copied().collect();
        let view = self.view(&floats(&flat), None);
        let position = self.accessor(view, 5126, count, "VEC3");
        let (min, max) = positions.iter().fold(([f32::MAX; 3], [f32::MIN; 3]), |(mut lo, mut hi), p| {
            for axis in 0..3 {
                lo[axis] = lo[axis].min(p[axis]);
                hi[axis] = hi[axis].max(p[axis]);
            }
            (lo, hi)
        });
        self.accessors[position]["min"] = json!(min);
        self.accessors[position]["max"] = json!(max);

        let normals: Vec<f32> = positions.iter().flat_map(|_| [0.0, 0.0, 1.0]).collect();
        let view = self.view(&floats(&normals), None);
        let normal = self.accessor(view, 5126, count, "VEC3");

        let uvs: Vec<f32> = positions.iter().flat_map(|p| [p[0], p[1]]).collect();
        let view = self.view(&floats(&uvs), None);
        let texcoord = self.accessor(view, 5126, count, "VEC2");

        json!({ "POSITION": position, "NORMAL": normal, "TEXCOORD_0": texcoord })
    }

    fn indices(&mut self, indices: &[u32]) -> usize {
        let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        let view = self.view(&bytes, None);
        self.accessor(view, 5125, indices.len(), "SCALAR")
    }

    /// The document with `extra` merged in and `buffer` as its only buffer.
    fn document(&self, buffer: Value, extra: Value) -> Value {
        let mut doc = json!({
            "asset": { "version": "2.0" },
            "buffers": [buffer],
            "bufferViews": self.views,
            "accessors": self.accessors,
        });
        if let (Some(doc), Value::Object(extra)) = (doc.as_object_mut(), extra) {
            doc.extend(extra);
        }
        doc
    }

    fn data_uri_buffer(&self) -> Value {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bin);
        json!({ "byteLength": self.bin.len(), "uri": format!("data:application/octet-stream;base64,{encoded}") })
    }

    fn glb_buffer(&self) -> Value {
        json!({ "byteLength": self.bin.len() })
    }
}

/// Packs `doc` and `bin` into a GLB container.
fn glb(doc: &Value, bin: &[u8]) -> Vec<u8> {
    let mut json_chunk = serde_json::to_vec(doc).unwrap();
    while json_chunk.len() % 4 != 0 {
        json_chunk.push(b' ');
    }
    let total = 12 + 8 + json_chunk.len() + 8 + bin.len();

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json_chunk);
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(b"BIN\0");
    out.extend_from_slice(bin);
    out
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn load(path: &Path) -> tessera::Result<LevelAssets> {
    let mut level = LevelAssets::new();
    load_assets_from_gltf(path, &mut level)?;
    Ok(level)
}

fn load_assets_from_gltf(path: &Path, level: &mut LevelAssets) -> tessera::Result<()> {
    tessera::load_assets_from_gltf(path, level, &FileAssetReader, &ImportSettings::default())
}

fn red_png() -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// One quad drawn by a single primitive without a material.
fn single_quad(builder: &mut DocumentBuilder) -> Value {
    let attributes = builder.vertex_attributes(&QUAD_POSITIONS);
    let indices = builder.indices(&[0, 1, 2, 0, 2, 3]);
    json!({ "meshes": [{ "primitives": [{ "attributes": attributes, "indices": indices }] }] })
}

// ============================================================================
// Buffer Sources
// ============================================================================

#[test]
fn glb_binary_chunk_is_loaded() {
    let mut builder = DocumentBuilder::default();
    let extra = single_quad(&mut builder);
    let doc = builder.document(builder.glb_buffer(), extra);

    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "quad.glb", &glb(&doc, &builder.bin));

    let level = load(&path).unwrap();
    assert_eq!(level.meshes.len(), 1);
    assert_eq!(level.meshes[0].vertices.len(), 4);
    assert_eq!(level.meshes[0].indices, vec![0, 1, 2, 0, 2, 3]);
    assert_eq!(level.meshes[0].vertices[2].position.to_array(), [1.0, 1.0, 0.0]);
}

#[test]
fn data_uri_buffer_is_loaded() {
    let mut builder = DocumentBuilder::default();
    let extra = single_quad(&mut builder);
    let doc = builder.document(builder.data_uri_buffer(), extra);

    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "quad.gltf", &serde_json::to_vec(&doc).unwrap());

    let level = load(&path).unwrap();
    assert_eq!(level.meshes[0].vertices.len(), 4);
    assert_eq!(level.meshes[0].vertices[3].texcoord.to_array(), [0.0, 1.0]);
}

#[test]
fn truncated_glb_chunk_is_rejected() {
    let mut builder = DocumentBuilder::default();
    let extra = single_quad(&mut builder);
    let buffer = json!({ "byteLength": builder.bin.len() + 64 });
    let doc = builder.document(buffer, extra);

    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "short.glb", &glb(&doc, &builder.bin));
    assert!(load(&path).is_err());
}

// ============================================================================
// Embedded Images
// ============================================================================

#[test]
fn image_in_buffer_view_is_decoded_and_keyed_by_scene() {
    let mut builder = DocumentBuilder::default();
    let mut extra = single_quad(&mut builder);
    let png = red_png();
    let image_view = builder.view(&png, None);
    extra["meshes"][0]["primitives"][0]["material"] = json!(0);
    extra["materials"] = json!([{ "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } } }]);
    extra["textures"] = json!([{ "source": 0 }]);
    extra["images"] = json!([{ "bufferView": image_view, "mimeType": "image/png" }]);
    let doc = builder.document(builder.glb_buffer(), extra);

    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "textured.glb", &glb(&doc, &builder.bin));

    let level = load(&path).unwrap();
    assert_eq!(level.materials[0].albedo_tex, Some(0));
    assert_eq!(level.textures[0], Image::new(2, 2, 4, [255, 0, 0, 255].repeat(4)));
    let expected_key = format!("{}#image0", path.to_string_lossy());
    assert_eq!(level.texture_source_key(0), Some(expected_key.as_str()));
}

// ============================================================================
// Materials
// ============================================================================

#[test]
fn shared_vertices_with_different_materials_keep_their_own_material() {
    let mut builder = DocumentBuilder::default();
    let attributes = builder.vertex_attributes(&QUAD_POSITIONS);
    let first = builder.indices(&[0, 1, 2]);
    let second = builder.indices(&[0, 2, 3]);
    let extra = json!({
        "materials": [
            { "pbrMetallicRoughness": { "roughnessFactor": 0.0 } },
            { "pbrMetallicRoughness": { "roughnessFactor": 1.0 } },
        ],
        "meshes": [{ "primitives": [
            { "attributes": attributes, "indices": first, "material": 0 },
            { "attributes": attributes, "indices": second, "material": 1 },
        ] }],
    });
    let doc = builder.document(builder.data_uri_buffer(), extra);

    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "shared.gltf", &serde_json::to_vec(&doc).unwrap());

    let level = load(&path).unwrap();
    let mesh = &level.meshes[0];
    for (triangle, expected) in mesh.indices.chunks_exact(3).zip([0, 1]) {
        let materials: Vec<u32> = triangle.iter().map(|&i| mesh.material_indices[i as usize]).collect();
        assert_eq!(materials, vec![expected; 3]);
    }
    // Vertices 0 and 2 are drawn by both primitives and must be duplicated.
    assert_eq!(mesh.vertices.len(), 8);

    let components = split(mesh).unwrap();
    assert_eq!(components.len(), 2);
}

#[test]
fn shared_vertices_with_same_material_are_reused() {
    let mut builder = DocumentBuilder::default();
    let attributes = builder.vertex_attributes(&QUAD_POSITIONS);
    let first = builder.indices(&[0, 1, 2]);
    let second = builder.indices(&[0, 2, 3]);
    let extra = json!({
        "materials": [{}],
        "meshes": [{ "primitives": [
            { "attributes": attributes, "indices": first, "material": 0 },
            { "attributes": attributes, "indices": second, "material": 0 },
        ] }],
    });
    let doc = builder.document(builder.data_uri_buffer(), extra);

    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "reuse.gltf", &serde_json::to_vec(&doc).unwrap());

    let level = load(&path).unwrap();
    assert_eq!(level.meshes[0].vertices.len(), 4);
    assert_eq!(level.meshes[0].indices, vec![0, 1, 2, 0, 2, 3]);
}

#[test]
fn default_material_is_created_once() {
    let mut builder = DocumentBuilder::default();
    let attributes = builder.vertex_attributes(&QUAD_POSITIONS);
    let indices = builder.indices(&[0, 1, 2, 0, 2, 3]);
    let extra = json!({
        "meshes": [
            { "primitives": [{ "attributes": attributes, "indices": indices }] },
            { "primitives": [{ "attributes": attributes, "indices": indices }] },
        ],
    });
    let doc = builder.document(builder.data_uri_buffer(), extra);

    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "plain.gltf", &serde_json::to_vec(&doc).unwrap());

    let level = load(&path).unwrap();
    assert_eq!(level.meshes.len(), 2);
    assert_eq!(level.materials, vec![Material::default()]);
    assert!(level.meshes.iter().all(|m| m.material_indices.iter().all(|&i| i == 0)));
}

#[test]
fn default_material_follows_existing_level_materials() {
    let mut builder = DocumentBuilder::default();
    let extra = single_quad(&mut builder);
    let doc = builder.document(builder.data_uri_buffer(), extra);

    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "quad.gltf", &serde_json::to_vec(&doc).unwrap());

    let mut level = LevelAssets::new();
    level.materials.push(Material { roughness: 9, ..Default::default() });
    load_assets_from_gltf(&path, &mut level).unwrap();

    assert_eq!(level.materials.len(), 2);
    assert_eq!(level.meshes[0].material_indices, vec![1; 4]);
}

// ============================================================================
// Structural Errors
// ============================================================================

#[test]
fn interleaved_positions_are_rejected() {
    let mut builder = DocumentBuilder::default();
    // Three positions padded to a 16 byte stride.
    let strided: Vec<u8> = QUAD_POSITIONS[..3]
        .iter()
        .flat_map(|p| [p[0], p[1], p[2], 0.0])
        .flat_map(f32::to_le_bytes)
        .collect();
    let view = builder.view(&strided, Some(16));
    let position = builder.accessor(view, 5126, 3, "VEC3");
    builder.accessors[position]["min"] = json!([0.0, 0.0, 0.0]);
    builder.accessors[position]["max"] = json!([1.0, 1.0, 0.0]);
    let indices = builder.indices(&[0, 1, 2]);
    let extra = json!({
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": position }, "indices": indices }] }],
    });
    let doc = builder.document(builder.data_uri_buffer(), extra);

    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "strided.gltf", &serde_json::to_vec(&doc).unwrap());

    let err = load(&path).unwrap_err();
    assert!(matches!(err, TesseraError::UnsupportedStride { stride: 16, element_size: 12, .. }), "{err:?}");
    assert!(err.is_structural());
}
