//! OBJ / MTL Import Tests
//!
//! Tests for:
//! - One mesh per OBJ object, in file order
//! - MTL slot interpretation (albedo, roughness, metallic, normal, emissive)
//! - Colour fallbacks when no map is given
//! - UV flipping and the top-level model matrix
//! - Generated normals, missing material libraries and missing textures

#![cfg(feature = "obj")]

use std::path::{Path, PathBuf};

use glam::{Mat4, Vec2, Vec3};
use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use tessera::assets::loaders::obj::read_obj_scene;
use tessera::{FileAssetReader, ImportSettings, load_static_scene};

const EPSILON: f32 = 1e-5;

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

const SCENE_OBJ: &str = "\
mtllib scene.mtl
o Floor
v 0 0 0
v 1 0 0
v 1 0 1
v 0 0 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 1 0
usemtl stone
f 1/1/1 4/4/1 3/3/1 2/2/1
o Crate
v 0 1 0
v 1 1 0
v 0 2 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
usemtl plain
f 5/5/2 6/6/2 7/7/2
";

const SCENE_MTL: &str = "\
newmtl stone
Kd 0.5 0.5 0.5
map_Kd textures/stone_albedo.png
map_Ns textures/stone_rough.png
map_Ka textures/stone_metal.png
map_Bump textures/stone_normal.png

newmtl plain
Kd 1 0 0
Ks 0.25 0.25 0.25
Ka 0 0 0
Ke 0 1 0
";

/// Writes the OBJ, MTL and texture files of a small two-object scene.
fn write_scene(dir: &Path) -> PathBuf {
    std::fs::create_dir_all(dir.join("textures")).unwrap();
    std::fs::write(dir.join("scene.obj"), SCENE_OBJ).unwrap();
    std::fs::write(dir.join("scene.mtl"), SCENE_MTL).unwrap();

    RgbaImage::from_pixel(4, 4, Rgba([120, 110, 100, 255]))
        .save(dir.join("textures/stone_albedo.png"))
        .unwrap();
    GrayImage::from_pixel(4, 4, Luma([180])).save(dir.join("textures/stone_rough.png")).unwrap();
    GrayImage::from_pixel(4, 4, Luma([20])).save(dir.join("textures/stone_metal.png")).unwrap();
    RgbImage::from_pixel(4, 4, Rgb([128, 128, 255])).save(dir.join("textures/stone_normal.png")).unwrap();

    dir.join("scene.obj")
}

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn objects_become_meshes_in_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(dir.path());

    let level = load_static_scene(&path, &FileAssetReader, &ImportSettings::obj()).unwrap();
    assert_eq!(level.meshes.len(), 2);

    let floor = &level.meshes[0];
    assert_eq!(floor.vertices.len(), 4);
    assert_eq!(floor.indices.len(), 6);
    assert!(floor.vertices.iter().all(|v| vec3_approx(v.normal, Vec3::Y)));

    let crate_mesh = &level.meshes[1];
    assert_eq!(crate_mesh.indices.len(), 3);
    assert!(vec3_approx(crate_mesh.vertices[2].position, Vec3::new(0.0, 2.0, 0.0)));
    assert!(vec3_approx(crate_mesh.vertices[0].normal, Vec3::Z));
}

#[test]
fn scene_graph_has_one_child_per_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(dir.path());

    let graph = read_obj_scene(&path, &FileAssetReader).unwrap();
    let names: Vec<&str> = graph.root.children.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, ["Floor", "Crate"]);
    assert_eq!(graph.root.children[1].meshes, vec![1]);
    assert_eq!(graph.materials.len(), 2);
}

#[test]
fn texcoords_are_flipped_for_obj() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(dir.path());

    let flipped = load_static_scene(&path, &FileAssetReader, &ImportSettings::obj()).unwrap();
    let raw = load_static_scene(&path, &FileAssetReader, &ImportSettings::default()).unwrap();

    for (a, b) in flipped.meshes[1].vertices.iter().zip(&raw.meshes[1].vertices) {
        assert_eq!(a.texcoord, Vec2::new(b.texcoord.x, 1.0 - b.texcoord.y));
    }
    let uvs: Vec<Vec2> = flipped.meshes[1].vertices.iter().map(|v| v.texcoord).collect();
    assert!(uvs.contains(&Vec2::new(0.0, 1.0)));
    assert!(uvs.contains(&Vec2::new(0.0, 0.0)));
}

#[test]
fn model_matrix_scales_the_scene() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(dir.path());

    let settings = ImportSettings::obj().with_model_matrix(Mat4::from_scale(Vec3::splat(2.0)));
    let level = load_static_scene(&path, &FileAssetReader, &settings).unwrap();
    assert!(vec3_approx(level.meshes[1].vertices[2].position, Vec3::new(0.0, 4.0, 0.0)));
    assert!(vec3_approx(level.meshes[1].vertices[2].normal, Vec3::Z));
}

#[test]
fn missing_normals_are_generated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bare.obj");
    std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 0 -1\nf 1 2 3\n").unwrap();

    let level = load_static_scene(&path, &FileAssetReader, &ImportSettings::obj()).unwrap();
    assert_eq!(level.meshes.len(), 1);
    assert!(level.meshes[0].vertices.iter().all(|v| vec3_approx(v.normal, Vec3::Y)));
}

// ============================================================================
// Materials
// ============================================================================

#[test]
fn pbr_maps_fill_material_slots() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(dir.path());

    let level = load_static_scene(&path, &FileAssetReader, &ImportSettings::obj()).unwrap();
    let stone = level.materials[level.meshes[0].material_indices[0] as usize];

    assert_eq!(stone.albedo_tex, Some(0));
    assert_eq!(stone.metallic_roughness_tex, Some(1));
    assert_eq!(stone.normal_tex, Some(2));
    assert_eq!(level.textures.len(), 3);

    let packed = &level.textures[1];
    assert_eq!(packed.bytes_per_pixel, 2);
    assert_eq!(&packed.data[..2], &[20, 180]);
    assert_eq!(
        level.texture_source_key(1),
        Some("textures/stone_rough.pngtextures/stone_metal.png")
    );
}

#[test]
fn colours_are_used_without_maps() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(dir.path());

    let level = load_static_scene(&path, &FileAssetReader, &ImportSettings::obj()).unwrap();
    let plain = level.materials[level.meshes[1].material_indices[0] as usize];

    assert_eq!(plain.albedo, [255, 0, 0, 255]);
    assert_eq!(plain.roughness, 64);
    assert_eq!(plain.metallic, 0);
    assert_eq!(plain.emissive, [0, 255, 0]);
    assert_eq!(plain.albedo_tex, None);
    assert_eq!(plain.metallic_roughness_tex, None);
}

#[test]
fn missing_material_library_uses_default_material() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lonely.obj");
    std::fs::write(&path, "mtllib nowhere.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n").unwrap();

    let level = load_static_scene(&path, &FileAssetReader, &ImportSettings::obj()).unwrap();
    assert_eq!(level.meshes.len(), 1);
    assert_eq!(level.materials, vec![tessera::Material::default()]);
}

#[test]
fn missing_texture_leaves_slot_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(dir.path());
    std::fs::remove_file(dir.path().join("textures/stone_normal.png")).unwrap();

    let level = load_static_scene(&path, &FileAssetReader, &ImportSettings::obj()).unwrap();
    let stone = level.materials[level.meshes[0].material_indices[0] as usize];
    assert_eq!(stone.normal_tex, None);
    assert!(stone.albedo_tex.is_some());
    assert_eq!(level.textures.len(), 2);
}
