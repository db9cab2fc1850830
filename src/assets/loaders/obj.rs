//! Wavefront OBJ/MTL importer
//!
//! Parses an OBJ file with `tobj`, builds a [`SceneGraph`] (a root node with
//! one child per OBJ object) and flattens it with the scene graph walker.
//!
//! MTL files authored for the Sponza-style PBR workflow put PBR maps in
//! legacy slots: `map_Kd` holds albedo, `map_Ns` roughness and `map_Ka`
//! metallic. The walker interprets them accordingly.

use std::io::Cursor;
use std::path::Path;

use glam::{Vec2, Vec3};

use crate::assets::io::{AssetReader, base_path_of};
use crate::assets::level::LevelAssets;
use crate::assets::scene_graph::{ColorKey, ImportedMaterial, ImportedMesh, SceneGraph, SceneNode, TextureSemantic, load_scene_graph};
use crate::errors::{Result, TesseraError};
use crate::settings::ImportSettings;

/// Loads the OBJ scene at `path` into a new [`LevelAssets`].
///
/// Use [`ImportSettings::obj`] for the usual texture orientation.
pub fn load_static_scene(path: &Path, reader: &dyn AssetReader, settings: &ImportSettings) -> Result<LevelAssets> {
    let graph = read_obj_scene(path, reader)?;
    let level = load_scene_graph(&graph, &base_path_of(path), reader, settings)?;
    log::info!(
        "Loaded OBJ \"{}\": {} meshes, {} materials, {} textures",
        path.display(),
        level.meshes.len(),
        level.materials.len(),
        level.textures.len()
    );
    Ok(level)
}

/// Parses `path` and its material libraries into a [`SceneGraph`].
pub fn read_obj_scene(path: &Path, reader: &dyn AssetReader) -> Result<SceneGraph> {
    let bytes = reader.read_bytes(path)?;
    let base_path = base_path_of(path);

    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, materials) = tobj::load_obj_buf(&mut Cursor::new(bytes), &options, |mtl_path| {
        let mtl = reader
            .read_bytes(&base_path.join(mtl_path))
            .map_err(|_| tobj::LoadError::OpenFileFailed)?;
        tobj::load_mtl_buf(&mut Cursor::new(mtl))
    })?;

    let materials = materials.unwrap_or_else(|err| {
        log::warn!("No usable material library for \"{}\" ({err}), using default materials", path.display());
        Vec::new()
    });

    let mut graph = SceneGraph {
        root: SceneNode::new(path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()),
        meshes: Vec::with_capacity(models.len()),
        materials: materials.iter().map(convert_material).collect(),
    };

    for model in models {
        let mesh_index = graph.meshes.len();
        graph.meshes.push(convert_mesh(&model.name, model.mesh)?);
        graph.root.children.push(SceneNode::new(model.name).with_mesh(mesh_index));
    }
    Ok(graph)
}

fn convert_mesh(name: &str, mesh: tobj::Mesh) -> Result<ImportedMesh> {
    if mesh.indices.len() % 3 != 0 {
        return Err(TesseraError::MalformedTriangleList(mesh.indices.len()));
    }

    let positions: Vec<Vec3> = mesh.positions.chunks_exact(3).map(Vec3::from_slice).collect();
    let normals = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals.chunks_exact(3).map(Vec3::from_slice).collect()
    } else {
        log::debug!("OBJ object \"{name}\" has no normals, generating smooth normals");
        smooth_normals(&positions, &mesh.indices)
    };
    let texcoords = (!mesh.texcoords.is_empty() && mesh.texcoords.len() / 2 == positions.len())
        .then(|| mesh.texcoords.chunks_exact(2).map(Vec2::from_slice).collect());

    Ok(ImportedMesh {
        name: name.to_string(),
        positions,
        normals,
        texcoords,
        indices: mesh.indices,
        material_index: mesh.material_id,
    })
}

fn convert_material(mtl: &tobj::Material) -> ImportedMaterial {
    let mut material = ImportedMaterial::new(mtl.name.clone());

    let maps = [
        (TextureSemantic::Diffuse, mtl.diffuse_texture.as_deref()),
        (TextureSemantic::Shininess, mtl.shininess_texture.as_deref()),
        (TextureSemantic::Ambient, mtl.ambient_texture.as_deref()),
        (TextureSemantic::Normals, mtl.normal_texture.as_deref()),
        (TextureSemantic::Emissive, mtl.unknown_param.get("map_Ke").map(String::as_str)),
    ];
    for (semantic, path) in maps {
        if let Some(path) = path.map(str::trim).filter(|p| !p.is_empty()) {
            material.textures.insert(semantic, path.replace('\\', "/"));
        }
    }

    let colors = [
        (ColorKey::Diffuse, mtl.diffuse),
        (ColorKey::Specular, mtl.specular),
        (ColorKey::Ambient, mtl.ambient),
        (ColorKey::Emissive, mtl.unknown_param.get("Ke").and_then(|v| parse_color(v))),
    ];
    for (key, color) in colors {
        if let Some(color) = color {
            material.colors.insert(key, Vec3::from_array(color));
        }
    }
    material
}

fn parse_color(value: &str) -> Option<[f32; 3]> {
    let mut parts = value.split_whitespace().map(str::parse::<f32>);
    let r = parts.next()?.ok()?;
    let g = parts.next().and_then(|p| p.ok()).unwrap_or(r);
    let b = parts.next().and_then(|p| p.ok()).unwrap_or(r);
    Some([r, g, b])
}

/// Area-weighted vertex normals.
fn smooth_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (Some(&pa), Some(&pb), Some(&pc)) = (positions.get(a), positions.get(b), positions.get(c)) else {
            continue;
        };
        let face = (pb - pa).cross(pc - pa);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals.iter().map(|n| n.normalize_or(Vec3::Y)).collect()
}
